//! The immutable content catalog: items, recipes, categories, and tuning.
//!
//! Built once through [`CatalogBuilder`], validated, then frozen. All
//! runtime state references catalog entries by id; definitions are never
//! copied into the simulation state.

use crate::fixed::{Fixed64, Money, scale_cost};
use crate::id::{CategoryId, ItemId, RecipeId};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Item definitions
// ---------------------------------------------------------------------------

/// Market parameters for a sellable item. Items without one never get a
/// price record and cannot be sold.
#[derive(Debug, Clone)]
pub struct MarketDef {
    /// Price the random walk reverts around. The live price is bounded to
    /// a band around this value.
    pub base_price: Fixed64,
    /// Maximum relative change per price update, e.g. 0.1 = up to ±10%.
    pub volatility: Fixed64,
}

/// An item type definition.
#[derive(Debug, Clone)]
pub struct ItemDef {
    /// Stable string key, used by data files and name lookups.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: CategoryId,
    pub stack_size: u32,
    pub market: Option<MarketDef>,
}

impl ItemDef {
    pub fn sellable(&self) -> bool {
        self.market.is_some()
    }
}

/// An item category (display grouping).
#[derive(Debug, Clone)]
pub struct CategoryDef {
    pub name: String,
    pub display_name: String,
}

// ---------------------------------------------------------------------------
// Recipe definitions
// ---------------------------------------------------------------------------

/// What stage of the production chain a machine belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MachineCategory {
    /// Produces raw materials from nothing.
    Generator,
    /// Converts raw materials into intermediates.
    Processor,
    /// Combines intermediates into finished goods.
    Assembler,
}

/// A recipe input/output entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeEntry {
    pub item: ItemId,
    pub amount: u32,
}

/// How a machine's purchase cost grows with the number already owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostCurve {
    /// Every unit costs the base price.
    Flat,
    /// `floor(base · factor^owned)`. Strictly increasing for factor > 1.
    Geometric { factor: Fixed64 },
}

impl CostCurve {
    /// Cost of the next unit given how many are already owned.
    pub fn cost(&self, base: Money, owned: u32) -> Money {
        match self {
            CostCurve::Flat => base,
            CostCurve::Geometric { factor } => scale_cost(base, *factor, owned),
        }
    }
}

/// A machine definition: inputs, outputs, cycle time, and purchase pricing.
#[derive(Debug, Clone)]
pub struct RecipeDef {
    /// Stable string key, used by data files and name lookups.
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub category: MachineCategory,
    pub tier: u8,
    /// Empty for generators.
    pub inputs: Vec<RecipeEntry>,
    pub outputs: Vec<RecipeEntry>,
    /// Seconds for one full production cycle. Must be positive.
    pub craft_time: Fixed64,
    pub base_cost: Money,
    pub cost_curve: CostCurve,
}

impl RecipeDef {
    /// Total items emitted by one completed cycle.
    pub fn output_total(&self) -> u32 {
        self.outputs.iter().map(|o| o.amount).sum()
    }
}

// ---------------------------------------------------------------------------
// Tuning & settings
// ---------------------------------------------------------------------------

/// Warehouse purchase and upgrade constants.
#[derive(Debug, Clone)]
pub struct WarehouseTuning {
    /// Machine slots a new warehouse starts with.
    pub base_slots: u32,
    pub base_cost: Money,
    pub cost_curve: CostCurve,
    pub max_warehouses: usize,
    /// Slot upgrade cost is this times the warehouse's upgrade level.
    pub slot_upgrade_cost: Money,
    pub slot_upgrade_amount: u32,
    pub storage_upgrade_cost: Money,
    pub storage_upgrade_amount: u32,
}

impl Default for WarehouseTuning {
    fn default() -> Self {
        Self {
            base_slots: 10,
            base_cost: 500,
            cost_curve: CostCurve::Geometric {
                factor: Fixed64::from_num(2),
            },
            max_warehouses: 10,
            slot_upgrade_cost: 250,
            slot_upgrade_amount: 5,
            storage_upgrade_cost: 200,
            storage_upgrade_amount: 50,
        }
    }
}

/// Engine-wide constants: starting resources, tick periods, market tuning.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub starting_balance: Money,
    pub starting_storage: u32,
    /// Period of the production tick, in seconds.
    pub production_tick_seconds: Fixed64,
    /// Period of the price update, in seconds. Slower than production.
    pub price_update_seconds: Fixed64,
    /// Fraction of the current purchase cost refunded when selling a machine.
    pub machine_refund_rate: Fixed64,
    /// On-hand quantity above which a negative supply bias applies.
    pub supply_high_threshold: u32,
    /// On-hand quantity below which a positive supply bias applies.
    pub supply_low_threshold: u32,
    /// Magnitude of the supply bias.
    pub supply_bias: Fixed64,
    /// Live price lower bound, as a fraction of base price.
    pub price_floor_ratio: Fixed64,
    /// Live price upper bound, as a fraction of base price.
    pub price_cap_ratio: Fixed64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            starting_storage: 100,
            production_tick_seconds: Fixed64::from_num(1),
            price_update_seconds: Fixed64::from_num(5),
            machine_refund_rate: Fixed64::from_num(0.5),
            supply_high_threshold: 20,
            supply_low_threshold: 5,
            supply_bias: Fixed64::from_num(0.02),
            price_floor_ratio: Fixed64::from_num(0.5),
            price_cap_ratio: Fixed64::from_num(2),
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for constructing an immutable [`Catalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    categories: Vec<CategoryDef>,
    category_name_to_id: HashMap<String, CategoryId>,
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    tuning: WarehouseTuning,
    settings: EngineSettings,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item category. Returns its ID.
    pub fn register_category(&mut self, name: &str, display_name: &str) -> CategoryId {
        let id = CategoryId(self.categories.len() as u16);
        self.categories.push(CategoryDef {
            name: name.to_string(),
            display_name: display_name.to_string(),
        });
        self.category_name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register an item type. Returns its ID.
    pub fn register_item(&mut self, item: ItemDef) -> ItemId {
        let id = ItemId(self.items.len() as u32);
        self.item_name_to_id.insert(item.name.clone(), id);
        self.items.push(item);
        id
    }

    /// Register a recipe (machine definition). Returns its ID.
    pub fn register_recipe(&mut self, recipe: RecipeDef) -> RecipeId {
        let id = RecipeId(self.recipes.len() as u32);
        self.recipe_name_to_id.insert(recipe.name.clone(), id);
        self.recipes.push(recipe);
        id
    }

    pub fn set_tuning(&mut self, tuning: WarehouseTuning) {
        self.tuning = tuning;
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
    }

    /// Lookup item ID by name.
    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    /// Lookup category ID by name.
    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.category_name_to_id.get(name).copied()
    }

    /// Finalize and build the immutable catalog.
    ///
    /// Validates every cross-reference. Recipe cycles are deliberately
    /// permitted: two recipes converting items back and forth is legal
    /// content.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if self.item_name_to_id.len() != self.items.len() {
            return Err(first_duplicate(self.items.iter().map(|i| i.name.as_str())));
        }
        if self.recipe_name_to_id.len() != self.recipes.len() {
            return Err(first_duplicate(self.recipes.iter().map(|r| r.name.as_str())));
        }
        if self.category_name_to_id.len() != self.categories.len() {
            return Err(first_duplicate(
                self.categories.iter().map(|c| c.name.as_str()),
            ));
        }

        if self.settings.production_tick_seconds <= Fixed64::ZERO {
            return Err(CatalogError::NonPositivePeriod {
                which: "production tick",
            });
        }
        if self.settings.price_update_seconds <= Fixed64::ZERO {
            return Err(CatalogError::NonPositivePeriod {
                which: "price update",
            });
        }
        if self.settings.price_floor_ratio > self.settings.price_cap_ratio {
            return Err(CatalogError::InvertedPriceBand);
        }

        for item in &self.items {
            if item.category.0 as usize >= self.categories.len() {
                return Err(CatalogError::UnknownCategory {
                    item: item.name.clone(),
                });
            }
            if let Some(market) = &item.market {
                if market.base_price <= Fixed64::ZERO {
                    return Err(CatalogError::NonPositiveBasePrice {
                        item: item.name.clone(),
                    });
                }
                if market.volatility < Fixed64::ZERO || market.volatility >= Fixed64::from_num(1) {
                    return Err(CatalogError::InvalidVolatility {
                        item: item.name.clone(),
                    });
                }
            }
        }

        for recipe in &self.recipes {
            if recipe.craft_time <= Fixed64::ZERO {
                return Err(CatalogError::NonPositiveCraftTime {
                    recipe: recipe.name.clone(),
                });
            }
            for entry in recipe.inputs.iter().chain(recipe.outputs.iter()) {
                if entry.item.0 as usize >= self.items.len() {
                    return Err(CatalogError::InvalidItemRef {
                        recipe: recipe.name.clone(),
                        item: entry.item,
                    });
                }
            }
        }

        Ok(Catalog {
            categories: self.categories,
            category_name_to_id: self.category_name_to_id,
            items: self.items,
            item_name_to_id: self.item_name_to_id,
            recipes: self.recipes,
            recipe_name_to_id: self.recipe_name_to_id,
            tuning: self.tuning,
            settings: self.settings,
        })
    }
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> CatalogError {
    let mut seen = std::collections::HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return CatalogError::DuplicateName(name.to_string());
        }
    }
    // The builder maps disagreed with the tables, so a duplicate must exist.
    CatalogError::DuplicateName(String::new())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Immutable catalog. Frozen after build.
#[derive(Debug)]
pub struct Catalog {
    categories: Vec<CategoryDef>,
    category_name_to_id: HashMap<String, CategoryId>,
    items: Vec<ItemDef>,
    item_name_to_id: HashMap<String, ItemId>,
    recipes: Vec<RecipeDef>,
    recipe_name_to_id: HashMap<String, RecipeId>,
    tuning: WarehouseTuning,
    settings: EngineSettings,
}

impl Catalog {
    pub fn item(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(id.0 as usize)
    }

    pub fn recipe(&self, id: RecipeId) -> Option<&RecipeDef> {
        self.recipes.get(id.0 as usize)
    }

    pub fn category(&self, id: CategoryId) -> Option<&CategoryDef> {
        self.categories.get(id.0 as usize)
    }

    pub fn item_id(&self, name: &str) -> Option<ItemId> {
        self.item_name_to_id.get(name).copied()
    }

    pub fn recipe_id(&self, name: &str) -> Option<RecipeId> {
        self.recipe_name_to_id.get(name).copied()
    }

    pub fn category_id(&self, name: &str) -> Option<CategoryId> {
        self.category_name_to_id.get(name).copied()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn recipe_count(&self) -> usize {
        self.recipes.len()
    }

    pub fn items(&self) -> impl Iterator<Item = (ItemId, &ItemDef)> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, def)| (ItemId(i as u32), def))
    }

    pub fn recipes(&self) -> impl Iterator<Item = (RecipeId, &RecipeDef)> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(i, def)| (RecipeId(i as u32), def))
    }

    /// Items that participate in the market, in id order.
    pub fn sellable_items(&self) -> impl Iterator<Item = (ItemId, &ItemDef)> {
        self.items().filter(|(_, def)| def.sellable())
    }

    pub fn tuning(&self) -> &WarehouseTuning {
        &self.tuning
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate name: {0}")]
    DuplicateName(String),
    #[error("item '{item}' references unknown category")]
    UnknownCategory { item: String },
    #[error("recipe '{recipe}' references unknown item {item:?}")]
    InvalidItemRef { recipe: String, item: ItemId },
    #[error("recipe '{recipe}' has a non-positive craft time")]
    NonPositiveCraftTime { recipe: String },
    #[error("sellable item '{item}' has a non-positive base price")]
    NonPositiveBasePrice { item: String },
    #[error("item '{item}' has volatility outside [0, 1)")]
    InvalidVolatility { item: String },
    #[error("settings give the {which} a non-positive period")]
    NonPositivePeriod { which: &'static str },
    #[error("settings put the price floor above the price cap")]
    InvertedPriceBand,
}
