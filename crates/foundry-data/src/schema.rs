//! Serde data file structs for game content definitions.
//!
//! These structs define the on-disk format for the catalog: settings,
//! categories, items, machines, and warehouse tuning. They are deserialized
//! from RON, JSON, or TOML data files and then resolved into engine types
//! by the loader. Numbers are plain `f64`/integers here; conversion to
//! fixed-point happens once, at resolution time.

use serde::Deserialize;

/// A full catalog data file.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogData {
    #[serde(default)]
    pub settings: SettingsData,
    pub item_categories: Vec<CategoryData>,
    pub items: Vec<ItemData>,
    pub machines: Vec<MachineData>,
    #[serde(default)]
    pub warehouses: WarehouseData,
}

// ===========================================================================
// Settings
// ===========================================================================

/// Engine-wide constants. Every field has the shipped default, so data
/// files only state what they change.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub starting_balance: u64,
    pub starting_storage: u32,
    pub production_tick_seconds: f64,
    pub price_update_seconds: f64,
    pub machine_refund_rate: f64,
    pub supply_high_threshold: u32,
    pub supply_low_threshold: u32,
    pub supply_bias: f64,
    pub price_floor_ratio: f64,
    pub price_cap_ratio: f64,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            starting_balance: 1000,
            starting_storage: 100,
            production_tick_seconds: 1.0,
            price_update_seconds: 5.0,
            machine_refund_rate: 0.5,
            supply_high_threshold: 20,
            supply_low_threshold: 5,
            supply_bias: 0.02,
            price_floor_ratio: 0.5,
            price_cap_ratio: 2.0,
        }
    }
}

// ===========================================================================
// Categories & items
// ===========================================================================

/// An item category definition.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryData {
    pub name: String,
    pub display_name: String,
}

/// An item type definition. Items with a `market` block are sellable.
#[derive(Debug, Clone, Deserialize)]
pub struct ItemData {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default = "default_stack_size")]
    pub stack_size: u32,
    #[serde(default)]
    pub market: Option<MarketData>,
}

fn default_stack_size() -> u32 {
    100
}

/// Market parameters for a sellable item.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketData {
    pub base_price: f64,
    pub volatility: f64,
}

// ===========================================================================
// Machines
// ===========================================================================

/// A machine (recipe) definition.
#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub name: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    pub category: MachineCategoryData,
    #[serde(default = "default_tier")]
    pub tier: u8,
    #[serde(default)]
    pub inputs: Vec<RecipeEntryData>,
    pub outputs: Vec<RecipeEntryData>,
    pub craft_time: f64,
    pub base_cost: u64,
    /// Multiplicative cost growth per unit owned. 1.0 means flat cost.
    #[serde(default = "default_cost_scaling")]
    pub cost_scaling: f64,
}

fn default_tier() -> u8 {
    1
}

fn default_cost_scaling() -> f64 {
    1.0
}

/// Machine category in a data file.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MachineCategoryData {
    Generator,
    Processor,
    Assembler,
}

/// A recipe input/output entry, supporting both short tuple form and full
/// form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RecipeEntryData {
    /// Short form: `("item_name", amount)`.
    Short(String, u32),
    /// Full form with explicit fields.
    Full { item: String, amount: u32 },
}

impl RecipeEntryData {
    pub fn item_name(&self) -> &str {
        match self {
            RecipeEntryData::Short(name, _) => name,
            RecipeEntryData::Full { item, .. } => item,
        }
    }

    pub fn amount(&self) -> u32 {
        match self {
            RecipeEntryData::Short(_, amount) => *amount,
            RecipeEntryData::Full { amount, .. } => *amount,
        }
    }
}

// ===========================================================================
// Warehouses
// ===========================================================================

/// Warehouse purchase and upgrade constants, with the shipped defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseData {
    pub base_slots: u32,
    pub base_cost: u64,
    pub cost_scaling: f64,
    pub max_warehouses: usize,
    pub slot_upgrade_cost: u64,
    pub slot_upgrade_amount: u32,
    pub storage_upgrade_cost: u64,
    pub storage_upgrade_amount: u32,
}

impl Default for WarehouseData {
    fn default() -> Self {
        Self {
            base_slots: 10,
            base_cost: 500,
            cost_scaling: 2.0,
            max_warehouses: 10,
            slot_upgrade_cost: 250,
            slot_upgrade_amount: 5,
            storage_upgrade_cost: 200,
            storage_upgrade_amount: 50,
        }
    }
}
