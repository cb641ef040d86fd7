//! Canned catalogs and helpers shared by unit and integration tests.
//!
//! Enabled with the `test-utils` feature (and always within this crate's
//! own tests). Lookups unwrap: a missing name in a canned catalog is a bug
//! in the fixture, not a runtime condition.

use crate::catalog::{
    Catalog, CatalogBuilder, CostCurve, ItemDef, MachineCategory, MarketDef, RecipeDef,
    RecipeEntry,
};
use crate::engine::SimulationEngine;
use crate::fixed::Fixed64;
use crate::id::{ItemId, RecipeId};

fn item(name: &str, display: &str, category: crate::id::CategoryId) -> ItemDef {
    ItemDef {
        name: name.to_string(),
        display_name: display.to_string(),
        description: String::new(),
        category,
        stack_size: 100,
        market: None,
    }
}

fn sellable(
    name: &str,
    display: &str,
    category: crate::id::CategoryId,
    base_price: f64,
    volatility: f64,
) -> ItemDef {
    ItemDef {
        market: Some(MarketDef {
            base_price: Fixed64::from_num(base_price),
            volatility: Fixed64::from_num(volatility),
        }),
        ..item(name, display, category)
    }
}

fn entries(pairs: &[(ItemId, u32)]) -> Vec<RecipeEntry> {
    pairs
        .iter()
        .map(|&(item, amount)| RecipeEntry { item, amount })
        .collect()
}

/// A small steel-and-copper chain: two generators, two processors, default
/// tuning and settings (1000 balance, 100 storage).
pub fn test_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let raw = b.register_category("raw", "Raw Materials");
    let processed = b.register_category("processed", "Processed");

    let raw_steel = b.register_item(item("raw_steel", "Raw Steel", raw));
    let raw_copper = b.register_item(item("raw_copper", "Raw Copper", raw));
    let steel_plates = b.register_item(sellable(
        "steel_plates",
        "Steel Plates",
        processed,
        15.0,
        0.1,
    ));
    let copper_wire = b.register_item(sellable(
        "copper_wire",
        "Copper Wire",
        processed,
        12.0,
        0.08,
    ));

    let scaling = CostCurve::Geometric {
        factor: Fixed64::from_num(1.15),
    };
    b.register_recipe(RecipeDef {
        name: "steel_generator".to_string(),
        display_name: "Steel Generator".to_string(),
        description: "Extracts raw steel".to_string(),
        category: MachineCategory::Generator,
        tier: 1,
        inputs: vec![],
        outputs: entries(&[(raw_steel, 1)]),
        craft_time: Fixed64::from_num(1),
        base_cost: 100,
        cost_curve: scaling,
    });
    b.register_recipe(RecipeDef {
        name: "copper_generator".to_string(),
        display_name: "Copper Extractor".to_string(),
        description: "Extracts raw copper".to_string(),
        category: MachineCategory::Generator,
        tier: 1,
        inputs: vec![],
        outputs: entries(&[(raw_copper, 1)]),
        craft_time: Fixed64::from_num(1.2),
        base_cost: 120,
        cost_curve: scaling,
    });
    b.register_recipe(RecipeDef {
        name: "plate_press".to_string(),
        display_name: "Plate Press".to_string(),
        description: "Presses steel into plates".to_string(),
        category: MachineCategory::Processor,
        tier: 1,
        inputs: entries(&[(raw_steel, 2)]),
        outputs: entries(&[(steel_plates, 1)]),
        craft_time: Fixed64::from_num(2),
        base_cost: 150,
        cost_curve: scaling,
    });
    b.register_recipe(RecipeDef {
        name: "wire_drawer".to_string(),
        display_name: "Wire Drawer".to_string(),
        description: "Draws copper into wire".to_string(),
        category: MachineCategory::Processor,
        tier: 1,
        inputs: entries(&[(raw_copper, 1)]),
        outputs: entries(&[(copper_wire, 2)]),
        craft_time: Fixed64::from_num(1.5),
        base_cost: 130,
        cost_curve: scaling,
    });

    b.build().expect("test catalog is valid")
}

/// A one-item, one-recipe catalog, for mismatch tests.
pub fn tiny_catalog() -> Catalog {
    let mut b = CatalogBuilder::new();
    let raw = b.register_category("raw", "Raw");
    let ore = b.register_item(item("ore", "Ore", raw));
    b.register_recipe(RecipeDef {
        name: "ore_generator".to_string(),
        display_name: "Ore Generator".to_string(),
        description: String::new(),
        category: MachineCategory::Generator,
        tier: 1,
        inputs: vec![],
        outputs: entries(&[(ore, 1)]),
        craft_time: Fixed64::from_num(1),
        base_cost: 50,
        cost_curve: CostCurve::Flat,
    });
    b.build().expect("tiny catalog is valid")
}

/// A fresh engine over [`test_catalog`].
pub fn test_engine(seed: u64) -> SimulationEngine {
    SimulationEngine::new(test_catalog(), seed)
}

pub fn raw_steel(catalog: &Catalog) -> ItemId {
    catalog.item_id("raw_steel").unwrap()
}

pub fn raw_copper(catalog: &Catalog) -> ItemId {
    catalog.item_id("raw_copper").unwrap()
}

pub fn steel_plates(catalog: &Catalog) -> ItemId {
    catalog.item_id("steel_plates").unwrap()
}

pub fn copper_wire(catalog: &Catalog) -> ItemId {
    catalog.item_id("copper_wire").unwrap()
}

pub fn steel_generator(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("steel_generator").unwrap()
}

pub fn copper_generator(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("copper_generator").unwrap()
}

pub fn plate_press(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("plate_press").unwrap()
}

pub fn wire_drawer(catalog: &Catalog) -> RecipeId {
    catalog.recipe_id("wire_drawer").unwrap()
}
