//! Resolution pipeline: reads a catalog data file, resolves name references,
//! and builds the immutable [`Catalog`].
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and the
//! name-to-id resolution that turns [`CatalogData`] into engine types.

use crate::schema::{CatalogData, MachineCategoryData, RecipeEntryData};
use foundry_core::catalog::{
    Catalog, CatalogBuilder, CatalogError, CostCurve, EngineSettings, ItemDef, MachineCategory,
    MarketDef, RecipeDef, RecipeEntry, WarehouseTuning,
};
use foundry_core::fixed::Fixed64;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A name reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}'")]
    UnresolvedRef {
        name: String,
        expected_kind: &'static str,
    },

    /// Catalog validation rejected the resolved content.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without
/// extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from
/// extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Json => serde_json::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
        Format::Toml => toml::from_str(&content).map_err(|e| DataLoadError::Parse {
            file: path.to_path_buf(),
            detail: e.to_string(),
        }),
    }
}

// ===========================================================================
// Resolution
// ===========================================================================

fn resolve_entries(
    builder: &CatalogBuilder,
    entries: &[RecipeEntryData],
) -> Result<Vec<RecipeEntry>, DataLoadError> {
    entries
        .iter()
        .map(|entry| {
            let item = builder
                .item_id(entry.item_name())
                .ok_or_else(|| DataLoadError::UnresolvedRef {
                    name: entry.item_name().to_string(),
                    expected_kind: "item",
                })?;
            Ok(RecipeEntry {
                item,
                amount: entry.amount(),
            })
        })
        .collect()
}

fn cost_curve(scaling: f64) -> CostCurve {
    if scaling == 1.0 {
        CostCurve::Flat
    } else {
        CostCurve::Geometric {
            factor: Fixed64::from_num(scaling),
        }
    }
}

/// Resolve parsed data into a validated [`Catalog`].
pub fn build_catalog(data: CatalogData) -> Result<Catalog, DataLoadError> {
    let mut builder = CatalogBuilder::new();

    builder.set_settings(EngineSettings {
        starting_balance: data.settings.starting_balance,
        starting_storage: data.settings.starting_storage,
        production_tick_seconds: Fixed64::from_num(data.settings.production_tick_seconds),
        price_update_seconds: Fixed64::from_num(data.settings.price_update_seconds),
        machine_refund_rate: Fixed64::from_num(data.settings.machine_refund_rate),
        supply_high_threshold: data.settings.supply_high_threshold,
        supply_low_threshold: data.settings.supply_low_threshold,
        supply_bias: Fixed64::from_num(data.settings.supply_bias),
        price_floor_ratio: Fixed64::from_num(data.settings.price_floor_ratio),
        price_cap_ratio: Fixed64::from_num(data.settings.price_cap_ratio),
    });
    builder.set_tuning(WarehouseTuning {
        base_slots: data.warehouses.base_slots,
        base_cost: data.warehouses.base_cost,
        cost_curve: cost_curve(data.warehouses.cost_scaling),
        max_warehouses: data.warehouses.max_warehouses,
        slot_upgrade_cost: data.warehouses.slot_upgrade_cost,
        slot_upgrade_amount: data.warehouses.slot_upgrade_amount,
        storage_upgrade_cost: data.warehouses.storage_upgrade_cost,
        storage_upgrade_amount: data.warehouses.storage_upgrade_amount,
    });

    for category in &data.item_categories {
        builder.register_category(&category.name, &category.display_name);
    }

    for item in &data.items {
        let category =
            builder
                .category_id(&item.category)
                .ok_or_else(|| DataLoadError::UnresolvedRef {
                    name: item.category.clone(),
                    expected_kind: "category",
                })?;
        builder.register_item(ItemDef {
            name: item.name.clone(),
            display_name: item.display_name.clone(),
            description: item.description.clone(),
            category,
            stack_size: item.stack_size,
            market: item.market.as_ref().map(|m| MarketDef {
                base_price: Fixed64::from_num(m.base_price),
                volatility: Fixed64::from_num(m.volatility),
            }),
        });
    }

    for machine in &data.machines {
        let inputs = resolve_entries(&builder, &machine.inputs)?;
        let outputs = resolve_entries(&builder, &machine.outputs)?;
        builder.register_recipe(RecipeDef {
            name: machine.name.clone(),
            display_name: machine.display_name.clone(),
            description: machine.description.clone(),
            category: match machine.category {
                MachineCategoryData::Generator => MachineCategory::Generator,
                MachineCategoryData::Processor => MachineCategory::Processor,
                MachineCategoryData::Assembler => MachineCategory::Assembler,
            },
            tier: machine.tier,
            inputs,
            outputs,
            craft_time: Fixed64::from_num(machine.craft_time),
            base_cost: machine.base_cost,
            cost_curve: cost_curve(machine.cost_scaling),
        });
    }

    Ok(builder.build()?)
}

/// Load and resolve the catalog from `{dir}/catalog.{ron,toml,json}`.
pub fn load_catalog(dir: &Path) -> Result<Catalog, DataLoadError> {
    let path = require_data_file(dir, "catalog")?;
    let data: CatalogData = deserialize_file(&path)?;
    build_catalog(data)
}
