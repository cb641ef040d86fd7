//! Foundry Data -- catalog loading for the Foundry simulation engine.
//!
//! Game content lives in data files (RON, JSON, or TOML), not code. This
//! crate parses them into [`schema`] structs, resolves name references, and
//! builds the validated, immutable [`foundry_core::catalog::Catalog`] the
//! engine runs on. The shipped content lives in `data/catalog.ron`.

pub mod loader;
pub mod schema;

pub use loader::{DataLoadError, build_catalog, load_catalog};

/// The shipped catalog file, compiled in so embedders can start without a
/// data directory on disk.
pub const SHIPPED_CATALOG_RON: &str = include_str!("../data/catalog.ron");

/// Build the shipped catalog.
pub fn shipped_catalog() -> Result<foundry_core::catalog::Catalog, DataLoadError> {
    let data: schema::CatalogData =
        ron::from_str(SHIPPED_CATALOG_RON).map_err(|e| DataLoadError::Parse {
            file: std::path::PathBuf::from("data/catalog.ron"),
            detail: e.to_string(),
        })?;
    build_catalog(data)
}
