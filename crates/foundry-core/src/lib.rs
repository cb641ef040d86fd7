//! Foundry Core -- the production-and-economy simulation engine for idle
//! factory games.
//!
//! This crate provides the recipe catalog, warehouse-grouped machine
//! instances, the discrete production tick, the bounded random-walk market,
//! versioned snapshots, and the deterministic fixed-point arithmetic they
//! all run on. Rendering, persistence media, and input handling live in the
//! embedding application; it drives the engine through commands and reads
//! state back through owned-copy views.
//!
//! # Two-Timer Pipeline
//!
//! An external driver feeds elapsed wall time into a
//! [`scheduler::TickDriver`], which releases:
//!
//! 1. **Production ticks** -- [`engine::SimulationEngine::advance`] moves
//!    every machine's fractional progress, completing whole cycles against
//!    the global ledger.
//! 2. **Price updates** -- [`engine::SimulationEngine::update_prices`] runs
//!    the supply-biased random walk over every sellable item, on a slower
//!    period.
//!
//! Commands (buy, sell, upgrade) apply synchronously between ticks and are
//! atomic: they fully apply or return a [`engine::CommandError`] having
//! changed nothing.
//!
//! ```rust,ignore
//! let catalog = foundry_data::load_catalog(Path::new("data"))?;
//! let mut engine = SimulationEngine::new(catalog, seed);
//! let mut driver = TickDriver::new(engine.catalog().settings());
//!
//! // Per frame:
//! let due = driver.advance(elapsed_seconds);
//! for _ in 0..due.production_ticks {
//!     engine.advance(driver.production_period());
//! }
//! for _ in 0..due.price_updates {
//!     engine.update_prices();
//! }
//! ```
//!
//! # Key Types
//!
//! - [`engine::SimulationEngine`] -- owns all state; commands and ticks.
//! - [`catalog::Catalog`] -- immutable item/recipe definitions and tuning.
//! - [`ledger::EconomyLedger`] -- balance, capacity-bounded inventory, stats.
//! - [`machine::MachineFleet`] -- warehouses and machine instances.
//! - [`market::MarketState`] -- price records and the walk driving them.
//! - [`scheduler::TickDriver`] -- wall time in, due ticks out.
//! - [`snapshot`] -- versioned serialization with fail-closed restore.
//! - [`fixed::Fixed64`] -- Q32.32 fixed-point for deterministic math.

pub mod catalog;
pub mod engine;
pub mod fixed;
pub mod id;
pub mod ledger;
pub mod machine;
pub mod market;
pub mod production;
pub mod query;
pub mod rng;
pub mod scheduler;
pub mod snapshot;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
