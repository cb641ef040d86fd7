//! Versioned snapshots of the full simulation state.
//!
//! Snapshots are `bitcode` payloads led by a magic/version header. Restoring
//! is fail-closed: the header is checked, the payload decoded, and the
//! decoded state cross-checked against the catalog before anything is
//! swapped in. A bad snapshot leaves the current state untouched; callers
//! degrade to a fresh start.
//!
//! The storage medium and write timing belong to the embedding persistence
//! layer; the engine only produces and accepts bytes.

use crate::catalog::Catalog;
use crate::engine::{EngineState, SimulationEngine};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Magic number identifying a Foundry engine snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0xF04D_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 3;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur during serialization.
#[derive(Debug, thiserror::Error)]
pub enum SerializeError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
}

/// Errors that can occur during restore. All of them leave the engine's
/// current state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum DeserializeError {
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("snapshot state inconsistent: {0}")]
    Inconsistent(String),
}

// ---------------------------------------------------------------------------
// Snapshot header
// ---------------------------------------------------------------------------

/// Header prepended to every serialized snapshot. Enables format detection
/// and version checking before the payload is trusted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Production ticks run at the time the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), DeserializeError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(DeserializeError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(DeserializeError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(DeserializeError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Snapshot payload
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct EngineSnapshot {
    header: SnapshotHeader,
    state: EngineState,
}

fn decode_checked(catalog: &Catalog, data: &[u8]) -> Result<EngineState, DeserializeError> {
    let snapshot: EngineSnapshot =
        bitcode::deserialize(data).map_err(|e| DeserializeError::Decode(e.to_string()))?;
    snapshot.header.validate()?;
    snapshot
        .state
        .fleet
        .check_consistent(catalog.recipe_count())
        .map_err(DeserializeError::Inconsistent)?;
    snapshot
        .state
        .market
        .check_consistent(catalog)
        .map_err(DeserializeError::Inconsistent)?;
    Ok(snapshot.state)
}

impl SimulationEngine {
    /// Serialize the full simulation state to versioned bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializeError> {
        let snapshot = EngineSnapshot {
            header: SnapshotHeader::new(self.ticks()),
            state: self.state.clone(),
        };
        bitcode::serialize(&snapshot).map_err(|e| SerializeError::Encode(e.to_string()))
    }

    /// Build an engine from a snapshot and the catalog it was taken against.
    pub fn deserialize(catalog: Catalog, data: &[u8]) -> Result<Self, DeserializeError> {
        let state = decode_checked(&catalog, data)?;
        Ok(Self::from_parts(catalog, state))
    }

    /// Replace this engine's state with a snapshot. On any error the
    /// current state is left untouched -- no partial merge.
    pub fn load_snapshot(&mut self, data: &[u8]) -> Result<(), DeserializeError> {
        let state = decode_checked(self.catalog(), data)?;
        self.replace_state(state);
        Ok(())
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Fixed64;
    use crate::test_utils::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn played_engine() -> SimulationEngine {
        let mut engine = test_engine(42);
        let wid = engine.fleet().warehouse_ids()[0];
        let generator = steel_generator(engine.catalog());
        let press = plate_press(engine.catalog());
        engine.purchase_machine(generator, wid).unwrap();
        engine.purchase_machine(press, wid).unwrap();
        for _ in 0..7 {
            engine.advance(fixed(1.0));
        }
        engine.update_prices();
        engine.update_prices();
        engine
    }

    #[test]
    fn round_trip_reproduces_observable_state() {
        let engine = played_engine();
        let data = engine.serialize().unwrap();
        let restored = SimulationEngine::deserialize(test_catalog(), &data).unwrap();

        assert_eq!(restored.balance(), engine.balance());
        assert_eq!(restored.ticks(), engine.ticks());
        assert_eq!(restored.ledger_view(), engine.ledger_view());
        assert_eq!(restored.warehouse_views(), engine.warehouse_views());
        assert_eq!(restored.market_rows(), engine.market_rows());
    }

    #[test]
    fn round_trip_continues_identically() {
        let mut engine = played_engine();
        let data = engine.serialize().unwrap();
        let mut restored = SimulationEngine::deserialize(test_catalog(), &data).unwrap();

        for _ in 0..5 {
            engine.advance(fixed(1.0));
            restored.advance(fixed(1.0));
        }
        engine.update_prices();
        restored.update_prices();

        assert_eq!(restored.ledger_view(), engine.ledger_view());
        assert_eq!(restored.market_rows(), engine.market_rows());
    }

    #[test]
    fn machine_ids_stay_stable_across_restore() {
        let mut engine = test_engine(1);
        let wid = engine.fleet().warehouse_ids()[0];
        let generator = steel_generator(engine.catalog());
        let a = engine.purchase_machine(generator, wid).unwrap().machine;
        let b = engine.purchase_machine(generator, wid).unwrap().machine;
        engine.sell_machine(wid, a).unwrap();

        let data = engine.serialize().unwrap();
        let mut restored = SimulationEngine::deserialize(test_catalog(), &data).unwrap();

        // The surviving id resolves; the sold one stays dead, and new
        // purchases never revive it.
        assert!(restored.fleet().machine(b).is_some());
        assert!(restored.fleet().machine(a).is_none());
        let c = restored.purchase_machine(generator, wid).unwrap().machine;
        assert_ne!(c, a);
    }

    #[test]
    fn corrupt_data_is_rejected() {
        let engine = played_engine();
        let mut data = engine.serialize().unwrap();
        data.truncate(data.len() / 2);
        assert!(matches!(
            SimulationEngine::deserialize(test_catalog(), &data),
            Err(DeserializeError::Decode(_))
        ));
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let garbage = vec![0xAB; 64];
        let result = SimulationEngine::deserialize(test_catalog(), &garbage);
        assert!(result.is_err());
    }

    #[test]
    fn load_snapshot_failure_preserves_current_state() {
        let mut engine = played_engine();
        let before_balance = engine.balance();
        let before_ticks = engine.ticks();

        let garbage = vec![0x00; 16];
        assert!(engine.load_snapshot(&garbage).is_err());
        assert_eq!(engine.balance(), before_balance);
        assert_eq!(engine.ticks(), before_ticks);
    }

    #[test]
    fn load_snapshot_replaces_state_on_success() {
        let engine = played_engine();
        let data = engine.serialize().unwrap();

        let mut other = test_engine(7);
        other.upgrade_storage().unwrap();
        other.load_snapshot(&data).unwrap();
        assert_eq!(other.balance(), engine.balance());
        assert_eq!(other.ledger_view(), engine.ledger_view());
    }

    #[test]
    fn snapshot_against_wrong_catalog_is_rejected() {
        // A catalog with fewer recipes than the snapshot's owned counts.
        let engine = played_engine();
        let data = engine.serialize().unwrap();
        let result = SimulationEngine::deserialize(tiny_catalog(), &data);
        assert!(matches!(result, Err(DeserializeError::Inconsistent(_))));
    }

    #[test]
    fn header_validation() {
        let good = SnapshotHeader::new(10);
        assert!(good.validate().is_ok());

        let bad_magic = SnapshotHeader {
            magic: 0xDEAD_BEEF,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(
            bad_magic.validate(),
            Err(DeserializeError::InvalidMagic(0xDEAD_BEEF))
        ));

        let future = SnapshotHeader {
            version: FORMAT_VERSION + 1,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(
            future.validate(),
            Err(DeserializeError::FutureVersion(_))
        ));

        let stale = SnapshotHeader {
            version: FORMAT_VERSION - 1,
            ..SnapshotHeader::new(0)
        };
        assert!(matches!(
            stale.validate(),
            Err(DeserializeError::UnsupportedVersion(_))
        ));
    }
}
