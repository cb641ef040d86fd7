use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a machine instance. Versioned keys are never reused, so a
    /// sold machine's id stays dead forever.
    pub struct MachineId;

    /// Identifies a warehouse (machine container).
    pub struct WarehouseId;
}

/// Identifies an item type in the catalog. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u32);

/// Identifies a recipe (machine definition) in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeId(pub u32);

/// Identifies an item category in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryId(pub u16);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_id_equality() {
        assert_eq!(ItemId(0), ItemId(0));
        assert_ne!(ItemId(0), ItemId(1));
    }

    #[test]
    fn ids_are_map_keys() {
        use std::collections::BTreeMap;
        let mut map = BTreeMap::new();
        map.insert(ItemId(0), "raw_steel");
        map.insert(ItemId(1), "steel_plates");
        assert_eq!(map[&ItemId(0)], "raw_steel");
    }

    #[test]
    fn machine_ids_are_never_reused() {
        let mut machines = slotmap::SlotMap::<MachineId, u32>::with_key();
        let first = machines.insert(1);
        machines.remove(first);
        let second = machines.insert(2);
        assert_ne!(first, second);
        assert!(machines.get(first).is_none());
    }
}
