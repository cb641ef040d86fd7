//! Machine instances and the warehouses that hold them.
//!
//! Machines live in a slotmap keyed by versioned [`MachineId`]s; each
//! warehouse keeps an ordered list of the ids it owns, which is also the
//! deterministic processing order for the production tick.

use crate::fixed::Fixed64;
use crate::id::{MachineId, RecipeId, WarehouseId};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

/// One owned machine. Created on purchase, destroyed on sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInstance {
    pub recipe: RecipeId,
    /// Fractional completion of the current cycle, in `[0, 1]`. Reaches 1
    /// only while stalled; a completed cycle always subtracts the whole.
    pub progress: Fixed64,
    /// Disabled machines are skipped by the tick; their progress freezes.
    pub enabled: bool,
}

impl MachineInstance {
    pub fn new(recipe: RecipeId) -> Self {
        Self {
            recipe,
            progress: Fixed64::ZERO,
            enabled: true,
        }
    }
}

/// A capacity-bounded group of machines. Never destroyed during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub name: String,
    /// Upgrade level; scales the next slot-upgrade cost.
    pub level: u32,
    pub max_slots: u32,
    /// Owned machines in insertion order.
    pub machines: Vec<MachineId>,
}

impl Warehouse {
    fn new(name: String, max_slots: u32) -> Self {
        Self {
            name,
            level: 1,
            max_slots,
            machines: Vec::new(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.machines.len() >= self.max_slots as usize
    }
}

/// All owned machines and warehouses, plus per-recipe ownership counts for
/// the cost curves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineFleet {
    machines: SlotMap<MachineId, MachineInstance>,
    warehouses: SlotMap<WarehouseId, Warehouse>,
    /// Warehouse iteration order. Warehouses are never removed, so this
    /// only ever grows.
    warehouse_order: Vec<WarehouseId>,
    /// Owned count per recipe, indexed by `RecipeId`.
    owned_counts: Vec<u32>,
}

impl MachineFleet {
    /// A fresh fleet with one starting warehouse.
    pub fn new(recipe_count: usize, starting_slots: u32) -> Self {
        let mut fleet = Self {
            machines: SlotMap::with_key(),
            warehouses: SlotMap::with_key(),
            warehouse_order: Vec::new(),
            owned_counts: vec![0; recipe_count],
        };
        fleet.add_warehouse("Main Warehouse".to_string(), starting_slots);
        fleet
    }

    // -----------------------------------------------------------------------
    // Warehouses
    // -----------------------------------------------------------------------

    pub fn add_warehouse(&mut self, name: String, max_slots: u32) -> WarehouseId {
        let id = self.warehouses.insert(Warehouse::new(name, max_slots));
        self.warehouse_order.push(id);
        id
    }

    pub fn warehouse(&self, id: WarehouseId) -> Option<&Warehouse> {
        self.warehouses.get(id)
    }

    pub(crate) fn warehouse_mut(&mut self, id: WarehouseId) -> Option<&mut Warehouse> {
        self.warehouses.get_mut(id)
    }

    /// Warehouse ids in creation order.
    pub fn warehouse_ids(&self) -> &[WarehouseId] {
        &self.warehouse_order
    }

    pub fn warehouse_count(&self) -> usize {
        self.warehouse_order.len()
    }

    // -----------------------------------------------------------------------
    // Machines
    // -----------------------------------------------------------------------

    pub fn machine(&self, id: MachineId) -> Option<&MachineInstance> {
        self.machines.get(id)
    }

    pub(crate) fn machine_mut(&mut self, id: MachineId) -> Option<&mut MachineInstance> {
        self.machines.get_mut(id)
    }

    /// Number of machines across all warehouses.
    pub fn machine_count(&self) -> usize {
        self.machines.len()
    }

    /// How many machines of this recipe are owned. Feeds the cost curve.
    pub fn owned_count(&self, recipe: RecipeId) -> u32 {
        self.owned_counts
            .get(recipe.0 as usize)
            .copied()
            .unwrap_or(0)
    }

    /// Append a machine with zero progress. Returns `None` if the warehouse
    /// is unknown or full.
    pub(crate) fn add_machine(
        &mut self,
        warehouse: WarehouseId,
        recipe: RecipeId,
    ) -> Option<MachineId> {
        let wh = self.warehouses.get(warehouse)?;
        if wh.is_full() {
            return None;
        }
        let id = self.machines.insert(MachineInstance::new(recipe));
        self.warehouses[warehouse].machines.push(id);
        if let Some(count) = self.owned_counts.get_mut(recipe.0 as usize) {
            *count += 1;
        }
        Some(id)
    }

    /// Remove a machine from the given warehouse. Returns `None` (and
    /// changes nothing) if the instance does not live there.
    pub(crate) fn remove_machine(
        &mut self,
        warehouse: WarehouseId,
        machine: MachineId,
    ) -> Option<MachineInstance> {
        let wh = self.warehouses.get_mut(warehouse)?;
        let index = wh.machines.iter().position(|&m| m == machine)?;
        wh.machines.remove(index);
        let instance = self.machines.remove(machine)?;
        if let Some(count) = self.owned_counts.get_mut(instance.recipe.0 as usize) {
            *count = count.saturating_sub(1);
        }
        Some(instance)
    }

    /// Validate internal consistency. Used when accepting restored state.
    pub(crate) fn check_consistent(&self, recipe_count: usize) -> Result<(), String> {
        if self.owned_counts.len() != recipe_count {
            return Err(format!(
                "owned counts cover {} recipes, catalog has {recipe_count}",
                self.owned_counts.len()
            ));
        }
        if self.warehouse_order.len() != self.warehouses.len() {
            return Err("warehouse order list disagrees with warehouse table".to_string());
        }
        let mut seen = 0usize;
        for &wid in &self.warehouse_order {
            let Some(wh) = self.warehouses.get(wid) else {
                return Err("warehouse order references a missing warehouse".to_string());
            };
            if wh.machines.len() > wh.max_slots as usize {
                return Err(format!("warehouse '{}' holds more machines than slots", wh.name));
            }
            for &mid in &wh.machines {
                let Some(m) = self.machines.get(mid) else {
                    return Err("warehouse references a missing machine".to_string());
                };
                if m.recipe.0 as usize >= recipe_count {
                    return Err("machine references an unknown recipe".to_string());
                }
                seen += 1;
            }
        }
        if seen != self.machines.len() {
            return Err("orphaned machines outside any warehouse".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fleet() -> MachineFleet {
        MachineFleet::new(3, 2)
    }

    #[test]
    fn starts_with_main_warehouse() {
        let fleet = fleet();
        assert_eq!(fleet.warehouse_count(), 1);
        let main = fleet.warehouse(fleet.warehouse_ids()[0]).unwrap();
        assert_eq!(main.name, "Main Warehouse");
        assert_eq!(main.level, 1);
        assert_eq!(main.max_slots, 2);
    }

    #[test]
    fn add_machine_tracks_counts_and_order() {
        let mut fleet = fleet();
        let wid = fleet.warehouse_ids()[0];
        let a = fleet.add_machine(wid, RecipeId(0)).unwrap();
        let b = fleet.add_machine(wid, RecipeId(0)).unwrap();
        assert_eq!(fleet.owned_count(RecipeId(0)), 2);
        assert_eq!(fleet.warehouse(wid).unwrap().machines, vec![a, b]);
    }

    #[test]
    fn add_machine_rejects_full_warehouse() {
        let mut fleet = fleet();
        let wid = fleet.warehouse_ids()[0];
        fleet.add_machine(wid, RecipeId(0)).unwrap();
        fleet.add_machine(wid, RecipeId(1)).unwrap();
        assert!(fleet.add_machine(wid, RecipeId(2)).is_none());
        assert_eq!(fleet.machine_count(), 2);
    }

    #[test]
    fn remove_machine_updates_counts() {
        let mut fleet = fleet();
        let wid = fleet.warehouse_ids()[0];
        let a = fleet.add_machine(wid, RecipeId(1)).unwrap();
        let removed = fleet.remove_machine(wid, a).unwrap();
        assert_eq!(removed.recipe, RecipeId(1));
        assert_eq!(fleet.owned_count(RecipeId(1)), 0);
        assert!(fleet.machine(a).is_none());
        assert!(fleet.warehouse(wid).unwrap().machines.is_empty());
    }

    #[test]
    fn remove_machine_from_wrong_warehouse_is_noop() {
        let mut fleet = fleet();
        let first = fleet.warehouse_ids()[0];
        let second = fleet.add_warehouse("Warehouse 2".to_string(), 2);
        let a = fleet.add_machine(first, RecipeId(0)).unwrap();

        assert!(fleet.remove_machine(second, a).is_none());
        assert_eq!(fleet.owned_count(RecipeId(0)), 1);
        assert!(fleet.machine(a).is_some());
    }

    #[test]
    fn machine_ids_survive_other_removals() {
        let mut fleet = fleet();
        let wid = fleet.warehouse_ids()[0];
        let a = fleet.add_machine(wid, RecipeId(0)).unwrap();
        let b = fleet.add_machine(wid, RecipeId(0)).unwrap();
        fleet.remove_machine(wid, a);
        assert_eq!(fleet.machine(b).unwrap().recipe, RecipeId(0));
        assert_eq!(fleet.warehouse(wid).unwrap().machines, vec![b]);
    }

    #[test]
    fn consistency_check_passes_for_healthy_fleet() {
        let mut fleet = fleet();
        let wid = fleet.warehouse_ids()[0];
        fleet.add_machine(wid, RecipeId(0)).unwrap();
        assert!(fleet.check_consistent(3).is_ok());
    }

    #[test]
    fn consistency_check_catches_recipe_count_mismatch() {
        let fleet = fleet();
        assert!(fleet.check_consistent(2).is_err());
    }
}
