//! The economy ledger: balance, the capacity-bounded global inventory, and
//! lifetime statistics.
//!
//! The ledger owns the storage invariant: the sum of all stored item
//! quantities never exceeds `max_storage`. `store` refuses overflow rather
//! than clipping silently, and `remove` reports what actually came out.

use crate::fixed::Money;
use crate::id::ItemId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Monotonically non-decreasing lifetime counters, used only for reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeStats {
    pub items_produced: u64,
    pub items_sold: u64,
    pub money_earned: u64,
    pub machines_bought: u64,
}

/// Balance, inventory, and storage capacity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyLedger {
    balance: Money,
    max_storage: u32,
    inventory: BTreeMap<ItemId, u32>,
    stats: LifetimeStats,
}

impl EconomyLedger {
    pub fn new(starting_balance: Money, starting_storage: u32) -> Self {
        Self {
            balance: starting_balance,
            max_storage: starting_storage,
            inventory: BTreeMap::new(),
            stats: LifetimeStats::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Money
    // -----------------------------------------------------------------------

    pub fn balance(&self) -> Money {
        self.balance
    }

    /// Add credits, saturating at the ceiling.
    pub fn credit(&mut self, amount: Money) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Spend credits. Returns `false` (and changes nothing) if the balance
    /// would go negative.
    #[must_use = "a false result means nothing was debited"]
    pub fn try_debit(&mut self, amount: Money) -> bool {
        match self.balance.checked_sub(amount) {
            Some(rest) => {
                self.balance = rest;
                true
            }
            None => false,
        }
    }

    // -----------------------------------------------------------------------
    // Inventory
    // -----------------------------------------------------------------------

    pub fn max_storage(&self) -> u32 {
        self.max_storage
    }

    pub fn grow_storage(&mut self, amount: u32) {
        self.max_storage = self.max_storage.saturating_add(amount);
    }

    /// Quantity on hand for one item. Absent items count as zero.
    pub fn quantity(&self, item: ItemId) -> u32 {
        self.inventory.get(&item).copied().unwrap_or(0)
    }

    /// Sum of all stored quantities.
    pub fn total_stored(&self) -> u32 {
        self.inventory.values().sum()
    }

    pub fn free_space(&self) -> u32 {
        self.max_storage.saturating_sub(self.total_stored())
    }

    pub fn has_space_for(&self, quantity: u32) -> bool {
        quantity <= self.free_space()
    }

    /// Store items. Returns the amount that didn't fit.
    #[must_use = "overflow count indicates items that did not fit"]
    pub fn store(&mut self, item: ItemId, quantity: u32) -> u32 {
        let to_add = quantity.min(self.free_space());
        if to_add > 0 {
            *self.inventory.entry(item).or_insert(0) += to_add;
        }
        quantity - to_add
    }

    /// Remove items. Returns the amount actually removed.
    #[must_use = "returns the quantity actually removed, which may be less than requested"]
    pub fn remove(&mut self, item: ItemId, quantity: u32) -> u32 {
        let Some(held) = self.inventory.get_mut(&item) else {
            return 0;
        };
        let to_remove = quantity.min(*held);
        *held -= to_remove;
        if *held == 0 {
            self.inventory.remove(&item);
        }
        to_remove
    }

    /// Stored items in id order. Zero-quantity entries are never present.
    pub fn stored_items(&self) -> impl Iterator<Item = (ItemId, u32)> + '_ {
        self.inventory.iter().map(|(&item, &qty)| (item, qty))
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> &LifetimeStats {
        &self.stats
    }

    pub fn record_produced(&mut self, count: u32) {
        self.stats.items_produced += count as u64;
    }

    pub fn record_sold(&mut self, count: u64, revenue: Money) {
        self.stats.items_sold += count;
        self.stats.money_earned = self.stats.money_earned.saturating_add(revenue);
    }

    pub fn record_machine_bought(&mut self) {
        self.stats.machines_bought += 1;
    }
}
