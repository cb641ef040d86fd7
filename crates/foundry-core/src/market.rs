//! The market: per-item price records updated by a bounded random walk
//! with supply feedback.
//!
//! Each update nudges every sellable item's price by a uniform draw within
//! its volatility, plus a small bias against whatever the player is
//! hoarding. Prices are clamped to a band around the base price, so the
//! walk can neither inflate without bound nor collapse to zero.

use crate::catalog::Catalog;
use crate::fixed::Fixed64;
use crate::id::ItemId;
use crate::ledger::EconomyLedger;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which way the last update moved a price, recorded before clamping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Trend {
    Falling,
    #[default]
    Steady,
    Rising,
}

impl Trend {
    /// The -1 / 0 / +1 encoding used by display layers.
    pub fn signum(self) -> i8 {
        match self {
            Trend::Falling => -1,
            Trend::Steady => 0,
            Trend::Rising => 1,
        }
    }
}

/// Live pricing for one sellable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRecord {
    /// Fixed reference price from the catalog.
    pub base: Fixed64,
    /// Current price, bounded to the configured band around `base`.
    pub current: Fixed64,
    pub trend: Trend,
}

/// All price records plus the generator driving the walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketState {
    records: BTreeMap<ItemId, PriceRecord>,
    rng: SimRng,
    updates_run: u64,
}

impl MarketState {
    /// One record per sellable catalog item, starting at base price.
    pub fn new(catalog: &Catalog, seed: u64) -> Self {
        let records = catalog
            .items()
            .filter_map(|(id, def)| {
                def.market.as_ref().map(|market| {
                    (
                        id,
                        PriceRecord {
                            base: market.base_price,
                            current: market.base_price,
                            trend: Trend::Steady,
                        },
                    )
                })
            })
            .collect();
        Self {
            records,
            rng: SimRng::new(seed),
            updates_run: 0,
        }
    }

    pub fn price(&self, item: ItemId) -> Option<&PriceRecord> {
        self.records.get(&item)
    }

    /// Records in item-id order.
    pub fn records(&self) -> impl Iterator<Item = (ItemId, &PriceRecord)> {
        self.records.iter().map(|(&id, rec)| (id, rec))
    }

    /// Sellable item ids in deterministic order.
    pub fn item_ids(&self) -> Vec<ItemId> {
        self.records.keys().copied().collect()
    }

    pub fn updates_run(&self) -> u64 {
        self.updates_run
    }

    /// Run one price update over every record.
    ///
    /// The trend is derived from the unclamped candidate, so a price pinned
    /// at a band edge still reports which way it tried to move.
    pub fn update_prices(&mut self, catalog: &Catalog, ledger: &EconomyLedger) {
        let settings = catalog.settings();
        let one = Fixed64::from_num(1);

        for (&item, record) in self.records.iter_mut() {
            let Some(def) = catalog.item(item) else {
                continue;
            };
            let Some(market) = &def.market else {
                continue;
            };

            let change = self.rng.symmetric_unit() * market.volatility;

            let on_hand = ledger.quantity(item);
            let supply_bias = if on_hand > settings.supply_high_threshold {
                -settings.supply_bias
            } else if on_hand < settings.supply_low_threshold {
                settings.supply_bias
            } else {
                Fixed64::ZERO
            };

            let candidate = record.current * (one + change + supply_bias);
            record.trend = if candidate > record.current {
                Trend::Rising
            } else if candidate < record.current {
                Trend::Falling
            } else {
                Trend::Steady
            };

            let floor = record.base * settings.price_floor_ratio;
            let cap = record.base * settings.price_cap_ratio;
            record.current = candidate.clamp(floor, cap);
        }

        self.updates_run += 1;
    }

    /// Every record's item must be a sellable catalog item. Used when
    /// accepting restored state.
    pub(crate) fn check_consistent(&self, catalog: &Catalog) -> Result<(), String> {
        for (&item, _) in self.records.iter() {
            match catalog.item(item) {
                Some(def) if def.sellable() => {}
                Some(def) => {
                    return Err(format!("price record for non-sellable item '{}'", def.name));
                }
                None => return Err("price record for unknown item".to_string()),
            }
        }
        Ok(())
    }
}
