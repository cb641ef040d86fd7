//! Read-only query API for inspecting simulation state.
//!
//! Provides view types that aggregate engine state for rendering and UI
//! consumers. All types are owned copies -- no references into internal
//! engine storage.

use crate::engine::SimulationEngine;
use crate::fixed::{Fixed64, Money, scale_money};
use crate::id::{ItemId, MachineId, RecipeId, WarehouseId};
use crate::ledger::LifetimeStats;
use crate::market::Trend;

/// Balance, storage, and lifetime counters in one view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerView {
    pub balance: Money,
    pub max_storage: u32,
    pub total_stored: u32,
    pub stats: LifetimeStats,
}

/// One machine as a UI row: progress plus what a sale would refund now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineView {
    pub id: MachineId,
    pub recipe: RecipeId,
    pub progress: Fixed64,
    pub enabled: bool,
    pub sell_refund: Money,
}

/// One warehouse with its machines in processing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseView {
    pub id: WarehouseId,
    pub name: String,
    pub level: u32,
    pub max_slots: u32,
    pub machines: Vec<MachineView>,
}

/// One market table row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketRow {
    pub item: ItemId,
    pub base: Fixed64,
    pub current: Fixed64,
    pub trend: Trend,
    pub on_hand: u32,
}

/// Theoretical output per second for one item across all enabled machines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductionRate {
    pub item: ItemId,
    pub per_second: Fixed64,
}

impl SimulationEngine {
    pub fn ledger_view(&self) -> LedgerView {
        let ledger = self.ledger();
        LedgerView {
            balance: ledger.balance(),
            max_storage: ledger.max_storage(),
            total_stored: ledger.total_stored(),
            stats: ledger.stats().clone(),
        }
    }

    /// All warehouses in creation order, machines in processing order.
    pub fn warehouse_views(&self) -> Vec<WarehouseView> {
        let refund_rate = self.catalog().settings().machine_refund_rate;
        self.fleet()
            .warehouse_ids()
            .iter()
            .filter_map(|&wid| {
                let wh = self.fleet().warehouse(wid)?;
                let machines = wh
                    .machines
                    .iter()
                    .filter_map(|&mid| {
                        let m = self.fleet().machine(mid)?;
                        let current_cost = self.machine_cost(m.recipe).ok()?;
                        Some(MachineView {
                            id: mid,
                            recipe: m.recipe,
                            progress: m.progress,
                            enabled: m.enabled,
                            sell_refund: scale_money(current_cost, refund_rate),
                        })
                    })
                    .collect();
                Some(WarehouseView {
                    id: wid,
                    name: wh.name.clone(),
                    level: wh.level,
                    max_slots: wh.max_slots,
                    machines,
                })
            })
            .collect()
    }

    /// Market rows in item-id order.
    pub fn market_rows(&self) -> Vec<MarketRow> {
        self.market()
            .records()
            .map(|(item, record)| MarketRow {
                item,
                base: record.base,
                current: record.current,
                trend: record.trend,
                on_hand: self.ledger().quantity(item),
            })
            .collect()
    }

    /// Theoretical throughput of every enabled machine, summed per output
    /// item. Ignores stalls; this is the HUD's optimistic rate line.
    pub fn production_rates(&self) -> Vec<ProductionRate> {
        let mut per_item: std::collections::BTreeMap<ItemId, Fixed64> =
            std::collections::BTreeMap::new();
        for &wid in self.fleet().warehouse_ids() {
            let Some(wh) = self.fleet().warehouse(wid) else {
                continue;
            };
            for &mid in &wh.machines {
                let Some(m) = self.fleet().machine(mid) else {
                    continue;
                };
                if !m.enabled {
                    continue;
                }
                let Some(recipe) = self.catalog().recipe(m.recipe) else {
                    continue;
                };
                for output in &recipe.outputs {
                    let rate = Fixed64::from_num(output.amount) / recipe.craft_time;
                    *per_item.entry(output.item).or_insert(Fixed64::ZERO) += rate;
                }
            }
        }
        per_item
            .into_iter()
            .map(|(item, per_second)| ProductionRate { item, per_second })
            .collect()
    }
}
