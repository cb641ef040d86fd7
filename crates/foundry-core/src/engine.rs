//! The simulation engine: owns the catalog and all mutable state, and is
//! the single entry point for ticks and player commands.
//!
//! # Architecture
//!
//! A [`SimulationEngine`] owns:
//! - An immutable [`Catalog`] (items, recipes, tuning) referenced by id
//! - An `EngineState`: [`EconomyLedger`], [`MachineFleet`], [`MarketState`],
//!   and the tick counter
//!
//! Two externally-driven operations advance time ([`SimulationEngine::advance`]
//! for production, [`SimulationEngine::update_prices`] for the market); see
//! [`crate::scheduler::TickDriver`] for turning wall time into calls.
//! Commands validate, then apply fully or not at all -- every failure path
//! leaves the state untouched and returns a [`CommandError`].

use crate::catalog::Catalog;
use crate::fixed::{Fixed64, Money, sale_revenue, scale_money};
use crate::id::{ItemId, MachineId, RecipeId, WarehouseId};
use crate::ledger::EconomyLedger;
use crate::machine::MachineFleet;
use crate::market::MarketState;
use crate::production::advance_machine;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// What kind of id failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Item,
    Recipe,
    Warehouse,
    Machine,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityKind::Item => "item",
            EntityKind::Recipe => "recipe",
            EntityKind::Warehouse => "warehouse",
            EntityKind::Machine => "machine",
        };
        f.write_str(s)
    }
}

/// Why a command was rejected. Rejections never partially apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },
    #[error("capacity reached ({limit})")]
    CapacityReached { limit: u32 },
    #[error("unknown {kind} reference")]
    InvalidReference { kind: EntityKind },
    #[error("invalid amount: {requested}")]
    InvalidAmount { requested: u32 },
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

/// A successful machine purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PurchaseReceipt {
    pub machine: MachineId,
    pub cost: Money,
}

/// A successful machine sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineSaleReceipt {
    pub refund: Money,
}

/// A successful warehouse purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WarehouseReceipt {
    pub warehouse: WarehouseId,
    pub cost: Money,
}

/// A successful upgrade; `new_value` is the slot count or storage cap after.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReceipt {
    pub cost: Money,
    pub new_value: u32,
}

/// The result of selling one item. `sold == 0` is the no-op result: nothing
/// was on hand, or the item isn't traded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleReceipt {
    pub item: ItemId,
    pub sold: u32,
    pub revenue: Money,
}

impl SaleReceipt {
    fn none(item: ItemId) -> Self {
        Self {
            item,
            sold: 0,
            revenue: 0,
        }
    }

    pub fn is_noop(&self) -> bool {
        self.sold == 0
    }
}

/// One line of a sell-all batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLine {
    pub item: ItemId,
    pub sold: u32,
    pub revenue: Money,
}

/// The result of a sell-all: one batched balance credit and stat update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkSaleReceipt {
    pub lines: Vec<SaleLine>,
    pub total_revenue: Money,
    pub items_sold: u64,
}

// ---------------------------------------------------------------------------
// Engine state
// ---------------------------------------------------------------------------

/// Everything a snapshot captures. The catalog stays outside: definitions
/// are config, not state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EngineState {
    pub(crate) ledger: EconomyLedger,
    pub(crate) fleet: MachineFleet,
    pub(crate) market: MarketState,
    /// Production ticks run since the fresh start.
    pub(crate) ticks: u64,
    /// Seed the market RNG started from.
    pub(crate) seed: u64,
}

impl EngineState {
    fn fresh(catalog: &Catalog, seed: u64) -> Self {
        let settings = catalog.settings();
        Self {
            ledger: EconomyLedger::new(settings.starting_balance, settings.starting_storage),
            fleet: MachineFleet::new(catalog.recipe_count(), catalog.tuning().base_slots),
            market: MarketState::new(catalog, seed),
            ticks: 0,
            seed,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The owning simulation instance. Multiple engines can coexist; nothing is
/// global.
#[derive(Debug)]
pub struct SimulationEngine {
    catalog: Catalog,
    pub(crate) state: EngineState,
}

impl SimulationEngine {
    /// A fresh game over the given catalog. The seed drives the market walk.
    pub fn new(catalog: Catalog, seed: u64) -> Self {
        let state = EngineState::fresh(&catalog, seed);
        Self { catalog, state }
    }

    /// Assemble an engine from restored state. Used by snapshot loading,
    /// which validates the state against the catalog first.
    pub(crate) fn from_parts(catalog: Catalog, state: EngineState) -> Self {
        Self { catalog, state }
    }

    pub(crate) fn replace_state(&mut self, state: EngineState) {
        self.state = state;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn balance(&self) -> Money {
        self.state.ledger.balance()
    }

    pub fn ledger(&self) -> &EconomyLedger {
        &self.state.ledger
    }

    pub fn fleet(&self) -> &MachineFleet {
        &self.state.fleet
    }

    pub fn market(&self) -> &MarketState {
        &self.state.market
    }

    /// Production ticks run since the fresh start.
    pub fn ticks(&self) -> u64 {
        self.state.ticks
    }

    /// Seed the market walk started from.
    pub fn seed(&self) -> u64 {
        self.state.seed
    }

    /// Mutable ledger access for test setups.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn ledger_mut(&mut self) -> &mut EconomyLedger {
        &mut self.state.ledger
    }

    /// Discard all state and start fresh. The external driver must reset
    /// its [`crate::scheduler::TickDriver`] alongside this call.
    pub fn reset(&mut self, seed: u64) {
        self.state = EngineState::fresh(&self.catalog, seed);
    }

    // -----------------------------------------------------------------------
    // Ticks
    // -----------------------------------------------------------------------

    /// Advance every machine by `delta_seconds` of production time.
    ///
    /// Machines run in insertion order: warehouses in creation order, then
    /// machines in purchase order within each. Deterministic for a given
    /// state and delta.
    pub fn advance(&mut self, delta_seconds: Fixed64) {
        if delta_seconds <= Fixed64::ZERO {
            return;
        }
        let state = &mut self.state;
        for wid in state.fleet.warehouse_ids().to_vec() {
            let Some(warehouse) = state.fleet.warehouse(wid) else {
                continue;
            };
            for mid in warehouse.machines.clone() {
                let Some(machine) = state.fleet.machine_mut(mid) else {
                    continue;
                };
                let Some(recipe) = self.catalog.recipe(machine.recipe) else {
                    continue;
                };
                let _ = advance_machine(machine, recipe, &mut state.ledger, delta_seconds);
            }
        }
        state.ticks += 1;
    }

    /// Run one market price update.
    pub fn update_prices(&mut self) {
        self.state
            .market
            .update_prices(&self.catalog, &self.state.ledger);
    }

    // -----------------------------------------------------------------------
    // Costs (shown by shop UIs before committing)
    // -----------------------------------------------------------------------

    /// Current cost of the next machine of this recipe.
    pub fn machine_cost(&self, recipe: RecipeId) -> Result<Money, CommandError> {
        let def = self
            .catalog
            .recipe(recipe)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Recipe,
            })?;
        Ok(def
            .cost_curve
            .cost(def.base_cost, self.state.fleet.owned_count(recipe)))
    }

    /// Current cost of the next warehouse.
    pub fn warehouse_cost(&self) -> Money {
        let tuning = self.catalog.tuning();
        tuning
            .cost_curve
            .cost(tuning.base_cost, self.state.fleet.warehouse_count() as u32)
    }

    /// Current cost of a slot upgrade for the given warehouse.
    pub fn slot_upgrade_cost(&self, warehouse: WarehouseId) -> Result<Money, CommandError> {
        let wh = self
            .state
            .fleet
            .warehouse(warehouse)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Warehouse,
            })?;
        Ok(self
            .catalog
            .tuning()
            .slot_upgrade_cost
            .saturating_mul(wh.level as Money))
    }

    // -----------------------------------------------------------------------
    // Commands: machines & warehouses
    // -----------------------------------------------------------------------

    /// Buy a machine into a warehouse.
    pub fn purchase_machine(
        &mut self,
        recipe: RecipeId,
        warehouse: WarehouseId,
    ) -> Result<PurchaseReceipt, CommandError> {
        let cost = self.machine_cost(recipe)?;
        let wh = self
            .state
            .fleet
            .warehouse(warehouse)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Warehouse,
            })?;
        let available = self.state.ledger.balance();
        if available < cost {
            return Err(CommandError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        if wh.is_full() {
            return Err(CommandError::CapacityReached {
                limit: wh.max_slots,
            });
        }

        if !self.state.ledger.try_debit(cost) {
            return Err(CommandError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        match self.state.fleet.add_machine(warehouse, recipe) {
            Some(machine) => {
                self.state.ledger.record_machine_bought();
                Ok(PurchaseReceipt { machine, cost })
            }
            None => {
                // Roll the debit back; the command must not half-apply.
                self.state.ledger.credit(cost);
                Err(CommandError::CapacityReached {
                    limit: self
                        .state
                        .fleet
                        .warehouse(warehouse)
                        .map(|w| w.max_slots)
                        .unwrap_or(0),
                })
            }
        }
    }

    /// Sell a machine out of a warehouse for a partial refund.
    pub fn sell_machine(
        &mut self,
        warehouse: WarehouseId,
        machine: MachineId,
    ) -> Result<MachineSaleReceipt, CommandError> {
        let wh = self
            .state
            .fleet
            .warehouse(warehouse)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Warehouse,
            })?;
        if !wh.machines.contains(&machine) {
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Machine,
            });
        }
        let recipe = self
            .state
            .fleet
            .machine(machine)
            .map(|m| m.recipe)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Machine,
            })?;

        // Refund against the price the machine would cost right now, at the
        // pre-sale owned count.
        let current_cost = self.machine_cost(recipe)?;
        let refund = scale_money(current_cost, self.catalog.settings().machine_refund_rate);

        if self.state.fleet.remove_machine(warehouse, machine).is_none() {
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Machine,
            });
        }
        self.state.ledger.credit(refund);
        Ok(MachineSaleReceipt { refund })
    }

    /// Enable or disable a machine. Disabled machines hold their progress.
    pub fn set_machine_enabled(
        &mut self,
        warehouse: WarehouseId,
        machine: MachineId,
        enabled: bool,
    ) -> Result<(), CommandError> {
        let wh = self
            .state
            .fleet
            .warehouse(warehouse)
            .ok_or(CommandError::InvalidReference {
                kind: EntityKind::Warehouse,
            })?;
        if !wh.machines.contains(&machine) {
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Machine,
            });
        }
        let Some(m) = self.state.fleet.machine_mut(machine) else {
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Machine,
            });
        };
        m.enabled = enabled;
        Ok(())
    }

    /// Buy a new warehouse.
    pub fn purchase_warehouse(&mut self) -> Result<WarehouseReceipt, CommandError> {
        let tuning = self.catalog.tuning();
        let count = self.state.fleet.warehouse_count();
        if count >= tuning.max_warehouses {
            return Err(CommandError::CapacityReached {
                limit: tuning.max_warehouses as u32,
            });
        }
        let cost = self.warehouse_cost();
        let available = self.state.ledger.balance();
        if !self.state.ledger.try_debit(cost) {
            return Err(CommandError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        let name = format!("Warehouse {}", count + 1);
        let warehouse = self
            .state
            .fleet
            .add_warehouse(name, self.catalog.tuning().base_slots);
        Ok(WarehouseReceipt { warehouse, cost })
    }

    /// Add machine slots to a warehouse. Cost scales with its upgrade level.
    pub fn upgrade_slots(&mut self, warehouse: WarehouseId) -> Result<UpgradeReceipt, CommandError> {
        let cost = self.slot_upgrade_cost(warehouse)?;
        let available = self.state.ledger.balance();
        if !self.state.ledger.try_debit(cost) {
            return Err(CommandError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        let amount = self.catalog.tuning().slot_upgrade_amount;
        let Some(wh) = self.state.fleet.warehouse_mut(warehouse) else {
            // Checked above; keep the command total anyway.
            self.state.ledger.credit(cost);
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Warehouse,
            });
        };
        wh.max_slots += amount;
        wh.level += 1;
        let new_value = wh.max_slots;
        Ok(UpgradeReceipt { cost, new_value })
    }

    /// Raise the global storage cap by a fixed increment at a fixed cost.
    pub fn upgrade_storage(&mut self) -> Result<UpgradeReceipt, CommandError> {
        let tuning = self.catalog.tuning();
        let cost = tuning.storage_upgrade_cost;
        let amount = tuning.storage_upgrade_amount;
        let available = self.state.ledger.balance();
        if !self.state.ledger.try_debit(cost) {
            return Err(CommandError::InsufficientFunds {
                needed: cost,
                available,
            });
        }
        self.state.ledger.grow_storage(amount);
        Ok(UpgradeReceipt {
            cost,
            new_value: self.state.ledger.max_storage(),
        })
    }

    // -----------------------------------------------------------------------
    // Commands: sales
    // -----------------------------------------------------------------------

    /// Sell up to `amount` of an item at the current price.
    ///
    /// The amount clamps to what's on hand. A sellable item with nothing on
    /// hand, or an item that isn't traded, yields the no-op receipt rather
    /// than an error.
    pub fn sell_item(&mut self, item: ItemId, amount: u32) -> Result<SaleReceipt, CommandError> {
        if self.catalog.item(item).is_none() {
            return Err(CommandError::InvalidReference {
                kind: EntityKind::Item,
            });
        }
        if amount == 0 {
            return Err(CommandError::InvalidAmount { requested: 0 });
        }
        let Some(record) = self.state.market.price(item) else {
            return Ok(SaleReceipt::none(item));
        };
        let price = record.current;

        let sold = amount.min(self.state.ledger.quantity(item));
        if sold == 0 {
            return Ok(SaleReceipt::none(item));
        }
        let revenue = sale_revenue(price, sold);

        let removed = self.state.ledger.remove(item, sold);
        debug_assert_eq!(removed, sold);
        self.state.ledger.credit(revenue);
        self.state.ledger.record_sold(sold as u64, revenue);
        Ok(SaleReceipt {
            item,
            sold,
            revenue,
        })
    }

    /// Sell every traded item with stock, in one batched ledger update:
    /// a single balance credit and a single stat update.
    pub fn sell_all(&mut self) -> BulkSaleReceipt {
        let mut receipt = BulkSaleReceipt::default();
        for item in self.state.market.item_ids() {
            let on_hand = self.state.ledger.quantity(item);
            if on_hand == 0 {
                continue;
            }
            let Some(record) = self.state.market.price(item) else {
                continue;
            };
            let revenue = sale_revenue(record.current, on_hand);
            let removed = self.state.ledger.remove(item, on_hand);
            debug_assert_eq!(removed, on_hand);
            receipt.lines.push(SaleLine {
                item,
                sold: on_hand,
                revenue,
            });
            receipt.total_revenue = receipt.total_revenue.saturating_add(revenue);
            receipt.items_sold += on_hand as u64;
        }
        if !receipt.lines.is_empty() {
            self.state.ledger.credit(receipt.total_revenue);
            self.state
                .ledger
                .record_sold(receipt.items_sold, receipt.total_revenue);
        }
        receipt
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn main_warehouse(engine: &SimulationEngine) -> WarehouseId {
        engine.fleet().warehouse_ids()[0]
    }

    // -----------------------------------------------------------------------
    // Purchasing machines
    // -----------------------------------------------------------------------

    #[test]
    fn purchase_machine_debits_and_installs() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());

        let receipt = engine.purchase_machine(generator, wid).unwrap();
        assert_eq!(receipt.cost, 100);
        assert_eq!(engine.balance(), 900);
        assert_eq!(engine.fleet().machine_count(), 1);
        assert_eq!(engine.fleet().owned_count(generator), 1);
        assert_eq!(engine.ledger().stats().machines_bought, 1);
    }

    #[test]
    fn purchase_cost_scales_with_owned_count() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());

        let first = engine.purchase_machine(generator, wid).unwrap();
        let second = engine.purchase_machine(generator, wid).unwrap();
        assert_eq!(first.cost, 100);
        assert_eq!(second.cost, 114); // floor(100 * 1.15)
        assert_eq!(engine.machine_cost(generator).unwrap(), 132); // floor(100 * 1.15^2)
    }

    #[test]
    fn purchase_machine_unknown_recipe() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let err = engine.purchase_machine(RecipeId(999), wid).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidReference {
                kind: EntityKind::Recipe
            }
        );
    }

    #[test]
    fn purchase_machine_insufficient_funds_changes_nothing() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let assembler = plate_press(engine.catalog());

        // Drain the balance below the rising press cost.
        while engine.purchase_machine(assembler, wid).is_ok() {}
        let balance = engine.balance();
        let machines = engine.fleet().machine_count();
        let err = engine.purchase_machine(assembler, wid).unwrap_err();
        assert!(matches!(err, CommandError::InsufficientFunds { .. }));
        assert_eq!(engine.balance(), balance);
        assert_eq!(engine.fleet().machine_count(), machines);
    }

    #[test]
    fn purchase_machine_full_warehouse_keeps_balance() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        engine.ledger_mut().credit(1_000_000);

        let slots = engine.fleet().warehouse(wid).unwrap().max_slots;
        for _ in 0..slots {
            engine.purchase_machine(generator, wid).unwrap();
        }
        let balance = engine.balance();
        let err = engine.purchase_machine(generator, wid).unwrap_err();
        assert_eq!(err, CommandError::CapacityReached { limit: slots });
        assert_eq!(engine.balance(), balance);
    }

    // -----------------------------------------------------------------------
    // Selling machines
    // -----------------------------------------------------------------------

    #[test]
    fn sell_machine_refunds_half_current_cost() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());

        let bought = engine.purchase_machine(generator, wid).unwrap();
        // One owned: current cost is floor(100 * 1.15) = 114, refund 57.
        let current = engine.machine_cost(generator).unwrap();
        let receipt = engine.sell_machine(wid, bought.machine).unwrap();
        assert_eq!(receipt.refund, current / 2);
        assert_eq!(engine.fleet().machine_count(), 0);
        assert_eq!(engine.fleet().owned_count(generator), 0);
    }

    #[test]
    fn sell_machine_not_in_warehouse() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        let bought = engine.purchase_machine(generator, wid).unwrap();
        engine.sell_machine(wid, bought.machine).unwrap();

        // Selling the same instance again is a dangling reference.
        let err = engine.sell_machine(wid, bought.machine).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidReference {
                kind: EntityKind::Machine
            }
        );
    }

    // -----------------------------------------------------------------------
    // Warehouses & upgrades
    // -----------------------------------------------------------------------

    #[test]
    fn purchase_warehouse_scales_geometrically() {
        let mut engine = test_engine(1);
        engine.ledger_mut().credit(10_000_000);

        // Base 500, factor 2, one already owned: first purchase costs 1000.
        assert_eq!(engine.warehouse_cost(), 1000);
        let receipt = engine.purchase_warehouse().unwrap();
        assert_eq!(receipt.cost, 1000);
        assert_eq!(engine.warehouse_cost(), 2000);
        assert_eq!(engine.fleet().warehouse_count(), 2);
        let wh = engine.fleet().warehouse(receipt.warehouse).unwrap();
        assert_eq!(wh.name, "Warehouse 2");
    }

    #[test]
    fn purchase_warehouse_capped_at_max() {
        let mut engine = test_engine(1);
        engine.ledger_mut().credit(Money::MAX / 2);
        let max = engine.catalog().tuning().max_warehouses;
        while engine.fleet().warehouse_count() < max {
            engine.purchase_warehouse().unwrap();
        }
        let err = engine.purchase_warehouse().unwrap_err();
        assert_eq!(err, CommandError::CapacityReached { limit: max as u32 });
    }

    #[test]
    fn upgrade_slots_scales_with_level() {
        let mut engine = test_engine(1);
        engine.ledger_mut().credit(10_000);
        let wid = main_warehouse(&engine);

        assert_eq!(engine.slot_upgrade_cost(wid).unwrap(), 250);
        let receipt = engine.upgrade_slots(wid).unwrap();
        assert_eq!(receipt.cost, 250);
        assert_eq!(receipt.new_value, 15);
        // Level bumped, next upgrade costs double the base.
        assert_eq!(engine.slot_upgrade_cost(wid).unwrap(), 500);
    }

    #[test]
    fn upgrade_storage_raises_cap() {
        let mut engine = test_engine(1);
        let before = engine.ledger().max_storage();
        let receipt = engine.upgrade_storage().unwrap();
        assert_eq!(receipt.new_value, before + 50);
        assert_eq!(engine.ledger().max_storage(), before + 50);
        assert_eq!(engine.balance(), 800);
    }

    // -----------------------------------------------------------------------
    // Production through the engine
    // -----------------------------------------------------------------------

    #[test]
    fn generator_scenario_five_seconds() {
        // From 1000 credits, a 100-cost generator with a 1s craft producing
        // 1 raw steel: advance(5.0) yields 5 steel and zero progress.
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        let steel = raw_steel(engine.catalog());

        let receipt = engine.purchase_machine(generator, wid).unwrap();
        assert_eq!(engine.balance(), 900);

        engine.advance(fixed(5.0));
        assert_eq!(engine.ledger().quantity(steel), 5);
        let machine = engine.fleet().machine(receipt.machine).unwrap();
        assert_eq!(machine.progress, Fixed64::ZERO);
    }

    #[test]
    fn machines_run_in_insertion_order() {
        // A generator ahead of a press in the same warehouse: steel made
        // this tick feeds the press the same tick once enough accumulates.
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        let press = plate_press(engine.catalog());
        let steel = raw_steel(engine.catalog());
        let plates = steel_plates(engine.catalog());

        engine.purchase_machine(generator, wid).unwrap();
        engine.purchase_machine(press, wid).unwrap();

        // 4 ticks of 1s: generator makes 4 steel; the press (2s cycle,
        // 2 steel per plate) completes on ticks 2 and 4.
        for _ in 0..4 {
            engine.advance(fixed(1.0));
        }
        assert_eq!(engine.ledger().quantity(plates), 2);
        assert_eq!(engine.ledger().quantity(steel), 0);
    }

    #[test]
    fn advance_ignores_non_positive_delta() {
        let mut engine = test_engine(1);
        engine.advance(fixed(0.0));
        engine.advance(fixed(-1.0));
        assert_eq!(engine.ticks(), 0);
    }

    #[test]
    fn disabled_machine_skipped_by_tick() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        let steel = raw_steel(engine.catalog());
        let receipt = engine.purchase_machine(generator, wid).unwrap();

        engine
            .set_machine_enabled(wid, receipt.machine, false)
            .unwrap();
        engine.advance(fixed(10.0));
        assert_eq!(engine.ledger().quantity(steel), 0);

        engine
            .set_machine_enabled(wid, receipt.machine, true)
            .unwrap();
        engine.advance(fixed(1.0));
        assert_eq!(engine.ledger().quantity(steel), 1);
    }

    // -----------------------------------------------------------------------
    // Sales
    // -----------------------------------------------------------------------

    #[test]
    fn sell_item_clamps_to_on_hand() {
        // Selling 5 with 3 on hand sells exactly 3 and credits
        // floor(price * 3).
        let mut engine = test_engine(1);
        let plates = steel_plates(engine.catalog());
        let _ = engine.ledger_mut().store(plates, 3);

        let price = engine.market().price(plates).unwrap().current;
        let before = engine.balance();
        let receipt = engine.sell_item(plates, 5).unwrap();
        assert_eq!(receipt.sold, 3);
        assert_eq!(receipt.revenue, sale_revenue(price, 3));
        assert_eq!(engine.balance(), before + receipt.revenue);
        assert_eq!(engine.ledger().quantity(plates), 0);
        assert_eq!(engine.ledger().stats().items_sold, 3);
    }

    #[test]
    fn sell_item_zero_amount_is_invalid() {
        let mut engine = test_engine(1);
        let plates = steel_plates(engine.catalog());
        let err = engine.sell_item(plates, 0).unwrap_err();
        assert_eq!(err, CommandError::InvalidAmount { requested: 0 });
    }

    #[test]
    fn sell_item_untraded_is_noop() {
        let mut engine = test_engine(1);
        let steel = raw_steel(engine.catalog());
        let _ = engine.ledger_mut().store(steel, 10);

        let receipt = engine.sell_item(steel, 10).unwrap();
        assert!(receipt.is_noop());
        assert_eq!(engine.ledger().quantity(steel), 10);
        assert_eq!(engine.balance(), 1000);
    }

    #[test]
    fn sell_item_nothing_on_hand_is_noop() {
        let mut engine = test_engine(1);
        let plates = steel_plates(engine.catalog());
        let receipt = engine.sell_item(plates, 5).unwrap();
        assert!(receipt.is_noop());
    }

    #[test]
    fn sell_item_unknown_item() {
        let mut engine = test_engine(1);
        let err = engine.sell_item(ItemId(999), 1).unwrap_err();
        assert_eq!(
            err,
            CommandError::InvalidReference {
                kind: EntityKind::Item
            }
        );
    }

    #[test]
    fn sell_all_batches_every_traded_item() {
        let mut engine = test_engine(1);
        let plates = steel_plates(engine.catalog());
        let wire = copper_wire(engine.catalog());
        let steel = raw_steel(engine.catalog());
        let _ = engine.ledger_mut().store(plates, 4);
        let _ = engine.ledger_mut().store(wire, 7);
        let _ = engine.ledger_mut().store(steel, 9);

        let plate_price = engine.market().price(plates).unwrap().current;
        let wire_price = engine.market().price(wire).unwrap().current;
        let before = engine.balance();

        let receipt = engine.sell_all();
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.items_sold, 11);
        assert_eq!(
            receipt.total_revenue,
            sale_revenue(plate_price, 4) + sale_revenue(wire_price, 7)
        );
        assert_eq!(engine.balance(), before + receipt.total_revenue);
        assert_eq!(engine.ledger().stats().items_sold, 11);
        assert_eq!(engine.ledger().stats().money_earned, receipt.total_revenue);
        // The untraded raw material stays put.
        assert_eq!(engine.ledger().quantity(steel), 9);
    }

    #[test]
    fn sell_all_with_nothing_is_empty() {
        let mut engine = test_engine(1);
        let before = engine.balance();
        let receipt = engine.sell_all();
        assert!(receipt.lines.is_empty());
        assert_eq!(receipt.total_revenue, 0);
        assert_eq!(engine.balance(), before);
    }

    // -----------------------------------------------------------------------
    // Reset
    // -----------------------------------------------------------------------

    #[test]
    fn reset_restores_fresh_state() {
        let mut engine = test_engine(1);
        let wid = main_warehouse(&engine);
        let generator = steel_generator(engine.catalog());
        engine.purchase_machine(generator, wid).unwrap();
        engine.advance(fixed(5.0));
        engine.update_prices();

        engine.reset(2);
        assert_eq!(engine.balance(), 1000);
        assert_eq!(engine.fleet().machine_count(), 0);
        assert_eq!(engine.fleet().warehouse_count(), 1);
        assert_eq!(engine.ticks(), 0);
        assert_eq!(engine.ledger().total_stored(), 0);
        let plates = steel_plates(engine.catalog());
        let record = engine.market().price(plates).unwrap();
        assert_eq!(record.current, record.base);
    }
}
