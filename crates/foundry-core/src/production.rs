//! The production cycle algorithm.
//!
//! Machines accumulate fractional progress each tick; whole cycles consume
//! inputs and emit outputs atomically against the global ledger. The
//! leftover fraction after a completed cycle carries over, so craft times
//! that don't divide the tick evenly never drift, and a large delta can
//! complete several cycles at once.
//!
//! A stall (missing inputs or no storage space) is normal steady state, not
//! an error: the machine holds its partial cycle, clamped to 1, and retries
//! on the next tick.

use crate::catalog::RecipeDef;
use crate::fixed::Fixed64;
use crate::ledger::EconomyLedger;
use crate::machine::MachineInstance;

/// What one machine did during an `advance` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Whole production cycles completed.
    pub cycles_completed: u32,
    /// Total items emitted across those cycles.
    pub items_produced: u32,
    /// Whether the machine ended the call stalled with a full cycle held.
    pub stalled: bool,
}

/// Advance one machine by `delta_seconds`.
///
/// Feasibility is rechecked before every cycle: all inputs must be on hand
/// and the full output of the cycle must fit under the storage cap. Either
/// everything for a cycle is applied or nothing is.
///
/// Disabled machines are skipped entirely; their progress stays frozen.
pub fn advance_machine(
    machine: &mut MachineInstance,
    recipe: &RecipeDef,
    ledger: &mut EconomyLedger,
    delta_seconds: Fixed64,
) -> CycleOutcome {
    let mut outcome = CycleOutcome::default();
    if !machine.enabled {
        return outcome;
    }

    let one = Fixed64::from_num(1);
    machine.progress += delta_seconds / recipe.craft_time;

    while machine.progress >= one {
        if !cycle_feasible(recipe, ledger) {
            // Hold the partial cycle; anything beyond one full cycle is lost.
            machine.progress = machine.progress.min(one);
            outcome.stalled = true;
            break;
        }

        for input in &recipe.inputs {
            let removed = ledger.remove(input.item, input.amount);
            debug_assert_eq!(removed, input.amount);
        }
        for output in &recipe.outputs {
            let overflow = ledger.store(output.item, output.amount);
            debug_assert_eq!(overflow, 0);
        }

        let produced = recipe.output_total();
        ledger.record_produced(produced);
        outcome.cycles_completed += 1;
        outcome.items_produced += produced;
        machine.progress -= one;
    }

    outcome
}

fn cycle_feasible(recipe: &RecipeDef, ledger: &EconomyLedger) -> bool {
    recipe
        .inputs
        .iter()
        .all(|input| ledger.quantity(input.item) >= input.amount)
        && ledger.has_space_for(recipe.output_total())
}
