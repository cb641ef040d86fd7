//! Fixed-period tick scheduling, decoupled from any real timer.
//!
//! The engine never owns a clock. An external driver (a real interval timer
//! in production, a manual stepper in tests) feeds elapsed wall time into a
//! [`TickDriver`], which answers how many production ticks and price
//! updates are due. Remainders carry between calls, so periods that don't
//! divide the elapsed time evenly lose nothing.

use crate::catalog::EngineSettings;
use crate::fixed::Fixed64;

/// Upper bound on ticks released by a single `advance` call. Elapsed time
/// beyond the cap is discarded, so a long-suspended driver catches up with
/// one bounded burst instead of an unbounded replay.
pub const MAX_CATCH_UP_TICKS: u32 = 600;

/// What an `advance` call released.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DueTicks {
    pub production_ticks: u32,
    pub price_updates: u32,
}

/// Accumulates elapsed time against the two fixed periods.
#[derive(Debug, Clone)]
pub struct TickDriver {
    production_period: Fixed64,
    price_period: Fixed64,
    production_acc: Fixed64,
    price_acc: Fixed64,
}

impl TickDriver {
    pub fn new(settings: &EngineSettings) -> Self {
        Self {
            production_period: settings.production_tick_seconds,
            price_period: settings.price_update_seconds,
            production_acc: Fixed64::ZERO,
            price_acc: Fixed64::ZERO,
        }
    }

    /// The production tick period, in seconds. Pass this as the delta for
    /// each released production tick.
    pub fn production_period(&self) -> Fixed64 {
        self.production_period
    }

    /// Feed elapsed seconds; get the ticks now due.
    pub fn advance(&mut self, elapsed_seconds: Fixed64) -> DueTicks {
        if elapsed_seconds <= Fixed64::ZERO {
            return DueTicks::default();
        }
        self.production_acc += elapsed_seconds;
        self.price_acc += elapsed_seconds;

        let production_ticks = drain(&mut self.production_acc, self.production_period);
        let price_updates = drain(&mut self.price_acc, self.price_period);
        DueTicks {
            production_ticks,
            price_updates,
        }
    }

    /// Zero both accumulators. Must accompany an engine reset: a carried
    /// accumulator would immediately fire ticks into the fresh state.
    pub fn reset(&mut self) {
        self.production_acc = Fixed64::ZERO;
        self.price_acc = Fixed64::ZERO;
    }
}

fn drain(acc: &mut Fixed64, period: Fixed64) -> u32 {
    let due: i64 = (*acc / period).to_num();
    let due = due.clamp(0, MAX_CATCH_UP_TICKS as i64) as u32;
    *acc -= period * Fixed64::from_num(due);
    // Past the cap, drop the backlog entirely.
    if due == MAX_CATCH_UP_TICKS && *acc > period {
        *acc = Fixed64::ZERO;
    }
    due
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EngineSettings;

    fn fixed(v: f64) -> Fixed64 {
        Fixed64::from_num(v)
    }

    fn driver() -> TickDriver {
        // Defaults: production every 1s, prices every 5s.
        TickDriver::new(&EngineSettings::default())
    }

    #[test]
    fn nothing_due_before_a_full_period() {
        let mut driver = driver();
        assert_eq!(driver.advance(fixed(0.4)), DueTicks::default());
        assert_eq!(driver.advance(fixed(0.4)), DueTicks::default());
    }

    #[test]
    fn remainder_carries_between_calls() {
        let mut driver = driver();
        let _ = driver.advance(fixed(0.6));
        let due = driver.advance(fixed(0.6));
        assert_eq!(due.production_ticks, 1);
    }

    #[test]
    fn price_updates_fire_on_the_slower_period() {
        let mut driver = driver();
        let due = driver.advance(fixed(4.9));
        assert_eq!(due.production_ticks, 4);
        assert_eq!(due.price_updates, 0);

        let due = driver.advance(fixed(0.1));
        assert_eq!(due.production_ticks, 1);
        assert_eq!(due.price_updates, 1);
    }

    #[test]
    fn long_suspension_releases_a_burst() {
        let mut driver = driver();
        let due = driver.advance(fixed(60.0));
        assert_eq!(due.production_ticks, 60);
        assert_eq!(due.price_updates, 12);
    }

    #[test]
    fn catch_up_is_capped() {
        let mut driver = driver();
        let due = driver.advance(fixed(100_000.0));
        assert_eq!(due.production_ticks, MAX_CATCH_UP_TICKS);
        // The discarded backlog does not reappear later.
        let due = driver.advance(fixed(1.0));
        assert_eq!(due.production_ticks, 1);
    }

    #[test]
    fn negative_elapsed_is_ignored() {
        let mut driver = driver();
        assert_eq!(driver.advance(fixed(-5.0)), DueTicks::default());
    }

    #[test]
    fn reset_clears_pending_time() {
        let mut driver = driver();
        let _ = driver.advance(fixed(0.9));
        driver.reset();
        assert_eq!(driver.advance(fixed(0.2)), DueTicks::default());
    }
}
