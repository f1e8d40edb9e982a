//! Bounded busy-waiting.

use crate::common::FatalTrap;
use crate::hal::Hart;

/// How a bounded wait ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The predicate held after `spins` relax steps.
    Satisfied {
        /// Relax steps taken before the predicate held.
        spins: u32,
    },
    /// The budget ran out first.
    TimedOut,
}

impl WaitOutcome {
    /// Returns `true` if the predicate held.
    pub const fn is_satisfied(self) -> bool {
        matches!(self, Self::Satisfied { .. })
    }
}

/// A busy-wait with an explicit iteration budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundedWait {
    budget: u32,
}

impl BoundedWait {
    /// Creates a wait allowing `budget` relax steps.
    pub const fn new(budget: u32) -> Self {
        Self { budget }
    }

    /// Relaxes `hart` until `done` holds or the budget is spent.
    ///
    /// The predicate is checked before every step, so an already-satisfied
    /// condition costs no steps.
    pub fn spin_until(
        self,
        hart: &dyn Hart,
        mut done: impl FnMut() -> bool,
    ) -> Result<WaitOutcome, FatalTrap> {
        for spins in 0..self.budget {
            if done() {
                return Ok(WaitOutcome::Satisfied { spins });
            }
            hart.relax()?;
        }
        Ok(if done() {
            WaitOutcome::Satisfied { spins: self.budget }
        } else {
            WaitOutcome::TimedOut
        })
    }

    /// Relaxes `hart` for the whole budget.
    pub fn settle(self, hart: &dyn Hart) -> Result<(), FatalTrap> {
        for _ in 0..self.budget {
            hart.relax()?;
        }
        Ok(())
    }
}
