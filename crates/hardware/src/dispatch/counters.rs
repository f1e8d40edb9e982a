//! Per-hart test counters.
//!
//! Handlers running in trap context on a hart write that hart's counters; the
//! sequencer on the same hart polls them between `relax` steps.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counters kept for every hart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Counter {
    /// External interrupt traps handled.
    External,
    /// Software interrupt traps handled.
    Software,
    /// Timer interrupt traps handled.
    Timer,
    /// Last ACCRUED value captured by a bus-error handler.
    BusErrorValue,
    /// Invocations of the set-pending-by-number handler.
    SetPendingMarker,
    /// Claims that returned identity 0.
    SpuriousClaim,
    /// Claims that re-appeared immediately after dispatch.
    RepeatedClaim,
}

impl Counter {
    /// Every counter, in storage order.
    pub const ALL: [Self; 7] = [
        Self::External,
        Self::Software,
        Self::Timer,
        Self::BusErrorValue,
        Self::SetPendingMarker,
        Self::SpuriousClaim,
        Self::RepeatedClaim,
    ];

    const fn index(self) -> usize {
        self as usize
    }
}

/// One hart's counters.
#[derive(Debug, Default)]
pub struct HartCounters {
    slots: [AtomicU32; Counter::ALL.len()],
}

impl HartCounters {
    /// Creates a zeroed counter block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `counter`.
    #[inline]
    pub fn get(&self, counter: Counter) -> u32 {
        self.slots[counter.index()].load(Ordering::Acquire)
    }

    /// Adds one to `counter`.
    #[inline]
    pub fn increment(&self, counter: Counter) {
        self.add(counter, 1);
    }

    /// Adds `n` to `counter`, wrapping on overflow.
    #[inline]
    pub fn add(&self, counter: Counter, n: u32) {
        let slot = &self.slots[counter.index()];
        let mut current = slot.load(Ordering::Acquire);
        while let Err(seen) = slot.compare_exchange_weak(
            current,
            current.wrapping_add(n),
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            current = seen;
        }
    }

    /// Overwrites `counter`.
    #[inline]
    pub fn store(&self, counter: Counter, value: u32) {
        self.slots[counter.index()].store(value, Ordering::Release);
    }

    /// Zeroes `counter`.
    #[inline]
    pub fn reset(&self, counter: Counter) {
        self.store(counter, 0);
    }

    /// Copies every counter, in [`Counter::ALL`] order.
    pub fn snapshot(&self) -> [u32; Counter::ALL.len()] {
        Counter::ALL.map(|c| self.get(c))
    }
}

/// Counter blocks for every hart on the platform.
#[derive(Debug, Clone)]
pub struct CounterBank {
    harts: Vec<Arc<HartCounters>>,
}

impl CounterBank {
    /// Creates zeroed counters for `num_harts` harts.
    pub fn new(num_harts: usize) -> Self {
        Self {
            harts: (0..num_harts).map(|_| Arc::new(HartCounters::new())).collect(),
        }
    }

    /// Counters of `hart`, if it exists.
    pub fn hart(&self, hart: usize) -> Option<&Arc<HartCounters>> {
        self.harts.get(hart)
    }

    /// Number of harts covered.
    pub fn len(&self) -> usize {
        self.harts.len()
    }

    /// Returns `true` if the bank covers no harts.
    pub fn is_empty(&self) -> bool {
        self.harts.is_empty()
    }
}
