//! Interrupt dispatch.
//!
//! This module turns a machine external interrupt into handler invocations. It provides:
//! 1. **Handler Table:** A fixed arena of handlers indexed by source id, never empty.
//! 2. **Counters:** Per-hart atomic counters written by handlers and read by the sequencer.
//! 3. **Claim Engine:** The claim, dispatch, re-check loop run once per external trap.

/// Per-hart test counters.
pub mod counters;

/// Claim/dispatch engine.
pub mod engine;

/// Handler trait and handler table.
pub mod handler;

pub use counters::{Counter, CounterBank, HartCounters};
pub use engine::{ClaimEngine, DrainReport};
pub use handler::{DefaultHandler, HandlerTable, InterruptHandler};
