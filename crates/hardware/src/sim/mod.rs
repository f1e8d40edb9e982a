//! Host simulation of the harness.
//!
//! Builds the simulated platform from a [`Config`](crate::config::Config), gives
//! every hart its own thread, and runs the scenarios on the boot hart.

/// Simulator that owns the platform, the harts, and the shared trap vector.
pub mod simulator;

pub use simulator::{SimBus, Simulator};
