//! # Unit Components
//!
//! Tests for each layer of the harness, from register-level drivers up to
//! complete scenario runs on the simulated platform.


/// Handler table and the claim/dispatch engine.
pub mod dispatch;

/// APLIC, CLINT, and bus-error unit drivers.
pub mod drivers;


/// Simulated platform devices and harts.
pub mod soc;

/// Trap vector decoding and the major-interrupt handlers.
pub mod trap;
