//! RISC-V APLIC interrupt test harness library.
//!
//! This crate configures and exercises an Advanced Platform-Level Interrupt Controller
//! (APLIC) in direct delivery mode, together with the core-local interruptor (CLINT)
//! and optional bus-error units. It provides:
//! 1. **Register access:** The `RegisterAccess` and `Hart` seams the drivers are written against.
//! 2. **Drivers:** APLIC source configuration and delivery control, CLINT, bus-error units.
//! 3. **Dispatch:** The handler table and the claim/dispatch engine run from the trap vector.
//! 4. **Sequencer:** Bounded busy-wait scenarios with pass/fail verdicts.
//! 5. **SoC model:** A simulated APLIC/CLINT/BEU platform so the whole sequence runs on a host.

/// Architectural constants (CSR addresses, interrupt bits, trap causes).
pub mod arch;
/// Common types shared across the crate (errors, source bitmap addressing).
pub mod common;
/// Harness configuration (platform memory map, budgets, bus-error units).
pub mod config;
/// Handler table, per-hart counters, and the claim/dispatch engine.
pub mod dispatch;
/// Memory-mapped device drivers (APLIC, CLINT, bus-error units).
pub mod drivers;
/// Register access layer and hart interfaces consumed by the drivers.
pub mod hal;
/// Test sequencer: scenarios, bounded waits, boot barrier, reports.
pub mod sequencer;
/// Top-level simulator tying the SoC model, harts, and trap vector together.
pub mod sim;
/// Simulated system-on-chip (bus, APLIC/CLINT/BEU devices, harts).
pub mod soc;
/// Trap vector: major interrupt handlers and fatal trap reporting.
pub mod trap;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// APLIC driver; configure sources and control per-hart delivery.
pub use crate::drivers::aplic::Aplic;
/// Simulated platform entry point; construct with `Simulator::new`.
pub use crate::sim::Simulator;
