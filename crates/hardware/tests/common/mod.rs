/// Simulated-platform test context.
pub mod harness;

/// Register-access and hart doubles.
pub mod mocks;
