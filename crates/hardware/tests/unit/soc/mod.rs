

/// Bus routing and device interrupt wiring.
pub mod interconnect;

/// Simulated hart trap delivery.
pub mod sim_hart;
