/// APLIC source configuration: validation, register order, idempotence.
pub mod aplic_config;


/// Bus-error unit driver and bridge.
pub mod beu;

/// CLINT driver.
pub mod clint;
