/// Claim/dispatch engine drains.
pub mod engine;

/// Handler table installation and lookup.
pub mod handler_table;
