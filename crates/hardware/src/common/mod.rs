//! Common utilities and types used throughout the harness.
//!
//! This module provides building blocks shared by the drivers, the dispatch engine,
//! and the simulated controller. It includes:
//! 1. **Error Handling:** Controller, dispatch, fatal-trap, and scenario error types.
//! 2. **Source Bitmaps:** The single word/bit mapping used for every pending and enable bitmap.

/// Source bitmap addressing (word index and bit mask for an interrupt id).
pub mod bitmap;

/// Error types for configuration, dispatch, traps, and scenarios.
pub mod error;

pub use bitmap::SourceBit;
pub use error::{AplicError, DispatchError, FatalTrap, HarnessError};
