//! Configuration system for the interrupt harness.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline platform constants (memory map, source count, wait budgets).
//! 2. **Structures:** Hierarchical config for the platform, the scenario harness, and bus-error units.
//! 3. **Loading:** JSON deserialization from a string or a file, followed by validation.
//!
//! Every field may be omitted from JSON; missing fields take the values in `defaults`.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::drivers::aplic::regs::MAX_SOURCES;
use crate::drivers::beu::ErrorClass;

/// Default configuration constants for the harness.
///
/// These values describe a SiFive-style platform with a single bring-up hart.
mod defaults {
    use crate::drivers::beu::ErrorClass;

    /// Base address of the APLIC machine-level domain.
    pub const APLIC_BASE: u64 = 0x0C00_0000;

    /// Offset of the first interrupt delivery control (IDC) block inside the domain.
    pub const APLIC_IDC_OFFSET: u64 = 0x4000;

    /// Number of platform-level (global) interrupt lines.
    pub const GLOBAL_INTERRUPTS: u32 = 127;

    /// Extra source ids reserved beyond the global lines for internal devices.
    pub const INTERNAL_INTERRUPTS: u32 = 12;

    /// Number of implemented sources (ids `1..=NUM_SOURCES`).
    pub const NUM_SOURCES: u32 = GLOBAL_INTERRUPTS + INTERNAL_INTERRUPTS;

    /// Base address of the CLINT.
    pub const CLINT_BASE: u64 = 0x0200_0000;

    /// CLINT timer divider (mtime increments every N bus ticks).
    pub const CLINT_DIVIDER: u64 = 1;

    /// Number of harts.
    pub const NUM_HARTS: usize = 1;

    /// Hart that performs global configuration and runs the scenarios.
    pub const BOOT_HART: usize = 0;

    /// Wait budget for software and timer interrupts.
    pub const WAIT_BUDGET: u32 = 0xFFFF;

    /// Wait budget for interrupts routed through the APLIC.
    pub const EXTERNAL_WAIT_BUDGET: u32 = 0xF_FFFF;

    /// Repetitions of the software and timer scenarios.
    pub const ITERATIONS: u32 = 5;

    /// Extra relax iterations after delivery, used to catch redelivery.
    pub const SETTLE_ITERATIONS: u32 = 256;

    /// Delivery threshold written to `ithreshold` (0 admits every priority).
    pub const PRIORITY_THRESHOLD: u8 = 0;

    /// Priority given to the sources configured by the scenarios.
    pub const SOURCE_PRIORITY: u8 = 2;

    /// Source used for the set-pending-by-number scenario.
    pub const SET_PENDING_ID: u32 = 21;

    /// Lower-urgency source of the priority drain scenario.
    pub const DRAIN_LOW_ID: u32 = 22;

    /// Priority of the lower-urgency drain source.
    pub const DRAIN_LOW_PRIORITY: u8 = 2;

    /// Higher-urgency source of the priority drain scenario.
    pub const DRAIN_HIGH_ID: u32 = 23;

    /// Priority of the higher-urgency drain source.
    pub const DRAIN_HIGH_PRIORITY: u8 = 1;

    /// Consecutive identical claims tolerated in one trap before giving up.
    pub const MAX_CLAIM_REPEATS: u32 = 16;

    /// Base address of the first bus-error unit.
    pub const BEU_BASE: u64 = 0x0170_0000;

    /// Address stride between consecutive bus-error units.
    pub const BEU_STRIDE: u64 = 0x1000;

    /// Source id wired to the first bus-error unit.
    pub const BEU_FIRST_SOURCE: u32 = 130;

    /// Number of bus-error units.
    pub const BEU_COUNT: u32 = 4;

    /// Error classes that raise the platform interrupt.
    pub const WATCH_MASK: u32 =
        ErrorClass::DCACHE_CORRECTABLE.bits() | ErrorClass::ICACHE_ITIM_CORRECTABLE.bits();

    /// Error class injected by the bus-error scenario.
    pub const SIMULATED_ERROR: u32 = ErrorClass::DCACHE_CORRECTABLE.bits();
}

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed to load.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration is not valid JSON for this schema.
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configuration parsed but describes an impossible platform.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
///
/// # Examples
///
/// ```
/// use aplic_core::config::Config;
///
/// let config = Config::default();
/// assert_eq!(config.platform.num_sources, 139);
/// assert_eq!(config.harness.set_pending_id, 21);
/// ```
///
/// Deserializing a partial override from JSON:
///
/// ```
/// use aplic_core::config::Config;
///
/// let config = Config::from_json_str(r#"{ "platform": { "num_harts": 4 } }"#).unwrap();
/// assert_eq!(config.platform.num_harts, 4);
/// assert_eq!(config.platform.aplic_base, 0x0C00_0000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Platform memory map and topology.
    #[serde(default)]
    pub platform: PlatformConfig,
    /// Scenario budgets and source assignments.
    #[serde(default)]
    pub harness: HarnessConfig,
    /// Bus-error units and masks.
    #[serde(default)]
    pub bus_error: BusErrorConfig,
}

impl Config {
    /// Parses and validates a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.platform;
        let h = &self.harness;

        if p.num_sources == 0 || p.num_sources > MAX_SOURCES {
            return Err(invalid(format!(
                "num_sources must be in 1..={MAX_SOURCES}, got {}",
                p.num_sources
            )));
        }
        if p.num_harts == 0 {
            return Err(invalid("num_harts must be at least 1".into()));
        }
        if p.boot_hart >= p.num_harts {
            return Err(invalid(format!(
                "boot_hart {} is not below num_harts {}",
                p.boot_hart, p.num_harts
            )));
        }
        if p.aplic_idc_offset < APLIC_MIN_IDC_OFFSET {
            return Err(invalid(format!(
                "aplic_idc_offset {:#x} overlaps the domain registers",
                p.aplic_idc_offset
            )));
        }

        let scenario_ids = [
            ("set_pending_id", h.set_pending_id),
            ("drain.low_id", h.drain.low_id),
            ("drain.high_id", h.drain.high_id),
        ];
        for (name, id) in scenario_ids {
            p.check_source(name, id)?;
        }
        if h.drain.low_id == h.drain.high_id {
            return Err(invalid("drain sources must be distinct".into()));
        }
        if h.set_pending_id == h.drain.low_id || h.set_pending_id == h.drain.high_id {
            return Err(invalid(format!(
                "set_pending_id {} is also a drain source",
                h.set_pending_id
            )));
        }

        for (i, unit) in self.bus_error.units.iter().enumerate() {
            p.check_source(&format!("bus_error.units[{i}].source_id"), unit.source_id)?;
            if scenario_ids.iter().any(|&(_, id)| id == unit.source_id) {
                return Err(invalid(format!(
                    "bus-error source {} collides with a scenario source",
                    unit.source_id
                )));
            }
        }
        if ErrorClass::from_bits(self.bus_error.watch_mask).is_none() {
            return Err(invalid(format!(
                "watch_mask {:#x} names unknown error classes",
                self.bus_error.watch_mask
            )));
        }
        Ok(())
    }
}

/// Smallest IDC offset that leaves room for the `target` array.
const APLIC_MIN_IDC_OFFSET: u64 = 0x4000;

fn invalid(msg: String) -> ConfigError {
    ConfigError::Invalid(msg)
}

/// Platform memory map and topology.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    /// APLIC domain base address
    #[serde(default = "PlatformConfig::default_aplic_base")]
    pub aplic_base: u64,
    /// Offset of the IDC array inside the APLIC domain
    #[serde(default = "PlatformConfig::default_aplic_idc_offset")]
    pub aplic_idc_offset: u64,
    /// Number of implemented interrupt sources
    #[serde(default = "PlatformConfig::default_num_sources")]
    pub num_sources: u32,
    /// CLINT base address
    #[serde(default = "PlatformConfig::default_clint_base")]
    pub clint_base: u64,
    /// CLINT timer divider (mtime increments every N bus ticks)
    #[serde(default = "PlatformConfig::default_clint_divider")]
    pub clint_divider: u64,
    /// Number of harts
    #[serde(default = "PlatformConfig::default_num_harts")]
    pub num_harts: usize,
    /// Hart performing global configuration
    #[serde(default = "PlatformConfig::default_boot_hart")]
    pub boot_hart: usize,
}

impl PlatformConfig {
    /// Returns the default APLIC base address.
    fn default_aplic_base() -> u64 {
        defaults::APLIC_BASE
    }

    /// Returns the default IDC offset.
    fn default_aplic_idc_offset() -> u64 {
        defaults::APLIC_IDC_OFFSET
    }

    /// Returns the default number of sources.
    fn default_num_sources() -> u32 {
        defaults::NUM_SOURCES
    }

    /// Returns the default CLINT base address.
    fn default_clint_base() -> u64 {
        defaults::CLINT_BASE
    }

    /// Returns the default CLINT timer divider.
    fn default_clint_divider() -> u64 {
        defaults::CLINT_DIVIDER
    }

    /// Returns the default hart count.
    fn default_num_harts() -> usize {
        defaults::NUM_HARTS
    }

    /// Returns the default boot hart.
    fn default_boot_hart() -> usize {
        defaults::BOOT_HART
    }

    fn check_source(&self, name: &str, id: u32) -> Result<(), ConfigError> {
        if id == 0 || id > self.num_sources {
            return Err(invalid(format!(
                "{name} = {id} is outside sources 1..={}",
                self.num_sources
            )));
        }
        Ok(())
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            aplic_base: defaults::APLIC_BASE,
            aplic_idc_offset: defaults::APLIC_IDC_OFFSET,
            num_sources: defaults::NUM_SOURCES,
            clint_base: defaults::CLINT_BASE,
            clint_divider: defaults::CLINT_DIVIDER,
            num_harts: defaults::NUM_HARTS,
            boot_hart: defaults::BOOT_HART,
        }
    }
}

/// Source pair used by the priority drain scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DrainConfig {
    /// Source expected to be dispatched second
    #[serde(default = "DrainConfig::default_low_id")]
    pub low_id: u32,
    /// Its priority (numerically larger)
    #[serde(default = "DrainConfig::default_low_priority")]
    pub low_priority: u8,
    /// Source expected to be dispatched first
    #[serde(default = "DrainConfig::default_high_id")]
    pub high_id: u32,
    /// Its priority (numerically smaller)
    #[serde(default = "DrainConfig::default_high_priority")]
    pub high_priority: u8,
}

impl DrainConfig {
    fn default_low_id() -> u32 {
        defaults::DRAIN_LOW_ID
    }

    fn default_low_priority() -> u8 {
        defaults::DRAIN_LOW_PRIORITY
    }

    fn default_high_id() -> u32 {
        defaults::DRAIN_HIGH_ID
    }

    fn default_high_priority() -> u8 {
        defaults::DRAIN_HIGH_PRIORITY
    }
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            low_id: defaults::DRAIN_LOW_ID,
            low_priority: defaults::DRAIN_LOW_PRIORITY,
            high_id: defaults::DRAIN_HIGH_ID,
            high_priority: defaults::DRAIN_HIGH_PRIORITY,
        }
    }
}

/// Scenario budgets and source assignments.
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessConfig {
    /// Relax iterations allowed for software and timer delivery
    #[serde(default = "HarnessConfig::default_wait_budget")]
    pub wait_budget: u32,
    /// Relax iterations allowed for delivery through the APLIC
    #[serde(default = "HarnessConfig::default_external_wait_budget")]
    pub external_wait_budget: u32,
    /// Repetitions of the software and timer scenarios
    #[serde(default = "HarnessConfig::default_iterations")]
    pub iterations: u32,
    /// Relax iterations after delivery before the count is checked
    #[serde(default = "HarnessConfig::default_settle_iterations")]
    pub settle_iterations: u32,
    /// Value written to the boot hart's `ithreshold`
    #[serde(default = "HarnessConfig::default_priority_threshold")]
    pub priority_threshold: u8,
    /// Priority given to scenario sources
    #[serde(default = "HarnessConfig::default_source_priority")]
    pub source_priority: u8,
    /// Source used by the set-pending-by-number scenario
    #[serde(default = "HarnessConfig::default_set_pending_id")]
    pub set_pending_id: u32,
    /// Sources used by the priority drain scenario
    #[serde(default)]
    pub drain: DrainConfig,
    /// Consecutive identical claims tolerated in one trap
    #[serde(default = "HarnessConfig::default_max_claim_repeats")]
    pub max_claim_repeats: u32,
}

impl HarnessConfig {
    fn default_wait_budget() -> u32 {
        defaults::WAIT_BUDGET
    }

    fn default_external_wait_budget() -> u32 {
        defaults::EXTERNAL_WAIT_BUDGET
    }

    fn default_iterations() -> u32 {
        defaults::ITERATIONS
    }

    fn default_settle_iterations() -> u32 {
        defaults::SETTLE_ITERATIONS
    }

    fn default_priority_threshold() -> u8 {
        defaults::PRIORITY_THRESHOLD
    }

    fn default_source_priority() -> u8 {
        defaults::SOURCE_PRIORITY
    }

    fn default_set_pending_id() -> u32 {
        defaults::SET_PENDING_ID
    }

    fn default_max_claim_repeats() -> u32 {
        defaults::MAX_CLAIM_REPEATS
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            wait_budget: defaults::WAIT_BUDGET,
            external_wait_budget: defaults::EXTERNAL_WAIT_BUDGET,
            iterations: defaults::ITERATIONS,
            settle_iterations: defaults::SETTLE_ITERATIONS,
            priority_threshold: defaults::PRIORITY_THRESHOLD,
            source_priority: defaults::SOURCE_PRIORITY,
            set_pending_id: defaults::SET_PENDING_ID,
            drain: DrainConfig::default(),
            max_claim_repeats: defaults::MAX_CLAIM_REPEATS,
        }
    }
}

/// One bus-error unit and the APLIC source its platform interrupt drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BusErrorUnitConfig {
    /// MMIO base address
    pub base: u64,
    /// APLIC source id
    pub source_id: u32,
}

/// Bus-error units and the error classes they report.
#[derive(Debug, Clone, Deserialize)]
pub struct BusErrorConfig {
    /// Units present on the platform; empty skips the bus-error scenario
    #[serde(default = "BusErrorConfig::default_units")]
    pub units: Vec<BusErrorUnitConfig>,
    /// Error classes that raise the platform interrupt
    #[serde(default = "BusErrorConfig::default_watch_mask")]
    pub watch_mask: u32,
    /// Error class written to `accrued` by the scenario
    #[serde(default = "BusErrorConfig::default_simulated_error")]
    pub simulated_error: u32,
}

impl BusErrorConfig {
    fn default_units() -> Vec<BusErrorUnitConfig> {
        (0..defaults::BEU_COUNT)
            .map(|i| BusErrorUnitConfig {
                base: defaults::BEU_BASE + defaults::BEU_STRIDE * u64::from(i),
                source_id: defaults::BEU_FIRST_SOURCE + i,
            })
            .collect()
    }

    fn default_watch_mask() -> u32 {
        defaults::WATCH_MASK
    }

    fn default_simulated_error() -> u32 {
        defaults::SIMULATED_ERROR
    }

    /// Watch mask as typed error classes; unknown bits are dropped.
    pub const fn watch_classes(&self) -> ErrorClass {
        ErrorClass::from_bits_truncate(self.watch_mask)
    }
}

impl Default for BusErrorConfig {
    fn default() -> Self {
        Self {
            units: Self::default_units(),
            watch_mask: defaults::WATCH_MASK,
            simulated_error: defaults::SIMULATED_ERROR,
        }
    }
}
