//! Source trigger modes and privilege routing.

use crate::common::AplicError;
use crate::drivers::aplic::regs::SOURCECFG_D;

/// Source mode of a `sourcecfg` register.
///
/// Raw values 2 and 3 are reserved by the architecture and rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TriggerMode {
    /// Source is not active in this domain.
    Inactive = 0,
    /// Active, but the wire is ignored; only software can set pending.
    Detached = 1,
    /// Pending on a low-to-high transition.
    RisingEdge = 4,
    /// Pending on a high-to-low transition.
    FallingEdge = 5,
    /// Pending while the wire is high.
    LevelHigh = 6,
    /// Pending while the wire is low.
    LevelLow = 7,
}

impl TriggerMode {
    /// Raw `sourcecfg.SM` value.
    #[inline]
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Returns `true` for the two edge-sensitive modes.
    #[inline]
    pub const fn is_edge(self) -> bool {
        matches!(self, Self::RisingEdge | Self::FallingEdge)
    }

    /// Returns `true` for the two level-sensitive modes.
    #[inline]
    pub const fn is_level(self) -> bool {
        matches!(self, Self::LevelHigh | Self::LevelLow)
    }

    /// Returns `true` if the wire is inverted before edge/level detection.
    #[inline]
    pub const fn is_active_low(self) -> bool {
        matches!(self, Self::FallingEdge | Self::LevelLow)
    }

    /// Returns `true` if the source participates in this domain.
    #[inline]
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Inactive)
    }
}

impl TryFrom<u32> for TriggerMode {
    type Error = AplicError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(Self::Inactive),
            1 => Ok(Self::Detached),
            4 => Ok(Self::RisingEdge),
            5 => Ok(Self::FallingEdge),
            6 => Ok(Self::LevelHigh),
            7 => Ok(Self::LevelLow),
            _ => Err(AplicError::InvalidTriggerMode(raw)),
        }
    }
}

/// Privilege level that services a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Privilege {
    /// Handled in this (machine-level) domain.
    #[default]
    Machine,
    /// Delegated to the supervisor-level child domain.
    ///
    /// A delegated source is inactive in this domain: its enable and pending bits
    /// read as zero here, and interrupts are signalled through `mip.SEIP`.
    Supervisor,
}

impl Privilege {
    /// `sourcecfg` bits contributed by this routing choice.
    #[inline]
    pub const fn sourcecfg_bits(self) -> u32 {
        match self {
            Self::Machine => 0,
            Self::Supervisor => SOURCECFG_D,
        }
    }
}
