//! APLIC register map (direct delivery mode).
//!
//! Offsets are relative to the domain base. Per-source registers are indexed from
//! source 1; per-hart delivery control blocks start at the configurable IDC offset.

/// Domain configuration register.
pub const DOMAINCFG: u64 = 0x0000;

/// Interrupt enable bit of `domaincfg`.
pub const DOMAINCFG_IE: u32 = 1 << 8;

/// Read-only bits `domaincfg` reports above the writable fields.
pub const DOMAINCFG_READ_ONLY: u32 = 0x8000_0000;

/// Source configuration array (`sourcecfg[1]`).
pub const SOURCECFG_BASE: u64 = 0x0004;

/// Delegate bit of `sourcecfg`.
pub const SOURCECFG_D: u32 = 1 << 10;

/// Source mode field of `sourcecfg`.
pub const SOURCECFG_SM_MASK: u32 = 0x7;

/// Child domain index field of a delegated `sourcecfg`.
pub const SOURCECFG_CHILD_MASK: u32 = 0x3FF;

/// Pending bitmap, one bit per source (read / write-1-to-set).
pub const SETIP_BASE: u64 = 0x1C00;

/// Set one pending bit by source number.
pub const SETIPNUM: u64 = 0x1CDC;

/// Rectified input bitmap on read, write-1-to-clear pending on write.
pub const IN_CLRIP_BASE: u64 = 0x1D00;

/// Clear one pending bit by source number.
pub const CLRIPNUM: u64 = 0x1DDC;

/// Enable bitmap, one bit per source (read / write-1-to-set).
pub const SETIE_BASE: u64 = 0x1E00;

/// Set one enable bit by source number.
pub const SETIENUM: u64 = 0x1EDC;

/// Write-1-to-clear enable bitmap.
pub const CLRIE_BASE: u64 = 0x1F00;

/// Clear one enable bit by source number.
pub const CLRIENUM: u64 = 0x1FDC;

/// Set one pending bit by source number, little-endian.
pub const SETIPNUM_LE: u64 = 0x2000;

/// Set one pending bit by source number, big-endian.
pub const SETIPNUM_BE: u64 = 0x2004;

/// Target array (`target[1]`).
pub const TARGET_BASE: u64 = 0x3004;

/// Hart index field position in `target`.
pub const TARGET_HART_SHIFT: u32 = 18;

/// Hart index field width mask (after shifting).
pub const TARGET_HART_MASK: u32 = 0x3FFF;

/// Priority field of `target`.
pub const TARGET_PRIO_MASK: u32 = 0xFF;

/// Size of one interrupt delivery control block.
pub const IDC_STRIDE: u64 = 0x20;

/// Enables delivery from the domain to the hart.
pub const IDELIVERY: u64 = 0x00;

/// Forces an interrupt with identity 0.
pub const IFORCE: u64 = 0x04;

/// Priority threshold.
pub const ITHRESHOLD: u64 = 0x08;

/// Highest-priority eligible pending interrupt (read-only).
pub const TOPI: u64 = 0x18;

/// Same as `topi`; reading claims the interrupt.
pub const CLAIMI: u64 = 0x1C;

/// Identity field position in `topi`/`claimi`.
pub const TOPI_ID_SHIFT: u32 = 16;

/// Identity field width mask (after shifting).
pub const TOPI_ID_MASK: u32 = 0x3FF;

/// Priority field of `topi`/`claimi`.
pub const TOPI_PRIO_MASK: u32 = 0xFF;

/// Largest number of sources a domain can implement.
pub const MAX_SOURCES: u32 = 1023;

/// Byte offset of `sourcecfg[id]`.
#[inline]
pub const fn sourcecfg(id: u32) -> u64 {
    SOURCECFG_BASE + 4 * (id as u64 - 1)
}

/// Byte offset of `target[id]`.
#[inline]
pub const fn target(id: u32) -> u64 {
    TARGET_BASE + 4 * (id as u64 - 1)
}

/// Packs a `target` value for direct delivery mode.
#[inline]
pub const fn target_value(hart: usize, priority: u8) -> u32 {
    ((hart as u32 & TARGET_HART_MASK) << TARGET_HART_SHIFT) | priority as u32
}
