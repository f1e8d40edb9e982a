//! Control and Status Register (CSR) definitions.
//!
//! Only the machine-mode registers involved in trap entry, interrupt enabling, and
//! interrupt pending are listed. It provides:
//! 1. **Address Definitions:** CSR numbers accepted by `Hart::read_csr` and friends.
//! 2. **Field Masks:** `mstatus`, `mie`, and `mip` bits for the three major interrupts.

/// Machine hardware thread ID CSR address.
pub const MHARTID: u32 = 0xF14;

/// Machine status register CSR address.
pub const MSTATUS: u32 = 0x300;

/// Machine interrupt enable register CSR address.
pub const MIE: u32 = 0x304;

/// Machine trap vector base address register CSR address.
pub const MTVEC: u32 = 0x305;

/// Machine scratch register CSR address.
pub const MSCRATCH: u32 = 0x340;

/// Machine exception program counter CSR address.
pub const MEPC: u32 = 0x341;

/// Machine cause register CSR address.
pub const MCAUSE: u32 = 0x342;

/// Machine trap value register CSR address.
pub const MTVAL: u32 = 0x343;

/// Machine interrupt pending register CSR address.
pub const MIP: u32 = 0x344;

/// Machine global interrupt enable bit in `mstatus`.
pub const MSTATUS_MIE: u64 = 1 << 3;

/// Machine previous interrupt enable bit in `mstatus`.
pub const MSTATUS_MPIE: u64 = 1 << 7;

/// Machine software interrupt enable bit in `mie`.
pub const MIE_MSIP: u64 = 1 << 3;

/// Machine timer interrupt enable bit in `mie`.
pub const MIE_MTIE: u64 = 1 << 7;

/// Supervisor external interrupt enable bit in `mie`.
pub const MIE_SEIP: u64 = 1 << 9;

/// Machine external interrupt enable bit in `mie`.
pub const MIE_MEIP: u64 = 1 << 11;

/// Machine software interrupt pending bit in `mip`.
pub const MIP_MSIP: u64 = 1 << 3;

/// Machine timer interrupt pending bit in `mip`.
pub const MIP_MTIP: u64 = 1 << 7;

/// Supervisor external interrupt pending bit in `mip`.
pub const MIP_SEIP: u64 = 1 << 9;

/// Machine external interrupt pending bit in `mip`.
pub const MIP_MEIP: u64 = 1 << 11;

/// Direct mode in the low bits of `mtvec`: every trap enters at the base address.
pub const MTVEC_MODE_DIRECT: u64 = 0;

/// Mask for the mode field of `mtvec`.
pub const MTVEC_MODE_MASK: u64 = 0b11;
