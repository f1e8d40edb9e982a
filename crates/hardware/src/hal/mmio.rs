//! Register access seam.
//!
//! Every driver in this crate is generic over [`RegisterAccess`]. Addresses are
//! absolute physical addresses; drivers add their own base. Accesses take `&self`
//! because device registers are shared by every hart and have their own side effects.

use std::sync::Arc;

/// Sized reads and writes of device registers.
pub trait RegisterAccess: Send + Sync {
    /// Reads a byte from `addr`.
    fn read_u8(&self, addr: u64) -> u8;

    /// Reads a half-word from `addr`.
    fn read_u16(&self, addr: u64) -> u16;

    /// Reads a word from `addr`.
    fn read_u32(&self, addr: u64) -> u32;

    /// Reads a double-word from `addr`.
    fn read_u64(&self, addr: u64) -> u64;

    /// Writes a byte to `addr`.
    fn write_u8(&self, addr: u64, val: u8);

    /// Writes a half-word to `addr`.
    fn write_u16(&self, addr: u64, val: u16);

    /// Writes a word to `addr`.
    fn write_u32(&self, addr: u64, val: u32);

    /// Writes a double-word to `addr`.
    fn write_u64(&self, addr: u64, val: u64);
}

macro_rules! forward_register_access {
    ($($ty:ty),* $(,)?) => {
        $(
            impl<T: RegisterAccess + ?Sized> RegisterAccess for $ty {
                #[inline]
                fn read_u8(&self, addr: u64) -> u8 {
                    (**self).read_u8(addr)
                }
                #[inline]
                fn read_u16(&self, addr: u64) -> u16 {
                    (**self).read_u16(addr)
                }
                #[inline]
                fn read_u32(&self, addr: u64) -> u32 {
                    (**self).read_u32(addr)
                }
                #[inline]
                fn read_u64(&self, addr: u64) -> u64 {
                    (**self).read_u64(addr)
                }
                #[inline]
                fn write_u8(&self, addr: u64, val: u8) {
                    (**self).write_u8(addr, val);
                }
                #[inline]
                fn write_u16(&self, addr: u64, val: u16) {
                    (**self).write_u16(addr, val);
                }
                #[inline]
                fn write_u32(&self, addr: u64, val: u32) {
                    (**self).write_u32(addr, val);
                }
                #[inline]
                fn write_u64(&self, addr: u64, val: u64) {
                    (**self).write_u64(addr, val);
                }
            }
        )*
    };
}

forward_register_access!(&T, Arc<T>, Box<T>);
