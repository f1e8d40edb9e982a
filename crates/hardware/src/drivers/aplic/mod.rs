//! APLIC driver for direct delivery mode.
//!
//! This module programs one APLIC interrupt domain. It provides:
//! 1. **Source Configuration:** Trigger mode, privilege routing, target hart and priority, enable.
//! 2. **Pending Control:** Set/clear pending by number and bitmap queries.
//! 3. **Delivery Control:** Per-hart delivery enable, priority threshold, forced interrupts.
//! 4. **Claims:** Reading the top-of-queue view and claiming it.
//!
//! Argument validation happens before any register is touched, so a rejected call
//! leaves the controller exactly as it was.

/// Register offsets and field encodings.
pub mod regs;

/// Trigger modes and privilege routing.
pub mod source;

use tracing::{debug, trace};

use crate::common::{AplicError, SourceBit};
use crate::config::PlatformConfig;
use crate::hal::RegisterAccess;

pub use source::{Privilege, TriggerMode};

/// Identity and priority of an interrupt, as reported by `topi` and `claimi`.
///
/// A raw value of zero means nothing is pending (or, for a claim, a spurious
/// or forced interrupt with identity 0).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClaimView {
    raw: u32,
}

impl ClaimView {
    /// View with no identity and no priority.
    pub const EMPTY: Self = Self { raw: 0 };

    /// Wraps a raw `topi`/`claimi` value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    /// Packs an identity and priority the way the controller reports them.
    #[inline]
    pub const fn encode(id: u32, priority: u8) -> Self {
        Self {
            raw: ((id & regs::TOPI_ID_MASK) << regs::TOPI_ID_SHIFT) | priority as u32,
        }
    }

    /// Raw register value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.raw
    }

    /// Interrupt identity (bits 25:16).
    #[inline]
    pub const fn id(self) -> u32 {
        (self.raw >> regs::TOPI_ID_SHIFT) & regs::TOPI_ID_MASK
    }

    /// Interrupt priority (bits 7:0).
    #[inline]
    pub const fn priority(self) -> u8 {
        (self.raw & regs::TOPI_PRIO_MASK) as u8
    }

    /// Returns `true` if the register read as zero.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.raw == 0
    }
}

/// Driver for one APLIC domain in direct delivery mode.
///
/// The driver holds no controller state of its own; cloning it yields another
/// view of the same hardware.
#[derive(Debug, Clone)]
pub struct Aplic<R> {
    mmio: R,
    base: u64,
    idc_offset: u64,
    num_sources: u32,
    num_harts: usize,
}

impl<R: RegisterAccess> Aplic<R> {
    /// Creates a driver for a domain at `base` with sources `1..=num_sources` and
    /// delivery control blocks for harts `0..num_harts` starting at `base + idc_offset`.
    pub const fn new(
        mmio: R,
        base: u64,
        idc_offset: u64,
        num_sources: u32,
        num_harts: usize,
    ) -> Self {
        Self {
            mmio,
            base,
            idc_offset,
            num_sources,
            num_harts,
        }
    }

    /// Creates a driver from the platform configuration.
    pub const fn from_config(mmio: R, platform: &PlatformConfig) -> Self {
        Self::new(
            mmio,
            platform.aplic_base,
            platform.aplic_idc_offset,
            platform.num_sources,
            platform.num_harts,
        )
    }

    /// Number of implemented sources.
    pub const fn num_sources(&self) -> u32 {
        self.num_sources
    }

    /// Number of harts with a delivery control block.
    pub const fn num_harts(&self) -> usize {
        self.num_harts
    }

    #[inline]
    fn read(&self, offset: u64) -> u32 {
        self.mmio.read_u32(self.base + offset)
    }

    #[inline]
    fn write(&self, offset: u64, val: u32) {
        trace!("aplic write {offset:#06x} <- {val:#x}");
        self.mmio.write_u32(self.base + offset, val);
    }

    #[inline]
    fn idc(&self, hart: usize, reg: u64) -> u64 {
        self.idc_offset + hart as u64 * regs::IDC_STRIDE + reg
    }

    fn check_source(&self, id: u32) -> Result<SourceBit, AplicError> {
        let invalid = AplicError::InvalidSourceId {
            id,
            max: self.num_sources,
        };
        if id > self.num_sources {
            return Err(invalid);
        }
        SourceBit::locate(id).ok_or(invalid)
    }

    fn check_id(&self, id: u32) -> Result<(), AplicError> {
        self.check_source(id).map(drop)
    }

    fn check_hart(&self, hart: usize) -> Result<(), AplicError> {
        if hart >= self.num_harts {
            return Err(AplicError::InvalidHart {
                hart,
                count: self.num_harts,
            });
        }
        Ok(())
    }

    /// Sets `domaincfg.IE`, allowing the domain to signal interrupts to harts.
    pub fn enable_domain(&self) {
        let cfg = self.read(regs::DOMAINCFG);
        self.write(regs::DOMAINCFG, (cfg | regs::DOMAINCFG_IE) & !regs::DOMAINCFG_READ_ONLY);
        debug!("aplic domain enabled");
    }

    /// Clears `domaincfg.IE`.
    pub fn disable_domain(&self) {
        let cfg = self.read(regs::DOMAINCFG);
        self.write(regs::DOMAINCFG, cfg & !(regs::DOMAINCFG_IE | regs::DOMAINCFG_READ_ONLY));
        debug!("aplic domain disabled");
    }

    /// Returns `true` if `domaincfg.IE` is set.
    pub fn domain_enabled(&self) -> bool {
        self.read(regs::DOMAINCFG) & regs::DOMAINCFG_IE != 0
    }

    /// Configures and enables a source.
    ///
    /// Writes `sourcecfg[id]`, then `target[id]`, then `setienum = id`, and reads
    /// the enable bitmap back. Repeating the call with the same arguments leaves
    /// the controller in the same state.
    ///
    /// # Arguments
    ///
    /// * `target_hart` - Hart whose delivery control receives the interrupt.
    /// * `id` - Source identifier in `1..=num_sources`.
    /// * `mode` - Trigger mode written to `sourcecfg.SM`.
    /// * `priority` - Priority; lower values are more urgent.
    /// * `privilege` - Whether the source stays in this domain or is delegated.
    ///
    /// # Returns
    ///
    /// `EnableVerificationFailed` if the enable bit did not stick (for example
    /// because the source was delegated away or configured inactive).
    pub fn configure_source(
        &self,
        target_hart: usize,
        id: u32,
        mode: TriggerMode,
        priority: u8,
        privilege: Privilege,
    ) -> Result<(), AplicError> {
        let bit = self.check_source(id)?;
        self.check_hart(target_hart)?;

        self.write(regs::sourcecfg(id), mode.bits() | privilege.sourcecfg_bits());
        self.write(regs::target(id), regs::target_value(target_hart, priority));
        self.write(regs::SETIENUM, id);
        debug!(id, hart = target_hart, ?mode, priority, ?privilege, "source configured");

        if self.read(regs::SETIE_BASE + bit.byte_offset()) & bit.mask == 0 {
            return Err(AplicError::EnableVerificationFailed(id));
        }
        Ok(())
    }

    /// Same as [`Aplic::configure_source`], taking the trigger mode as its raw encoding.
    ///
    /// The mode is validated before the id, and before any register write.
    pub fn configure_source_raw(
        &self,
        target_hart: usize,
        id: u32,
        raw_mode: u32,
        priority: u8,
        privilege: Privilege,
    ) -> Result<(), AplicError> {
        let mode = TriggerMode::try_from(raw_mode)?;
        self.configure_source(target_hart, id, mode, priority, privilege)
    }

    /// Clears a source's enable bit through `clrienum`.
    pub fn disable_source(&self, id: u32) -> Result<(), AplicError> {
        self.check_id(id)?;
        self.write(regs::CLRIENUM, id);
        Ok(())
    }

    /// Returns `true` if the source's enable bit is set. Invalid ids are never enabled.
    pub fn is_enabled(&self, id: u32) -> bool {
        self.check_source(id)
            .is_ok_and(|bit| self.read(regs::SETIE_BASE + bit.byte_offset()) & bit.mask != 0)
    }

    /// Returns `true` if the source's pending bit is set. Invalid ids are never pending.
    pub fn is_pending(&self, id: u32) -> bool {
        self.check_source(id)
            .is_ok_and(|bit| self.read(regs::SETIP_BASE + bit.byte_offset()) & bit.mask != 0)
    }

    /// Sets a source's pending bit through `setipnum`.
    pub fn set_pending_by_number(&self, id: u32) -> Result<(), AplicError> {
        self.check_id(id)?;
        self.write(regs::SETIPNUM, id);
        Ok(())
    }

    /// Sets a source's pending bit through `setipnum_le`.
    pub fn set_pending_by_number_le(&self, id: u32) -> Result<(), AplicError> {
        self.check_id(id)?;
        self.write(regs::SETIPNUM_LE, id);
        Ok(())
    }

    /// Clears a source's pending bit through `clripnum`.
    pub fn clear_pending_by_number(&self, id: u32) -> Result<(), AplicError> {
        self.check_id(id)?;
        self.write(regs::CLRIPNUM, id);
        Ok(())
    }

    /// Enables delivery from the domain to `hart`.
    pub fn enable_delivery(&self, hart: usize) -> Result<(), AplicError> {
        self.check_hart(hart)?;
        self.write(self.idc(hart, regs::IDELIVERY), 1);
        debug!(hart, "delivery enabled");
        Ok(())
    }

    /// Disables delivery from the domain to `hart`.
    pub fn disable_delivery(&self, hart: usize) -> Result<(), AplicError> {
        self.check_hart(hart)?;
        self.write(self.idc(hart, regs::IDELIVERY), 0);
        debug!(hart, "delivery disabled");
        Ok(())
    }

    /// Sets `hart`'s priority threshold.
    ///
    /// Zero admits every priority; a non-zero `threshold` admits only sources whose
    /// priority number is strictly below it.
    pub fn set_priority_threshold(&self, hart: usize, threshold: u8) -> Result<(), AplicError> {
        self.check_hart(hart)?;
        self.write(self.idc(hart, regs::ITHRESHOLD), u32::from(threshold));
        debug!(hart, threshold, "priority threshold set");
        Ok(())
    }

    /// Forces an interrupt with identity 0 on `hart`.
    ///
    /// Refused without writing anything if a real interrupt is already waiting,
    /// since the forced one would then be indistinguishable from it.
    pub fn force(&self, hart: usize) -> Result<(), AplicError> {
        let topi = self.top_of_queue(hart)?;
        if !topi.is_empty() {
            return Err(AplicError::ForceWhileClaimOutstanding {
                hart,
                topi: topi.raw(),
            });
        }
        self.write(self.idc(hart, regs::IFORCE), 1);
        Ok(())
    }

    /// Retracts a forced interrupt on `hart`.
    pub fn clear_force(&self, hart: usize) -> Result<(), AplicError> {
        self.check_hart(hart)?;
        self.write(self.idc(hart, regs::IFORCE), 0);
        Ok(())
    }

    /// Reads `hart`'s `topi` register without side effects.
    pub fn top_of_queue(&self, hart: usize) -> Result<ClaimView, AplicError> {
        self.check_hart(hart)?;
        Ok(ClaimView::from_raw(self.read(self.idc(hart, regs::TOPI))))
    }

    /// Reads `hart`'s `claimi` register, claiming the top interrupt.
    pub fn claim(&self, hart: usize) -> Result<ClaimView, AplicError> {
        self.check_hart(hart)?;
        let view = ClaimView::from_raw(self.read(self.idc(hart, regs::CLAIMI)));
        trace!(hart, id = view.id(), priority = view.priority(), "claim");
        Ok(view)
    }
}
