//! Advanced Platform-Level Interrupt Controller (APLIC), direct delivery mode.
//!
//! Models one machine-level interrupt domain. Device interrupt outputs arrive through
//! [`AplicDevice::update_inputs`] once per bus tick; pending bits follow the rectified
//! input according to each source's trigger mode.
//!
//! # Memory Map
//!
//! * `0x0000`: domaincfg
//! * `0x0004 + 4 * (id - 1)`: sourcecfg\[id\]
//! * `0x1C00`: setip\[\] / `0x1CDC`: setipnum
//! * `0x1D00`: in_clrip\[\] / `0x1DDC`: clripnum
//! * `0x1E00`: setie\[\] / `0x1EDC`: setienum
//! * `0x1F00`: clrie\[\] / `0x1FDC`: clrienum
//! * `0x2000`: setipnum_le / `0x2004`: setipnum_be
//! * `0x3004 + 4 * (id - 1)`: target\[id\]
//! * `idc_offset + 0x20 * hart`: idelivery, iforce, ithreshold, topi, claimi

use tracing::trace;

use crate::common::SourceBit;
use crate::common::bitmap::{BITS_PER_WORD, words_for};
use crate::drivers::aplic::regs;
use crate::drivers::aplic::{ClaimView, TriggerMode};
use crate::soc::devices::Device;

/// Bytes covered by one bitmap register array (32 words).
const BITMAP_SPAN: u64 = 0x80;

/// Last byte offset of the sourcecfg array.
const SOURCECFG_END: u64 = regs::SOURCECFG_BASE + 4 * (regs::MAX_SOURCES as u64 - 1);

/// Last byte offset of the target array.
const TARGET_END: u64 = regs::TARGET_BASE + 4 * (regs::MAX_SOURCES as u64 - 1);

/// Per-hart interrupt delivery control.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Idc {
    idelivery: bool,
    iforce: bool,
    ithreshold: u8,
}

/// APLIC device model.
#[derive(Debug, Clone)]
pub struct AplicDevice {
    base: u64,
    idc_offset: u64,
    num_sources: u32,
    /// Interrupt enable bit of domaincfg.
    domain_ie: bool,
    /// Raw sourcecfg values, indexed by source id (index 0 unused).
    sourcecfg: Vec<u32>,
    /// Raw target values, indexed by source id (index 0 unused).
    target: Vec<u32>,
    pending: Vec<u32>,
    enabled: Vec<u32>,
    /// Raw (unrectified) input wire levels.
    inputs: Vec<u32>,
    idc: Vec<Idc>,
}

impl AplicDevice {
    /// Creates a domain at `base` with sources `1..=num_sources` and
    /// `num_harts` delivery control blocks starting at `base + idc_offset`.
    pub fn new(base: u64, idc_offset: u64, num_sources: u32, num_harts: usize) -> Self {
        let num_sources = num_sources.min(regs::MAX_SOURCES);
        let words = words_for(num_sources);
        Self {
            base,
            idc_offset,
            num_sources,
            domain_ie: false,
            sourcecfg: vec![0; num_sources as usize + 1],
            target: vec![0; num_sources as usize + 1],
            pending: vec![0; words],
            enabled: vec![0; words],
            inputs: vec![0; words],
            idc: vec![Idc::default(); num_harts],
        }
    }

    /// Number of implemented sources.
    pub const fn num_sources(&self) -> u32 {
        self.num_sources
    }

    fn bit(&self, id: u32) -> Option<SourceBit> {
        if id > self.num_sources {
            return None;
        }
        SourceBit::locate(id)
    }

    /// Trigger mode of `id` as seen by this domain.
    ///
    /// Delegated sources and sources holding a reserved mode are inactive here.
    pub fn mode(&self, id: u32) -> TriggerMode {
        let raw = self.sourcecfg.get(id as usize).copied().unwrap_or(0);
        if raw & regs::SOURCECFG_D != 0 {
            return TriggerMode::Inactive;
        }
        TriggerMode::try_from(raw & regs::SOURCECFG_SM_MASK).unwrap_or(TriggerMode::Inactive)
    }

    /// Rectified input of `id`: the wire level, inverted for active-low modes.
    fn rectified(&self, id: u32) -> bool {
        let Some(bit) = self.bit(id) else {
            return false;
        };
        let mode = self.mode(id);
        if !mode.is_active() || mode == TriggerMode::Detached {
            return false;
        }
        bit.is_set(&self.inputs) != mode.is_active_low()
    }

    /// Returns `true` if `id` is pending.
    pub fn is_pending(&self, id: u32) -> bool {
        self.bit(id).is_some_and(|bit| bit.is_set(&self.pending))
    }

    /// Returns `true` if `id` is enabled.
    pub fn is_enabled(&self, id: u32) -> bool {
        self.bit(id).is_some_and(|bit| bit.is_set(&self.enabled))
    }

    fn set_pending(&mut self, id: u32, value: bool) {
        let Some(bit) = self.bit(id) else {
            return;
        };
        let mode = self.mode(id);
        if !mode.is_active() {
            return;
        }
        // Level-sensitive pending bits track the rectified input in direct mode.
        if value && mode.is_level() {
            return;
        }
        bit.assign(&mut self.pending, value);
    }

    fn set_enabled(&mut self, id: u32, value: bool) {
        if let Some(bit) = self.bit(id) {
            if value && !self.mode(id).is_active() {
                return;
            }
            bit.assign(&mut self.enabled, value);
        }
    }

    fn write_sourcecfg(&mut self, id: u32, val: u32) {
        let Some(slot) = self.sourcecfg.get_mut(id as usize) else {
            return;
        };
        *slot = if val & regs::SOURCECFG_D != 0 {
            val & (regs::SOURCECFG_D | regs::SOURCECFG_CHILD_MASK)
        } else {
            match TriggerMode::try_from(val & regs::SOURCECFG_SM_MASK) {
                Ok(mode) => mode.bits(),
                Err(_) => 0,
            }
        };

        if let Some(bit) = self.bit(id) {
            let mode = self.mode(id);
            if !mode.is_active() {
                bit.assign(&mut self.pending, false);
                bit.assign(&mut self.enabled, false);
            } else if mode.is_level() {
                let level = self.rectified(id);
                bit.assign(&mut self.pending, level);
            }
        }
    }

    fn write_target(&mut self, id: u32, val: u32) {
        let hart = (val >> regs::TARGET_HART_SHIFT) & regs::TARGET_HART_MASK;
        // Priority 0 is the most urgent level.
        let priority = val & regs::TARGET_PRIO_MASK;
        if let Some(slot) = self.target.get_mut(id as usize) {
            *slot = (hart << regs::TARGET_HART_SHIFT) | priority;
        }
    }

    /// Feeds the current device interrupt outputs into the domain.
    ///
    /// `asserted` lists the sources whose wire is high this tick; every other
    /// wire is low. Edge-sensitive sources become pending on the selected
    /// transition, level-sensitive sources mirror the rectified level.
    pub fn update_inputs(&mut self, asserted: &[u32]) {
        let mut next = vec![0u32; self.inputs.len()];
        for &id in asserted {
            if let Some(bit) = self.bit(id) {
                bit.assign(&mut next, true);
            }
        }
        if next == self.inputs {
            return;
        }

        let before: Vec<bool> = (1..=self.num_sources).map(|id| self.rectified(id)).collect();
        self.inputs = next;
        for (id, was) in (1..=self.num_sources).zip(before) {
            let now = self.rectified(id);
            let mode = self.mode(id);
            let Some(bit) = self.bit(id) else { continue };
            if mode.is_level() {
                bit.assign(&mut self.pending, now);
            } else if mode.is_edge() && now && !was {
                trace!(id, "edge detected");
                bit.assign(&mut self.pending, true);
            }
        }
    }

    /// Highest-priority pending and enabled source targeting `hart` that passes its threshold.
    ///
    /// Lower priority numbers win; ties go to the lower source id.
    pub fn topi(&self, hart: usize) -> ClaimView {
        let Some(idc) = self.idc.get(hart) else {
            return ClaimView::EMPTY;
        };

        let mut best: Option<(u32, u32)> = None;
        for (word, (&p, &e)) in self.pending.iter().zip(&self.enabled).enumerate() {
            let mut candidates = p & e;
            while candidates != 0 {
                let bit = candidates.trailing_zeros();
                candidates &= candidates - 1;
                let id = SourceBit::id_at(word, bit);
                if id > self.num_sources || !self.mode(id).is_active() {
                    continue;
                }

                let target = self.target[id as usize];
                if ((target >> regs::TARGET_HART_SHIFT) & regs::TARGET_HART_MASK) as usize != hart {
                    continue;
                }
                let priority = target & regs::TARGET_PRIO_MASK;
                if idc.ithreshold != 0 && priority >= u32::from(idc.ithreshold) {
                    continue;
                }
                if best.is_none_or(|(_, p)| priority < p) {
                    best = Some((id, priority));
                }
            }
        }

        best.map_or(ClaimView::EMPTY, |(id, priority)| {
            ClaimView::encode(id, priority as u8)
        })
    }

    /// Claims `hart`'s top interrupt: clears its pending bit and returns it.
    ///
    /// A claim that finds nothing clears the hart's `iforce`.
    pub fn claim(&mut self, hart: usize) -> ClaimView {
        let top = self.topi(hart);
        if top.is_empty() {
            if let Some(idc) = self.idc.get_mut(hart) {
                idc.iforce = false;
            }
            return top;
        }

        if let Some(bit) = self.bit(top.id()) {
            bit.assign(&mut self.pending, false);
        }
        // A level source still asserted is pending again immediately.
        if self.mode(top.id()).is_level() && self.rectified(top.id()) {
            self.set_level_pending(top.id());
        }
        top
    }

    fn set_level_pending(&mut self, id: u32) {
        if let Some(bit) = self.bit(id) {
            bit.assign(&mut self.pending, true);
        }
    }

    /// Machine external interrupt line for `hart`.
    pub fn meip(&self, hart: usize) -> bool {
        let Some(idc) = self.idc.get(hart) else {
            return false;
        };
        self.domain_ie && idc.idelivery && (idc.iforce || !self.topi(hart).is_empty())
    }

    fn bitmap_word(map: &[u32], offset: u64) -> u32 {
        map.get((offset / 4) as usize).copied().unwrap_or(0)
    }

    fn for_each_set_bit(val: u32, word: u64, mut f: impl FnMut(u32)) {
        let mut bits = val;
        while bits != 0 {
            let bit = bits.trailing_zeros();
            bits &= bits - 1;
            f(SourceBit::id_at(word as usize, bit));
        }
    }

    fn in_clrip_word(&self, word: u64) -> u32 {
        let mut value = 0;
        for bit in 0..BITS_PER_WORD {
            let id = SourceBit::id_at(word as usize, bit);
            if id <= self.num_sources && self.rectified(id) {
                value |= 1 << bit;
            }
        }
        value
    }

    fn read_idc(&mut self, hart: usize, reg: u64) -> u32 {
        let Some(idc) = self.idc.get(hart).copied() else {
            return 0;
        };
        match reg {
            regs::IDELIVERY => u32::from(idc.idelivery),
            regs::IFORCE => u32::from(idc.iforce),
            regs::ITHRESHOLD => u32::from(idc.ithreshold),
            regs::TOPI => self.topi(hart).raw(),
            regs::CLAIMI => self.claim(hart).raw(),
            _ => 0,
        }
    }

    fn write_idc(&mut self, hart: usize, reg: u64, val: u32) {
        let Some(idc) = self.idc.get_mut(hart) else {
            return;
        };
        match reg {
            regs::IDELIVERY => idc.idelivery = val & 1 != 0,
            regs::IFORCE => idc.iforce = val & 1 != 0,
            regs::ITHRESHOLD => idc.ithreshold = (val & 0xFF) as u8,
            _ => {}
        }
    }

    fn idc_slot(&self, offset: u64) -> Option<(usize, u64)> {
        let rel = offset.checked_sub(self.idc_offset)?;
        let hart = (rel / regs::IDC_STRIDE) as usize;
        (hart < self.idc.len()).then_some((hart, rel % regs::IDC_STRIDE))
    }
}

impl Device for AplicDevice {
    fn name(&self) -> &str {
        "APLIC"
    }

    fn address_range(&self) -> (u64, u64) {
        (
            self.base,
            self.idc_offset + regs::IDC_STRIDE * self.idc.len() as u64,
        )
    }

    fn read_u8(&mut self, offset: u64) -> u8 {
        let val = self.read_u32(offset & !3);
        (val >> ((offset & 3) * 8)) as u8
    }

    fn read_u16(&mut self, offset: u64) -> u16 {
        let val = self.read_u32(offset & !3);
        (val >> ((offset & 2) * 8)) as u16
    }

    fn read_u32(&mut self, offset: u64) -> u32 {
        if let Some((hart, reg)) = self.idc_slot(offset) {
            return self.read_idc(hart, reg);
        }
        match offset {
            regs::DOMAINCFG => {
                regs::DOMAINCFG_READ_ONLY | if self.domain_ie { regs::DOMAINCFG_IE } else { 0 }
            }
            regs::SOURCECFG_BASE..=SOURCECFG_END => {
                let id = ((offset - regs::SOURCECFG_BASE) / 4 + 1) as usize;
                self.sourcecfg.get(id).copied().unwrap_or(0)
            }
            o if (regs::SETIP_BASE..regs::SETIP_BASE + BITMAP_SPAN).contains(&o) => {
                Self::bitmap_word(&self.pending, o - regs::SETIP_BASE)
            }
            o if (regs::IN_CLRIP_BASE..regs::IN_CLRIP_BASE + BITMAP_SPAN).contains(&o) => {
                self.in_clrip_word((o - regs::IN_CLRIP_BASE) / 4)
            }
            o if (regs::SETIE_BASE..regs::SETIE_BASE + BITMAP_SPAN).contains(&o) => {
                Self::bitmap_word(&self.enabled, o - regs::SETIE_BASE)
            }
            regs::TARGET_BASE..=TARGET_END => {
                let id = ((offset - regs::TARGET_BASE) / 4 + 1) as usize;
                self.target.get(id).copied().unwrap_or(0)
            }
            _ => 0,
        }
    }

    fn read_u64(&mut self, offset: u64) -> u64 {
        u64::from(self.read_u32(offset))
    }

    fn write_u8(&mut self, _offset: u64, _val: u8) {}

    fn write_u16(&mut self, _offset: u64, _val: u16) {}

    fn write_u32(&mut self, offset: u64, val: u32) {
        if let Some((hart, reg)) = self.idc_slot(offset) {
            self.write_idc(hart, reg, val);
            return;
        }
        match offset {
            regs::DOMAINCFG => self.domain_ie = val & regs::DOMAINCFG_IE != 0,
            regs::SOURCECFG_BASE..=SOURCECFG_END => {
                let id = ((offset - regs::SOURCECFG_BASE) / 4 + 1) as u32;
                self.write_sourcecfg(id, val);
            }
            regs::SETIPNUM | regs::SETIPNUM_LE => self.set_pending(val, true),
            regs::SETIPNUM_BE => self.set_pending(val.swap_bytes(), true),
            regs::CLRIPNUM => self.set_pending(val, false),
            regs::SETIENUM => self.set_enabled(val, true),
            regs::CLRIENUM => self.set_enabled(val, false),
            o if (regs::SETIP_BASE..regs::SETIP_BASE + BITMAP_SPAN).contains(&o) => {
                Self::for_each_set_bit(val, (o - regs::SETIP_BASE) / 4, |id| {
                    self.set_pending(id, true);
                });
            }
            o if (regs::IN_CLRIP_BASE..regs::IN_CLRIP_BASE + BITMAP_SPAN).contains(&o) => {
                Self::for_each_set_bit(val, (o - regs::IN_CLRIP_BASE) / 4, |id| {
                    self.set_pending(id, false);
                });
            }
            o if (regs::SETIE_BASE..regs::SETIE_BASE + BITMAP_SPAN).contains(&o) => {
                Self::for_each_set_bit(val, (o - regs::SETIE_BASE) / 4, |id| {
                    self.set_enabled(id, true);
                });
            }
            o if (regs::CLRIE_BASE..regs::CLRIE_BASE + BITMAP_SPAN).contains(&o) => {
                Self::for_each_set_bit(val, (o - regs::CLRIE_BASE) / 4, |id| {
                    self.set_enabled(id, false);
                });
            }
            regs::TARGET_BASE..=TARGET_END => {
                let id = ((offset - regs::TARGET_BASE) / 4 + 1) as u32;
                self.write_target(id, val);
            }
            _ => {}
        }
    }

    fn write_u64(&mut self, offset: u64, val: u64) {
        self.write_u32(offset, val as u32);
    }

    fn as_aplic_mut(&mut self) -> Option<&mut AplicDevice> {
        Some(self)
    }
}
