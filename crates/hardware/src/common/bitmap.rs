//! Source bitmap addressing.
//!
//! The enable and pending state of every interrupt source lives in arrays of 32-bit
//! words. Source `id` occupies word `(id - 1) / 32`, bit `(id - 1) % 32`. The driver
//! (reading `setie`/`setip`) and the simulated controller (maintaining them) both go
//! through [`SourceBit`], so the two sides can never disagree on the layout.

/// Number of sources covered by one bitmap word.
pub const BITS_PER_WORD: u32 = 32;

/// Location of one interrupt source inside a word-addressed bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceBit {
    /// Index of the 32-bit word holding the source.
    pub word: usize,
    /// Single-bit mask of the source within that word.
    pub mask: u32,
}

impl SourceBit {
    /// Locates source `id` in a bitmap.
    ///
    /// Returns `None` for id 0, which never denotes a real source.
    #[inline]
    pub const fn locate(id: u32) -> Option<Self> {
        if id == 0 {
            return None;
        }
        let index = id - 1;
        Some(Self {
            word: (index / BITS_PER_WORD) as usize,
            mask: 1 << (index % BITS_PER_WORD),
        })
    }

    /// Inverse of [`SourceBit::locate`]: the source id for bit `bit` of word `word`.
    #[inline]
    pub const fn id_at(word: usize, bit: u32) -> u32 {
        word as u32 * BITS_PER_WORD + bit + 1
    }

    /// Byte offset of this source's word relative to a bitmap register base.
    #[inline]
    pub const fn byte_offset(self) -> u64 {
        self.word as u64 * 4
    }

    /// Returns `true` if this source's bit is set in `bitmap`.
    #[inline]
    pub fn is_set(self, bitmap: &[u32]) -> bool {
        bitmap.get(self.word).is_some_and(|w| w & self.mask != 0)
    }

    /// Sets or clears this source's bit in `bitmap`; out-of-range words are ignored.
    #[inline]
    pub fn assign(self, bitmap: &mut [u32], value: bool) {
        if let Some(w) = bitmap.get_mut(self.word) {
            if value {
                *w |= self.mask;
            } else {
                *w &= !self.mask;
            }
        }
    }
}

/// Number of bitmap words needed to hold sources `1..=num_sources`.
#[inline]
pub const fn words_for(num_sources: u32) -> usize {
    num_sources.div_ceil(BITS_PER_WORD) as usize
}
