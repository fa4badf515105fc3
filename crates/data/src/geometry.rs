//! Bit layout arithmetic for a fixed element size.
//!
//! Elements are packed from the most significant end of a word: slot `0` occupies the top
//! `element_bits` bits, slot `1` the bits right below it and so on. Any bits left over when the
//! element size does not divide the word stay at the bottom, unused.

use crate::{
    error::{GeometryIssue, Result, SynthError},
    fragment::Expr,
    index::SegmentId,
    kind::ElementKind,
};
use alloy_primitives::U256;

/// Machine word size in bits.
pub const WORD_BITS: u32 = 256;

/// Machine word size in bytes.
pub const WORD_BYTES: u32 = WORD_BITS / 8;

/// Where the words of a multi-segment table live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrayLocation {
    /// Contiguous, byte addressed words starting at a memory pointer.
    Memory,
    /// Consecutive storage slots starting at a base slot.
    Storage,
}

/// Where a table is kept while it is being read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableLocation {
    /// A single word passed around by value.
    Word,
    Array(ArrayLocation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WordGeometry {
    element_bits: u32,
    elements_per_word: u32,
}

impl WordGeometry {
    pub fn new(element_bits: u32) -> Result<Self> {
        let reject = |reason| SynthError::GeometryUnsupported { element_bits, reason };
        if element_bits == 0 || element_bits > WORD_BITS {
            return Err(reject(GeometryIssue::OutOfRange));
        }
        if element_bits % 8 != 0 {
            return Err(reject(GeometryIssue::NotByteAligned));
        }
        Ok(Self { element_bits, elements_per_word: WORD_BITS / element_bits })
    }

    pub fn for_kind(kind: &ElementKind) -> Result<Self> {
        Self::new(kind.bit_width()?)
    }

    /// Checks that no element can straddle a word boundary.
    pub fn require_multi_segment(self) -> Result<Self> {
        if WORD_BITS % self.element_bits != 0 {
            return Err(SynthError::GeometryUnsupported {
                element_bits: self.element_bits,
                reason: GeometryIssue::NotWordDivisor,
            });
        }
        Ok(self)
    }

    pub fn require_width(self, required: u32) -> Result<Self> {
        if self.element_bits != required {
            return Err(SynthError::GeometryUnsupported {
                element_bits: self.element_bits,
                reason: GeometryIssue::FixedWidth { required },
            });
        }
        Ok(self)
    }

    pub fn element_bits(self) -> u32 {
        self.element_bits
    }

    pub fn element_bytes(self) -> u32 {
        self.element_bits / 8
    }

    pub fn elements_per_word(self) -> u32 {
        self.elements_per_word
    }

    /// Mask covering one element, right aligned.
    pub fn element_mask(self) -> U256 {
        U256::MAX >> (WORD_BITS - self.element_bits) as usize
    }

    pub fn segment_of(self, position: u32) -> SegmentId {
        SegmentId::new(position / self.elements_per_word)
    }

    pub fn slot_of(self, position: u32) -> u32 {
        position % self.elements_per_word
    }

    /// Number of words needed to hold positions `0..span`.
    pub fn words_for(self, span: u64) -> u64 {
        span.div_ceil(u64::from(self.elements_per_word)).max(1)
    }

    /// Right shift that brings the element in `slot` down to the least significant bits.
    pub fn bits_from_right(self, slot: u32) -> u32 {
        debug_assert!(slot < self.elements_per_word, "slot {slot} outside of word");
        WORD_BITS - self.element_bits - self.element_bits * slot
    }

    /// [`Self::bits_from_right`] for a slot only known at run time.
    pub fn bits_from_right_expr(self, slot: Expr) -> Expr {
        Expr::sub(
            Expr::konst(U256::from(u64::from(WORD_BITS - self.element_bits))),
            Expr::mul(slot, Expr::konst(U256::from(u64::from(self.element_bits)))),
        )
    }

    /// Right shift for an element sitting at the very top of a loaded word.
    pub fn top_aligned_shift(self) -> u32 {
        WORD_BITS - self.element_bits
    }

    /// Offset from the array base of the word holding `position`.
    ///
    /// Memory is byte addressed, so loading a word at `position · element_bytes` puts the element
    /// at the top of the loaded word. Storage is slot addressed and uses plain array indexing.
    pub fn byte_offset_expr(self, position: Expr, location: ArrayLocation) -> Expr {
        match location {
            ArrayLocation::Memory => {
                Expr::mul(position, Expr::konst(U256::from(u64::from(self.element_bytes()))))
            }
            ArrayLocation::Storage => {
                Expr::div(position, Expr::konst(U256::from(u64::from(self.elements_per_word))))
            }
        }
    }

    /// Offset from the array base of the word with index `segment`.
    pub fn segment_offset_expr(self, segment: Expr, location: ArrayLocation) -> Expr {
        match location {
            ArrayLocation::Memory => Expr::mul(segment, Expr::konst(U256::from(u64::from(WORD_BYTES)))),
            ArrayLocation::Storage => segment,
        }
    }
}
