use crate::{fragment::Expr, selector::Selector};
use alloy_primitives::U256;
use std::fmt;

/// How raw selectors are turned into dense table positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReductionMode {
    /// Position is the ordinal of the key in input order.
    Indexed { keys: u32, bit_width: u32 },
    /// Position is `window(key) % modulus`, where the window is `bit_width` bits starting
    /// `start_bit` bits above the least significant bit of the key.
    Magic { start_bit: u32, bit_width: u32, modulus: u64 },
}

impl ReductionMode {
    pub fn indexed(keys: usize) -> Self {
        let keys = u32::try_from(keys).unwrap_or(u32::MAX);
        Self::Indexed { keys, bit_width: ceil_log2(u64::from(keys)) }
    }

    pub fn is_sliced(self) -> bool {
        match self {
            ReductionMode::Indexed { .. } => false,
            ReductionMode::Magic { start_bit, bit_width, .. } => {
                start_bit != 0 || bit_width < Selector::BITS
            }
        }
    }

    /// Size of the position space, i.e. every position is below this bound.
    pub fn span(self) -> u64 {
        match self {
            ReductionMode::Indexed { keys, .. } => u64::from(keys),
            ReductionMode::Magic { modulus, .. } => modulus,
        }
    }

    /// The raw value the modulus is applied to.
    pub fn slice(self, key: Selector) -> u64 {
        match self {
            ReductionMode::Indexed { .. } => u64::from(key.get()),
            ReductionMode::Magic { start_bit, bit_width, .. } => key.window(start_bit, bit_width),
        }
    }

    /// Position of `key`, `ordinal` being its index in the input order.
    pub fn position_of(self, key: Selector, ordinal: usize) -> u32 {
        match self {
            ReductionMode::Indexed { .. } => ordinal as u32,
            ReductionMode::Magic { modulus, .. } => (self.slice(key) % modulus) as u32,
        }
    }

    /// Run time computation of the position from a raw selector. Indexed tables have none: their
    /// positions are only meaningful to the generator.
    pub fn position_expr(self, selector: Expr) -> Option<Expr> {
        match self {
            ReductionMode::Indexed { .. } => None,
            ReductionMode::Magic { start_bit, bit_width, modulus } => {
                let shifted = Expr::shr(Expr::konst(U256::from(u64::from(start_bit))), selector);
                let window = if start_bit + bit_width >= Selector::BITS {
                    shifted
                } else {
                    Expr::and(shifted, Expr::konst(U256::from((1u64 << bit_width) - 1)))
                };
                Some(Expr::rem(window, Expr::konst(U256::from(modulus))))
            }
        }
    }
}

impl fmt::Display for ReductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReductionMode::Indexed { keys, bit_width } => {
                write!(f, "indexed ({keys} keys, {bit_width} bits)")
            }
            ReductionMode::Magic { start_bit, bit_width, modulus } => {
                let end_bit = start_bit + bit_width;
                write!(f, "magic modulus {modulus} over selector bits [{start_bit}, {end_bit})")
            }
        }
    }
}

/// Smallest `b` with `2^b >= n`.
pub fn ceil_log2(n: u64) -> u32 {
    if n <= 1 { 0 } else { u64::BITS - (n - 1).leading_zeros() }
}
