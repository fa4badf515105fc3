use std::{fmt, str::FromStr};
use thiserror::Error;

/// Function selector: the fixed-width key a dispatch table is looked up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Selector(pub u32);

impl Selector {
    /// Native key width in bits.
    pub const BITS: u32 = u32::BITS;

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Extracts `bit_width` bits starting `start_bit` bits above the least significant bit.
    pub fn window(self, start_bit: u32, bit_width: u32) -> u64 {
        let mask = if bit_width >= u64::BITS { u64::MAX } else { (1u64 << bit_width) - 1 };
        (u64::from(self.0) >> start_bit) & mask
    }
}

impl From<u32> for Selector {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid selector `{0}`")]
pub struct ParseSelectorError(pub String);

impl FromStr for Selector {
    type Err = ParseSelectorError;

    /// Accepts `0x`-prefixed hex (up to 8 digits) or plain decimal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseSelectorError(s.to_string());
        match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) if !hex.is_empty() && hex.len() <= 8 => {
                u32::from_str_radix(hex, 16).map(Self).map_err(|_| err())
            }
            Some(_) => Err(err()),
            None => s.parse::<u32>().map(Self).map_err(|_| err()),
        }
    }
}
