//! Generation time errors.
//!
//! Every error is a pure function of the inputs of one table: it aborts that table's synthesis
//! and leaves unrelated tables alone.

use thiserror::Error;

/// Why a geometry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryIssue {
    /// Zero width or wider than one machine word.
    OutOfRange,
    /// Element does not consist of whole bytes.
    NotByteAligned,
    /// Elements would straddle a word boundary when packed across several words.
    NotWordDivisor,
    /// The operation is defined for one element width only.
    FixedWidth { required: u32 },
}

impl std::fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryIssue::OutOfRange => write!(f, "must be between 1 and 256 bits"),
            GeometryIssue::NotByteAligned => write!(f, "must be a whole number of bytes"),
            GeometryIssue::NotWordDivisor => {
                write!(f, "must divide the 256-bit word for multi-segment tables")
            }
            GeometryIssue::FixedWidth { required } => write!(f, "must be exactly {required} bits"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SynthError {
    #[error("unsupported element size of {element_bits} bits: {reason}")]
    GeometryUnsupported { element_bits: u32, reason: GeometryIssue },

    #[error("`{first}` and `{second}` both resolve to position {position}")]
    DuplicatePosition { position: u32, first: String, second: String },

    #[error("element shape `{shape}` has no fixed size")]
    UnsupportedShape { shape: String },

    #[error("table has no elements")]
    EmptyTable,

    #[error("{values} values do not fit in a word of {capacity} elements")]
    TooManyValues { values: usize, capacity: u32 },

    #[error("value of `{label}` does not fit in {bits} bits")]
    ValueTooWide { label: String, bits: u32 },

    #[error("no injective modulus up to {max_modulus} for {keys} keys")]
    SearchExhausted { max_modulus: u64, keys: usize },

    #[error("no externally callable entries to dispatch")]
    NoCallableEntries,
}

pub type Result<T> = std::result::Result<T, SynthError>;
