//! Shapes of the values a table packs.

use crate::error::{Result, SynthError};
use std::fmt;

/// Width of an internal function pointer (a code offset).
pub const FUNCTION_POINTER_BITS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Uint { bits: u32 },
    Bool,
    Enum { variants: u32 },
    Struct { fields: Vec<ElementKind> },
    FixedArray { element: Box<ElementKind>, len: u32 },
    DynamicArray { element: Box<ElementKind> },
    Bytes,
    FunctionPointer,
}

impl ElementKind {
    /// Number of bits the element occupies once packed.
    pub fn bit_width(&self) -> Result<u32> {
        match self {
            ElementKind::Uint { bits } => Ok(*bits),
            ElementKind::Bool => Ok(8),
            ElementKind::Enum { variants } if *variants <= 256 => Ok(8),
            ElementKind::Enum { .. } => Err(self.unsupported()),
            ElementKind::Struct { fields } if fields.is_empty() => Err(self.unsupported()),
            ElementKind::Struct { fields } => {
                fields.iter().try_fold(0u32, |acc, field| {
                    acc.checked_add(field.bit_width()?).ok_or_else(|| self.unsupported())
                })
            }
            ElementKind::FixedArray { len: 0, .. } => Err(self.unsupported()),
            ElementKind::FixedArray { element, len } => {
                element.bit_width()?.checked_mul(*len).ok_or_else(|| self.unsupported())
            }
            ElementKind::DynamicArray { .. } | ElementKind::Bytes => Err(self.unsupported()),
            ElementKind::FunctionPointer => Ok(FUNCTION_POINTER_BITS),
        }
    }

    fn unsupported(&self) -> SynthError {
        SynthError::UnsupportedShape { shape: self.to_string() }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Uint { bits } => write!(f, "uint{bits}"),
            ElementKind::Bool => write!(f, "bool"),
            ElementKind::Enum { variants } => write!(f, "enum({variants})"),
            ElementKind::Struct { fields } => {
                write!(f, "struct(")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, ")")
            }
            ElementKind::FixedArray { element, len } => write!(f, "{element}[{len}]"),
            ElementKind::DynamicArray { element } => write!(f, "{element}[]"),
            ElementKind::Bytes => write!(f, "bytes"),
            ElementKind::FunctionPointer => write!(f, "function"),
        }
    }
}
