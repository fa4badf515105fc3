//! Value types for packed dispatch table synthesis.
//!
//! Everything here is an immutable, generation time value: selectors, the geometry of a packed
//! word, the reduction of selectors into positions, the planned table layout and the structured
//! code fragments operating on it.

pub mod constants;
pub mod error;
pub mod fragment;
pub mod geometry;
pub mod index;
pub mod kind;
pub mod layout;
pub mod reduction;
pub mod selector;

pub use crate::{
    constants::ConstantPool,
    error::{GeometryIssue, Result, SynthError},
    fragment::{BinaryOp, Expr, Fragment, FragmentBuilder, Stmt, UnaryOp},
    geometry::{ArrayLocation, TableLocation, WORD_BITS, WORD_BYTES, WordGeometry},
    index::*,
    kind::{ElementKind, FUNCTION_POINTER_BITS},
    layout::{Member, MemberValue, PackedMember, Segment, TableLayout},
    reduction::{ReductionMode, ceil_log2},
    selector::{ParseSelectorError, Selector},
};
