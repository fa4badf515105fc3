use crate::{
    fragment::Expr,
    geometry::WordGeometry,
    index::{IndexVec, SegmentId},
};
use alloy_primitives::U256;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MemberValue {
    Literal(U256),
    /// Reference to a callable; packed as its code offset.
    Callable(String),
}

impl MemberValue {
    pub fn to_expr(&self) -> Expr {
        match self {
            MemberValue::Literal(value) => Expr::Const(*value),
            MemberValue::Callable(label) => Expr::label(label.as_str()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            MemberValue::Callable(label) => Some(label),
            MemberValue::Literal(_) => None,
        }
    }
}

impl fmt::Display for MemberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberValue::Literal(value) => write!(f, "{value}"),
            MemberValue::Callable(label) => write!(f, "@{label}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub position: u32,
    pub value: MemberValue,
    pub label: String,
}

impl Member {
    pub fn new(position: u32, value: MemberValue, label: impl Into<String>) -> Self {
        Self { position, value, label: label.into() }
    }
}

/// A member placed inside its word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedMember {
    /// Position inside the word, `0` being the most significant element.
    pub slot: u32,
    pub member: Member,
}

/// One machine word worth of packed members, sorted by slot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Segment {
    pub members: SmallVec<[PackedMember; 8]>,
}

impl Segment {
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub geometry: WordGeometry,
    pub segments: IndexVec<SegmentId, Segment>,
}

impl TableLayout {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Single segment tables fit in one word and are passed around by value.
    pub fn is_single_segment(&self) -> bool {
        self.segments.len() == 1
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.segments.iter().flat_map(|segment| segment.members.iter().map(|packed| &packed.member))
    }
}
