//! Maps reduced positions to word, segment and slot coordinates.

use dispatch_data::{
    IndexVec, Member, MemberValue, PackedMember, Result, Segment, SynthError, TableLayout,
    WordGeometry,
};
use log::debug;
use std::collections::HashMap;

/// Plans the packed layout of `members`.
///
/// Positions must be unique: two members sharing one means the reduction that produced them is
/// not injective, which is reported rather than letting one silently overwrite the other.
pub fn plan(members: Vec<Member>, geometry: WordGeometry) -> Result<TableLayout> {
    let Some(max_position) = members.iter().map(|member| member.position).max() else {
        return Err(SynthError::EmptyTable);
    };

    let mut seen: HashMap<u32, usize> = HashMap::with_capacity(members.len());
    for (i, member) in members.iter().enumerate() {
        if let Some(&first) = seen.get(&member.position) {
            return Err(SynthError::DuplicatePosition {
                position: member.position,
                first: members[first].label.clone(),
                second: member.label.clone(),
            });
        }
        seen.insert(member.position, i);
        check_width(member, geometry)?;
    }

    let num_segments = 1 + (max_position / geometry.elements_per_word()) as usize;
    if num_segments > 1 {
        geometry.require_multi_segment()?;
    }

    let mut segments: IndexVec<_, Segment> =
        std::iter::repeat_with(Segment::default).take(num_segments).collect();
    for member in members {
        let slot = geometry.slot_of(member.position);
        segments[geometry.segment_of(member.position)].members.push(PackedMember { slot, member });
    }
    for segment in segments.iter_mut() {
        segment.members.sort_by_key(|packed| packed.slot);
    }

    debug!(
        "planned {} segment(s) of {}-bit elements, highest position {max_position}",
        num_segments,
        geometry.element_bits()
    );
    Ok(TableLayout { geometry, segments })
}

fn check_width(member: &Member, geometry: WordGeometry) -> Result<()> {
    match &member.value {
        MemberValue::Literal(value) if *value > geometry.element_mask() => {
            Err(SynthError::ValueTooWide {
                label: member.label.clone(),
                bits: geometry.element_bits(),
            })
        }
        _ => Ok(()),
    }
}
