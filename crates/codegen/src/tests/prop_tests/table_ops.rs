//! Property tests executing table fragments in the EVM

use crate::{
    ops::{GotoMode, WriteMode},
    tests::helpers::{
        TARGET_MARKER_BASE, TableRun, callable_layout, empty_layout, literal_layout, synthesizer,
    },
};
use alloy_primitives::U256;
use dispatch_data::{ArrayLocation, TableLocation};
use proptest::prelude::*;

const ELEMENT_BITS: u32 = 16;
const PER_WORD: u32 = 16;
const MASK: u64 = 0xFFFF;

/// Table location with the number of words the table spans
fn location_strategy() -> impl Strategy<Value = (TableLocation, u32)> {
    prop_oneof![
        Just((TableLocation::Word, 1)),
        (1u32..=3).prop_map(|segments| (TableLocation::Array(ArrayLocation::Memory), segments)),
        (1u32..=3).prop_map(|segments| (TableLocation::Array(ArrayLocation::Storage), segments)),
    ]
}

/// Values to write, including ones wider than an element
fn value_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        Just(0u64),
        Just(MASK),
        Just(0x8001u64),
        // Wider than an element, must be masked
        Just(0x1_2345u64),
        Just(u64::MAX),
        any::<u16>().prop_map(u64::from),
        any::<u64>(),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn test_write_then_read_round_trip(
        (location, segments) in location_strategy(),
        key_seed in any::<u32>(),
        other_seed in any::<u32>(),
        value in value_strategy(),
    ) {
        let positions = segments * PER_WORD;
        let key = key_seed % positions;
        let other = other_seed % positions;
        let synth = synthesizer(ELEMENT_BITS, location);
        let layout = empty_layout(segments, ELEMENT_BITS);

        let mut run = TableRun::create(&synth, &layout);
        run.write(&synth.write("write", WriteMode::Safe), key, value);
        run.lookup(&synth.read("read"), key);
        prop_assert_eq!(run.program.execute().unwrap(), U256::from(value & MASK));

        let mut run = TableRun::create(&synth, &layout);
        run.write(&synth.write("write", WriteMode::Safe), key, value);
        run.lookup(&synth.read("read"), other);
        let expected = if other == key { value & MASK } else { 0 };
        prop_assert_eq!(run.program.execute().unwrap(), U256::from(expected));
    }

    #[test]
    fn test_safe_write_isolation(
        (location, segments) in location_strategy(),
        background in prop::collection::vec(any::<u16>(), 48),
        key_seed in any::<u32>(),
        offset in 1u32..48,
        value in value_strategy(),
    ) {
        let positions = segments * PER_WORD;
        let key = key_seed % positions;
        let other = (key + offset) % positions;
        prop_assume!(other != key);

        let pairs: Vec<(u32, u64)> =
            (0..positions).map(|p| (p, u64::from(background[p as usize]))).collect();
        let synth = synthesizer(ELEMENT_BITS, location);
        let layout = literal_layout(&pairs, ELEMENT_BITS);

        let mut run = TableRun::create(&synth, &layout);
        run.write(&synth.write("write", WriteMode::Safe), key, value);
        run.lookup(&synth.read("read"), other);
        prop_assert_eq!(run.program.execute().unwrap(), U256::from(background[other as usize]));

        // The written element itself no longer depends on what was there before.
        let mut run = TableRun::create(&synth, &layout);
        run.write(&synth.write("write", WriteMode::Safe), key, value);
        run.lookup(&synth.read("read"), key);
        prop_assert_eq!(run.program.execute().unwrap(), U256::from(value & MASK));
    }

    #[test]
    fn test_unsafe_write_merges(
        (location, segments) in location_strategy(),
        key_seed in any::<u32>(),
        first in value_strategy(),
        second in value_strategy(),
    ) {
        let key = key_seed % (segments * PER_WORD);
        let synth = synthesizer(ELEMENT_BITS, location);

        let mut run = TableRun::create(&synth, &empty_layout(segments, ELEMENT_BITS));
        run.write(&synth.write("write", WriteMode::Safe), key, first);
        run.write(&synth.write("write_unsafe", WriteMode::Unsafe), key, second);
        run.lookup(&synth.read("read"), key);
        prop_assert_eq!(run.program.execute().unwrap(), U256::from((first | second) & MASK));
    }

    #[test]
    fn test_goto_if_exists(
        (location, segments) in location_strategy(),
        populated in prop::collection::btree_set(0u32..48, 1..12),
        key_seed in any::<u32>(),
    ) {
        let positions = segments * PER_WORD;
        let populated: Vec<u32> = populated.into_iter().filter(|&p| p < positions).collect();
        prop_assume!(!populated.is_empty());
        let key = key_seed % positions;

        let labels: Vec<(u32, String)> =
            populated.iter().map(|&p| (p, format!("target_{p}"))).collect();
        let pairs: Vec<(u32, &str)> =
            labels.iter().map(|(p, label)| (*p, label.as_str())).collect();
        let synth = synthesizer(ELEMENT_BITS, location);
        // Keys past the last populated word read zeroed memory or storage.
        let layout = callable_layout(&pairs);

        let mut run = TableRun::create(&synth, &layout);
        run.lookup(&synth.goto("goto_if_exists", GotoMode::IfExists).unwrap(), key);
        for (p, label) in &labels {
            run.program.with_target(label, TARGET_MARKER_BASE + u64::from(*p));
        }

        let expected =
            if populated.contains(&key) { TARGET_MARKER_BASE + u64::from(key) } else { 0 };
        prop_assert_eq!(run.program.execute().unwrap(), U256::from(expected));
    }
}
