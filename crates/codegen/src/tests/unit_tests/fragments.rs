//! Exact shape of the generated fragments for 16-bit elements

use crate::{
    ops::{GotoMode, WriteMode},
    tests::helpers::{callable_layout, literal_layout, synthesizer},
};
use dispatch_data::{
    ArrayLocation, GeometryIssue, SynthError, TableLocation,
};

const WORD: TableLocation = TableLocation::Word;
const MEMORY: TableLocation = TableLocation::Array(ArrayLocation::Memory);
const STORAGE: TableLocation = TableLocation::Array(ArrayLocation::Storage);

/// `value << shift` for a single hex digit, rendered the way fragments render constants.
fn shifted_digit(digit: char, shift: usize) -> String {
    format!("0x{digit}{}", "0".repeat(shift / 4))
}

#[test]
fn test_word_read() {
    let read = synthesizer(16, WORD).read("read");
    assert_eq!(
        read.to_string(),
        "fn read(word, key) {\n    => and(shr(sub(240, shl(4, key)), word), 0xffff)\n}"
    );
}

#[test]
fn test_word_writes() {
    let synth = synthesizer(16, WORD);
    assert_eq!(
        synth.write("write", WriteMode::Safe).to_string(),
        "fn write(word, key, value) {\n    let shift := sub(240, shl(4, key))\n    => or(and(word, not(shl(shift, 0xffff))), shl(shift, and(value, 0xffff)))\n}"
    );
    assert_eq!(
        synth.write("write_unsafe", WriteMode::Unsafe).to_string(),
        "fn write_unsafe(word, key, value) {\n    let shift := sub(240, shl(4, key))\n    => or(word, shl(shift, and(value, 0xffff)))\n}"
    );
}

#[test]
fn test_memory_read_is_top_aligned() {
    let read = synthesizer(16, MEMORY).read("read");
    assert_eq!(
        read.to_string(),
        "fn read(base, key) {\n    => shr(240, mload(add(base, shl(1, key))))\n}"
    );

    let read = synthesizer(32, MEMORY).read("read");
    assert_eq!(
        read.to_string(),
        "fn read(base, key) {\n    => shr(224, mload(add(base, shl(2, key))))\n}"
    );
}

#[test]
fn test_memory_safe_write() {
    let write = synthesizer(16, MEMORY).write("write", WriteMode::Safe);
    let hole = format!("0x{}", "f".repeat(60));
    let expected = format!(
        "fn write(base, key, value) {{\n    let addr := add(base, shl(1, key))\n    mstore(addr, or(and(mload(addr), {hole}), shl(240, and(value, 0xffff))))\n}}"
    );
    assert_eq!(write.to_string(), expected);
}

#[test]
fn test_storage_write() {
    let write = synthesizer(16, STORAGE).write("write", WriteMode::Safe);
    assert_eq!(
        write.to_string(),
        "fn write(base, key, value) {\n    let slot := add(base, shr(4, key))\n    let shift := sub(240, shl(4, and(key, 15)))\n    sstore(slot, or(and(sload(slot), not(shl(shift, 0xffff))), shl(shift, and(value, 0xffff))))\n}"
    );
}

#[test]
fn test_storage_read_of_odd_width() {
    // Storage is slot addressed, elements that leave bits unused are fine.
    let read = synthesizer(24, STORAGE).read("read");
    assert_eq!(
        read.to_string(),
        "fn read(base, key) {\n    => and(shr(sub(232, mul(mod(key, 10), 24)), sload(add(base, div(key, 10)))), 0xffffff)\n}"
    );
}

#[test]
fn test_create_word_of_callables() {
    let layout = callable_layout(&[(2, "b"), (0, "a")]);
    let create = synthesizer(16, WORD).create("create", &layout).unwrap();
    assert_eq!(create.to_string(), "fn create() {\n    => or(shl(240, @a), shl(208, @b))\n}");
    assert_eq!(create.labels(), vec!["a", "b"]);
}

#[test]
fn test_create_arrays_fold_constant_words() {
    let layout = literal_layout(&[(1, 5), (17, 6)], 16);
    let create = synthesizer(16, MEMORY).create("create", &layout).unwrap();
    let expected = format!(
        "fn create(base) {{\n    mstore(base, {})\n    mstore(add(base, 32), {})\n}}",
        shifted_digit('5', 224),
        shifted_digit('6', 224)
    );
    assert_eq!(create.to_string(), expected);

    let create = synthesizer(16, STORAGE).create("create", &layout).unwrap();
    let expected = format!(
        "fn create(base) {{\n    sstore(base, {})\n    sstore(add(base, 1), {})\n}}",
        shifted_digit('5', 224),
        shifted_digit('6', 224)
    );
    assert_eq!(create.to_string(), expected);
}

#[test]
fn test_create_stores_empty_segments() {
    let layout = literal_layout(&[(40, 1)], 16);
    let create = synthesizer(16, STORAGE).create("create", &layout).unwrap();
    assert_eq!(create.body.len(), 3);
    assert!(create.to_string().contains("sstore(base, 0)"));
}

#[test]
fn test_create_word_rejects_multiple_segments() {
    let layout = literal_layout(&[(1, 5), (17, 6)], 16);
    assert_eq!(
        synthesizer(16, WORD).create("create", &layout),
        Err(SynthError::TooManyValues { values: 2, capacity: 16 })
    );
}

#[test]
fn test_gotos() {
    let synth = synthesizer(16, WORD);
    assert_eq!(
        synth.goto("goto", GotoMode::Always).unwrap().to_string(),
        "fn goto(word, key) {\n    jump(and(shr(sub(240, shl(4, key)), word), 0xffff))\n}"
    );
    assert_eq!(
        synth.goto("goto_if_exists", GotoMode::IfExists).unwrap().to_string(),
        "fn goto_if_exists(word, key) {\n    let target := and(shr(sub(240, shl(4, key)), word), 0xffff)\n    jumpi(target, target)\n    => gt(target, 0)\n}"
    );
}

#[test]
fn test_goto_requires_function_pointer_width() {
    assert_eq!(
        synthesizer(8, WORD).goto("goto", GotoMode::Always),
        Err(SynthError::GeometryUnsupported {
            element_bits: 8,
            reason: GeometryIssue::FixedWidth { required: 16 }
        })
    );
}

#[test]
fn test_memory_rejects_straddling_elements() {
    let geometry = dispatch_data::WordGeometry::new(24).unwrap();
    assert!(crate::OperationSynthesizer::new(geometry, MEMORY).is_err());
    assert!(crate::OperationSynthesizer::new(geometry, STORAGE).is_ok());
}

#[test]
fn test_bundle_names() {
    let layout = literal_layout(&[(0, 1)], 16);
    let bundle = synthesizer(16, WORD).bundle("router", &layout, true).unwrap();
    let names: Vec<&str> = bundle.iter().map(|fragment| fragment.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "router_create",
            "router_read",
            "router_write",
            "router_write_unsafe",
            "router_goto",
            "router_goto_if_exists"
        ]
    );
}
