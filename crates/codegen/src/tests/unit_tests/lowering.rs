//! Structure of lowered fragments

use crate::{
    lower::{Lowering, lower_fragment},
    ops::{GotoMode, WriteMode},
    tests::helpers::{callable_layout, synthesizer},
};
use dispatch_data::{ArrayLocation, TableLocation};
use evm_glue::{assembly::Asm, opcodes::Opcode};

fn count_ops(asm: &[Asm], matcher: impl Fn(&Opcode) -> bool) -> usize {
    asm.iter().filter(|op| matches!(op, Asm::Op(opcode) if matcher(opcode))).count()
}

#[test]
fn test_param_slots_follow_calling_order() {
    let write = synthesizer(16, TableLocation::Word).write("write", WriteMode::Safe);
    let lowered = lower_fragment(&write);
    // `shift` is bound between `key` and `value`, so `value` gets the fourth slot.
    assert_eq!(
        lowered.param_slots,
        vec![("word".to_string(), 0x80), ("key".to_string(), 0xa0), ("value".to_string(), 0xe0)]
    );
    assert!(lowered.has_result);
}

#[test]
fn test_array_writes_store_without_result() {
    let write = synthesizer(16, TableLocation::Array(ArrayLocation::Storage))
        .write("write", WriteMode::Unsafe);
    let lowered = lower_fragment(&write);
    assert!(!lowered.has_result);
    assert_eq!(count_ops(&lowered.asm, |op| matches!(op, Opcode::SSTORE)), 1);
    assert_eq!(count_ops(&lowered.asm, |op| matches!(op, Opcode::SLOAD)), 1);
    assert!(matches!(lowered.asm.last(), Some(Asm::Op(Opcode::SSTORE))));
}

#[test]
fn test_labels_share_marks_across_fragments() {
    let synth = synthesizer(16, TableLocation::Word);
    let layout = callable_layout(&[(0, "a"), (1, "b")]);
    let create = synth.create("create", &layout).unwrap();

    let mut lowering = Lowering::new();
    let first = lowering.lower(&create);
    let second = lowering.lower(&create);
    let refs = |asm: &[Asm]| asm.iter().filter(|op| matches!(op, Asm::Ref(_))).count();
    assert_eq!(refs(&first.asm), 2);
    assert_eq!(refs(&second.asm), 2);
    assert_eq!(lowering.marks().labels().count(), 2);
    assert_eq!(lowering.label_mark("a"), lowering.label_mark("a"));
}

#[test]
fn test_goto_ends_in_jump() {
    let goto = synthesizer(16, TableLocation::Word).goto("goto", GotoMode::Always).unwrap();
    let lowered = lower_fragment(&goto);
    assert!(!lowered.has_result);
    assert!(matches!(lowered.asm.last(), Some(Asm::Op(Opcode::JUMP))));

    let goto = synthesizer(16, TableLocation::Word).goto("goto", GotoMode::IfExists).unwrap();
    let lowered = lower_fragment(&goto);
    assert_eq!(count_ops(&lowered.asm, |op| matches!(op, Opcode::JUMPI)), 1);
    assert!(matches!(lowered.asm.last(), Some(Asm::Op(Opcode::GT))));
}
