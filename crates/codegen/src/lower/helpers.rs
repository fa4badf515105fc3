//! Helper methods for assembly generation

use super::{Lowering, marks::MarkId};
use alloy_primitives::U256;
use evm_glue::{
    assembly::{Asm, MarkRef, RefType},
    opcodes::Opcode,
};

/// Pushes `value` with the smallest PUSH opcode.
pub fn push_const(value: U256, asm: &mut Vec<Asm>) {
    if value.is_zero() {
        asm.push(Asm::Op(Opcode::PUSH0));
        return;
    }

    let trimmed = value.to_be_bytes_trimmed_vec();

    macro_rules! push_n {
        ($($n:literal => $opcode:ident),* $(,)?) => {
            match trimmed.len() {
                $($n => {
                    let mut arr = [0u8; $n];
                    arr.copy_from_slice(&trimmed);
                    asm.push(Asm::Op(Opcode::$opcode(arr)));
                })*
                _ => asm.push(Asm::Op(Opcode::PUSH32(value.to_be_bytes()))),
            }
        };
    }

    push_n!(
        1 => PUSH1, 2 => PUSH2, 3 => PUSH3, 4 => PUSH4, 5 => PUSH5, 6 => PUSH6, 7 => PUSH7,
        8 => PUSH8, 9 => PUSH9, 10 => PUSH10, 11 => PUSH11, 12 => PUSH12, 13 => PUSH13,
        14 => PUSH14, 15 => PUSH15, 16 => PUSH16, 17 => PUSH17, 18 => PUSH18, 19 => PUSH19,
        20 => PUSH20, 21 => PUSH21, 22 => PUSH22, 23 => PUSH23, 24 => PUSH24, 25 => PUSH25,
        26 => PUSH26, 27 => PUSH27, 28 => PUSH28, 29 => PUSH29, 30 => PUSH30, 31 => PUSH31,
    );
}

/// Pushes the code offset of `mark`.
pub fn push_mark(mark: MarkId, asm: &mut Vec<Asm>) {
    let mark_ref = MarkRef { ref_type: RefType::Direct(mark), is_pushed: true, set_size: None };
    asm.push(Asm::Ref(mark_ref));
}

impl Lowering {
    /// Emit a jump destination mark
    pub fn emit_mark(&mut self, mark: MarkId, asm: &mut Vec<Asm>) {
        // Emit the mark for evm-glue to track
        asm.push(Asm::Mark(mark));
        // Emit JUMPDEST opcode - required by EVM at jump targets
        asm.push(Asm::Op(Opcode::JUMPDEST));
    }

    /// Places the jump destination of `label`.
    pub fn emit_label(&mut self, label: &str, asm: &mut Vec<Asm>) {
        let mark = self.label_mark(label);
        self.emit_mark(mark, asm);
    }

    /// Emit an unconditional jump
    pub fn emit_jump(&mut self, mark: MarkId, asm: &mut Vec<Asm>) {
        push_mark(mark, asm);
        asm.push(Asm::Op(Opcode::JUMP));
    }

    /// Emit a conditional jump (non-zero = jump). Expects the condition on the stack.
    pub fn emit_jumpi(&mut self, mark: MarkId, asm: &mut Vec<Asm>) {
        push_mark(mark, asm);
        asm.push(Asm::Op(Opcode::JUMPI));
    }
}
