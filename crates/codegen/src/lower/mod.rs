//! Lowering of fragments to EVM assembly
//!
//! Fragment variables live in memory slots (see [`slots`]): callers store the parameters of a
//! fragment before running it, `let` bindings are stored by the fragment itself. Expressions are
//! evaluated on the stack and a result expression is left on top of it. Labels become pushed mark
//! references; the caller places the matching jump destinations with [`Lowering::emit_label`].

mod helpers;
pub mod marks;
pub mod slots;

pub use helpers::{push_const, push_mark};

use dispatch_data::{BinaryOp, Expr, Fragment, Stmt, UnaryOp, VarId};
use evm_glue::{assembly::Asm, opcodes::Opcode};
use log::trace;
use marks::{MarkAllocator, MarkId};
use slots::MemoryAddress;

/// Initial capacity estimate: most fragments lower to a few dozen instructions.
const ASM_INITIAL_CAPACITY: usize = 32;

/// Assembly of one fragment.
pub struct LoweredFragment {
    pub asm: Vec<Asm>,
    /// Memory slot of every parameter, in calling order.
    pub param_slots: Vec<(String, MemoryAddress)>,
    /// Whether the fragment leaves a result on the stack.
    pub has_result: bool,
}

impl LoweredFragment {
    pub fn param_slot(&self, name: &str) -> Option<MemoryAddress> {
        self.param_slots.iter().find(|(param, _)| param == name).map(|&(_, slot)| slot)
    }
}

/// Lowering session. Fragments lowered by the same session share label marks, so a label
/// referenced by several fragments resolves to one jump destination.
#[derive(Default)]
pub struct Lowering {
    marks: MarkAllocator,
}

impl Lowering {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark of `label`, allocated on first use.
    pub fn label_mark(&mut self, label: &str) -> MarkId {
        self.marks.get_label_mark(label)
    }

    pub fn marks(&self) -> &MarkAllocator {
        &self.marks
    }

    pub fn lower(&mut self, fragment: &Fragment) -> LoweredFragment {
        let mut asm = Vec::with_capacity(ASM_INITIAL_CAPACITY);
        for stmt in &fragment.body {
            self.lower_stmt(stmt, &mut asm);
        }
        if let Some(result) = &fragment.result {
            self.lower_expr(result, &mut asm);
        }
        trace!("lowered `{}` to {} instructions", fragment.name, asm.len());

        let param_slots = fragment
            .params
            .iter()
            .map(|&var| (fragment.vars[var].clone(), slots::var_address(var)))
            .collect();
        LoweredFragment { asm, param_slots, has_result: fragment.result.is_some() }
    }

    fn lower_stmt(&mut self, stmt: &Stmt, asm: &mut Vec<Asm>) {
        match stmt {
            Stmt::Let { var, value } => {
                self.lower_expr(value, asm);
                self.store_var(*var, asm);
            }
            Stmt::MStore { offset, value } => {
                self.lower_expr(value, asm);
                self.lower_expr(offset, asm);
                asm.push(Asm::Op(Opcode::MSTORE));
            }
            Stmt::SStore { slot, value } => {
                self.lower_expr(value, asm);
                self.lower_expr(slot, asm);
                asm.push(Asm::Op(Opcode::SSTORE));
            }
            Stmt::Jump { target } => match target {
                Expr::Label(label) => {
                    let mark = self.label_mark(label);
                    self.emit_jump(mark, asm);
                }
                _ => {
                    self.lower_expr(target, asm);
                    asm.push(Asm::Op(Opcode::JUMP));
                }
            },
            Stmt::JumpIf { target, cond } => {
                self.lower_expr(cond, asm);
                match target {
                    Expr::Label(label) => {
                        let mark = self.label_mark(label);
                        self.emit_jumpi(mark, asm);
                    }
                    _ => {
                        self.lower_expr(target, asm);
                        asm.push(Asm::Op(Opcode::JUMPI));
                    }
                }
            }
        }
    }

    /// Evaluates `expr` onto the stack. Operands are pushed last to first, so the first operand
    /// ends up on top as the instructions expect.
    fn lower_expr(&mut self, expr: &Expr, asm: &mut Vec<Asm>) {
        match expr {
            Expr::Const(value) => push_const(*value, asm),
            Expr::Var(var) => self.load_var(*var, asm),
            Expr::Label(label) => {
                let mark = self.label_mark(label);
                push_mark(mark, asm);
            }
            Expr::Unary { op, arg } => {
                self.lower_expr(arg, asm);
                asm.push(Asm::Op(unary_opcode(*op)));
            }
            Expr::Binary { op, lhs, rhs } => {
                self.lower_expr(rhs, asm);
                self.lower_expr(lhs, asm);
                asm.push(Asm::Op(binary_opcode(*op)));
            }
        }
    }

    fn load_var(&mut self, var: VarId, asm: &mut Vec<Asm>) {
        push_const(slots::var_address(var).into(), asm);
        asm.push(Asm::Op(Opcode::MLOAD));
    }

    fn store_var(&mut self, var: VarId, asm: &mut Vec<Asm>) {
        // Stack: [value]
        push_const(slots::var_address(var).into(), asm);
        // Stack: [value, addr]
        asm.push(Asm::Op(Opcode::MSTORE));
    }
}

/// Lowers a single fragment in a session of its own.
pub fn lower_fragment(fragment: &Fragment) -> LoweredFragment {
    Lowering::new().lower(fragment)
}

fn unary_opcode(op: UnaryOp) -> Opcode {
    match op {
        UnaryOp::Not => Opcode::NOT,
        UnaryOp::IsZero => Opcode::ISZERO,
        UnaryOp::MLoad => Opcode::MLOAD,
        UnaryOp::SLoad => Opcode::SLOAD,
    }
}

fn binary_opcode(op: BinaryOp) -> Opcode {
    match op {
        BinaryOp::Add => Opcode::ADD,
        BinaryOp::Sub => Opcode::SUB,
        BinaryOp::Mul => Opcode::MUL,
        BinaryOp::Div => Opcode::DIV,
        BinaryOp::Mod => Opcode::MOD,
        BinaryOp::And => Opcode::AND,
        BinaryOp::Or => Opcode::OR,
        BinaryOp::Shl => Opcode::SHL,
        BinaryOp::Shr => Opcode::SHR,
        BinaryOp::Gt => Opcode::GT,
    }
}
