//! Structured code fragments.
//!
//! Fragments are what the synthesizer hands to renderers: a parameter list, a sequence of
//! statements and an optional result expression. Expressions use the word-level primitives of
//! the EVM (shift, mask, load, store) with the operand order of the instruction set, i.e.
//! `shl(shift, value)` and `sub(a, b) = a - b`.

mod fragment_fmt;

use crate::index::{IndexVec, VarId};
use alloy_primitives::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Not,
    IsZero,
    MLoad,
    SLoad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    And,
    Or,
    Shl,
    Shr,
    Gt,
}

impl UnaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            UnaryOp::Not => "not",
            UnaryOp::IsZero => "iszero",
            UnaryOp::MLoad => "mload",
            UnaryOp::SLoad => "sload",
        }
    }
}

impl BinaryOp {
    pub fn mnemonic(self) -> &'static str {
        match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Mod => "mod",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
            BinaryOp::Gt => "gt",
        }
    }

    /// Evaluates the operation with EVM semantics (wrapping arithmetic, `x / 0 = 0`).
    pub fn eval(self, a: U256, b: U256) -> U256 {
        match self {
            BinaryOp::Add => a.wrapping_add(b),
            BinaryOp::Sub => a.wrapping_sub(b),
            BinaryOp::Mul => a.wrapping_mul(b),
            BinaryOp::Div => a.checked_div(b).unwrap_or(U256::ZERO),
            BinaryOp::Mod => a.checked_rem(b).unwrap_or(U256::ZERO),
            BinaryOp::And => a & b,
            BinaryOp::Or => a | b,
            BinaryOp::Shl => shift_amount(a).map_or(U256::ZERO, |s| b << s),
            BinaryOp::Shr => shift_amount(a).map_or(U256::ZERO, |s| b >> s),
            BinaryOp::Gt => bool_word(a > b),
        }
    }
}

fn bool_word(flag: bool) -> U256 {
    if flag { U256::from(1) } else { U256::ZERO }
}

fn shift_amount(shift: U256) -> Option<usize> {
    (shift < U256::from(256)).then(|| shift.to::<usize>())
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    Const(U256),
    Var(VarId),
    /// Code offset of a callable, resolved when the fragment is assembled.
    Label(String),
    Unary { op: UnaryOp, arg: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    pub fn konst(value: impl Into<U256>) -> Self {
        Expr::Const(value.into())
    }

    pub fn label(name: impl Into<String>) -> Self {
        Expr::Label(name.into())
    }

    pub fn as_const(&self) -> Option<U256> {
        match self {
            Expr::Const(value) => Some(*value),
            _ => None,
        }
    }

    fn is_const(&self, value: u64) -> bool {
        self.as_const() == Some(U256::from(value))
    }

    fn unary(op: UnaryOp, arg: Expr) -> Self {
        Expr::Unary { op, arg: Box::new(arg) }
    }

    fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        if let (Some(a), Some(b)) = (lhs.as_const(), rhs.as_const()) {
            return Expr::Const(op.eval(a, b));
        }
        Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
    }

    pub fn not(arg: Expr) -> Self {
        match arg.as_const() {
            Some(value) => Expr::Const(!value),
            None => Self::unary(UnaryOp::Not, arg),
        }
    }

    pub fn is_zero(arg: Expr) -> Self {
        match arg.as_const() {
            Some(value) => Expr::Const(bool_word(value.is_zero())),
            None => Self::unary(UnaryOp::IsZero, arg),
        }
    }

    pub fn mload(offset: Expr) -> Self {
        Self::unary(UnaryOp::MLoad, offset)
    }

    pub fn sload(slot: Expr) -> Self {
        Self::unary(UnaryOp::SLoad, slot)
    }

    pub fn add(a: Expr, b: Expr) -> Self {
        if a.is_const(0) {
            return b;
        }
        if b.is_const(0) {
            return a;
        }
        Self::binary(BinaryOp::Add, a, b)
    }

    pub fn sub(a: Expr, b: Expr) -> Self {
        if b.is_const(0) {
            return a;
        }
        Self::binary(BinaryOp::Sub, a, b)
    }

    /// Multiplications by a power of two become left shifts.
    pub fn mul(a: Expr, b: Expr) -> Self {
        let (value, factor) = match (a.as_const(), b.as_const()) {
            (Some(_), Some(_)) => return Self::binary(BinaryOp::Mul, a, b),
            (Some(factor), None) => (b, factor),
            (None, Some(factor)) => (a, factor),
            (None, None) => return Self::binary(BinaryOp::Mul, a, b),
        };
        if factor.is_zero() {
            return Expr::Const(U256::ZERO);
        }
        if factor.is_power_of_two() {
            return Self::shl(Expr::konst(U256::from(factor.trailing_zeros() as u64)), value);
        }
        Self::binary(BinaryOp::Mul, value, Expr::Const(factor))
    }

    /// Divisions by a power of two become right shifts.
    pub fn div(a: Expr, b: Expr) -> Self {
        match b.as_const() {
            Some(divisor) if a.as_const().is_none() && divisor.is_power_of_two() => {
                Self::shr(Expr::konst(U256::from(divisor.trailing_zeros() as u64)), a)
            }
            _ => Self::binary(BinaryOp::Div, a, b),
        }
    }

    /// Remainders by a power of two become masks.
    pub fn rem(a: Expr, b: Expr) -> Self {
        match b.as_const() {
            Some(divisor) if a.as_const().is_none() && divisor.is_power_of_two() => {
                Self::and(a, Expr::Const(divisor - U256::from(1)))
            }
            _ => Self::binary(BinaryOp::Mod, a, b),
        }
    }

    pub fn and(a: Expr, b: Expr) -> Self {
        if a.is_const(0) || b.is_const(0) {
            return Expr::Const(U256::ZERO);
        }
        if a.as_const() == Some(U256::MAX) {
            return b;
        }
        if b.as_const() == Some(U256::MAX) {
            return a;
        }
        Self::binary(BinaryOp::And, a, b)
    }

    pub fn or(a: Expr, b: Expr) -> Self {
        if a.is_const(0) {
            return b;
        }
        if b.is_const(0) {
            return a;
        }
        Self::binary(BinaryOp::Or, a, b)
    }

    pub fn shl(shift: Expr, value: Expr) -> Self {
        if shift.is_const(0) {
            return value;
        }
        if value.is_const(0) {
            return value;
        }
        Self::binary(BinaryOp::Shl, shift, value)
    }

    pub fn shr(shift: Expr, value: Expr) -> Self {
        if shift.is_const(0) {
            return value;
        }
        if value.is_const(0) {
            return value;
        }
        Self::binary(BinaryOp::Shr, shift, value)
    }

    pub fn gt(a: Expr, b: Expr) -> Self {
        Self::binary(BinaryOp::Gt, a, b)
    }

    /// Folds `exprs` with `or`, yielding `0` for an empty sequence.
    pub fn or_all(exprs: impl IntoIterator<Item = Expr>) -> Self {
        exprs.into_iter().reduce(Expr::or).unwrap_or(Expr::Const(U256::ZERO))
    }

    /// Visits every label referenced by the expression.
    pub fn labels<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expr::Label(name) => out.push(name),
            Expr::Const(_) | Expr::Var(_) => {}
            Expr::Unary { arg, .. } => arg.labels(out),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.labels(out);
                rhs.labels(out);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Let { var: VarId, value: Expr },
    MStore { offset: Expr, value: Expr },
    SStore { slot: Expr, value: Expr },
    Jump { target: Expr },
    /// Jumps to `target` when `cond` is nonzero, falls through otherwise.
    JumpIf { target: Expr, cond: Expr },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub name: String,
    pub vars: IndexVec<VarId, String>,
    /// Variables the caller provides, in calling order.
    pub params: Vec<VarId>,
    pub body: Vec<Stmt>,
    pub result: Option<Expr>,
}

impl Fragment {
    pub fn builder(name: impl Into<String>) -> FragmentBuilder {
        FragmentBuilder {
            fragment: Fragment {
                name: name.into(),
                vars: IndexVec::new(),
                params: Vec::new(),
                body: Vec::new(),
                result: None,
            },
        }
    }

    /// Labels referenced anywhere in the fragment, deduplicated in order of appearance.
    pub fn labels(&self) -> Vec<&str> {
        let mut out = Vec::new();
        for stmt in &self.body {
            match stmt {
                Stmt::Let { value, .. } => value.labels(&mut out),
                Stmt::MStore { offset: a, value: b } | Stmt::SStore { slot: a, value: b } => {
                    a.labels(&mut out);
                    b.labels(&mut out);
                }
                Stmt::Jump { target } => target.labels(&mut out),
                Stmt::JumpIf { target, cond } => {
                    target.labels(&mut out);
                    cond.labels(&mut out);
                }
            }
        }
        if let Some(result) = &self.result {
            result.labels(&mut out);
        }
        let mut seen = std::collections::HashSet::new();
        out.retain(|label| seen.insert(*label));
        out
    }
}

#[must_use]
pub struct FragmentBuilder {
    fragment: Fragment,
}

impl FragmentBuilder {
    pub fn param(&mut self, name: &str) -> VarId {
        let var = self.fragment.vars.push(name.to_string());
        self.fragment.params.push(var);
        var
    }

    /// Declares a `let` binding whose value is computed by the fragment itself.
    pub fn bind(&mut self, name: &str, value: Expr) -> VarId {
        let var = self.fragment.vars.push(name.to_string());
        self.fragment.body.push(Stmt::Let { var, value });
        var
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.fragment.body.push(stmt);
    }

    pub fn finish(mut self, result: Option<Expr>) -> Fragment {
        self.fragment.result = result;
        self.fragment
    }
}
