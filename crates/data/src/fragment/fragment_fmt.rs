use super::{Expr, Fragment, Stmt};
use crate::index::{IndexVec, VarId};
use alloy_primitives::U256;
use std::fmt;

fn fmt_const(f: &mut impl fmt::Write, value: U256) -> fmt::Result {
    if value < U256::from(0x100) { write!(f, "{value}") } else { write!(f, "{value:#x}") }
}

fn fmt_expr(f: &mut impl fmt::Write, expr: &Expr, vars: &IndexVec<VarId, String>) -> fmt::Result {
    match expr {
        Expr::Const(value) => fmt_const(f, *value),
        Expr::Var(var) => write!(f, "{}", vars[*var]),
        Expr::Label(name) => write!(f, "@{name}"),
        Expr::Unary { op, arg } => {
            write!(f, "{}(", op.mnemonic())?;
            fmt_expr(f, arg, vars)?;
            write!(f, ")")
        }
        Expr::Binary { op, lhs, rhs } => {
            write!(f, "{}(", op.mnemonic())?;
            fmt_expr(f, lhs, vars)?;
            write!(f, ", ")?;
            fmt_expr(f, rhs, vars)?;
            write!(f, ")")
        }
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn {}(", self.name)?;
        for (i, &param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.vars[param])?;
        }
        writeln!(f, ") {{")?;

        for stmt in &self.body {
            write!(f, "    ")?;
            match stmt {
                Stmt::Let { var, value } => {
                    write!(f, "let {} := ", self.vars[*var])?;
                    fmt_expr(f, value, &self.vars)?;
                }
                Stmt::MStore { offset: location, value }
                | Stmt::SStore { slot: location, value } => {
                    let mnemonic =
                        if matches!(stmt, Stmt::MStore { .. }) { "mstore" } else { "sstore" };
                    write!(f, "{mnemonic}(")?;
                    fmt_expr(f, location, &self.vars)?;
                    write!(f, ", ")?;
                    fmt_expr(f, value, &self.vars)?;
                    write!(f, ")")?;
                }
                Stmt::Jump { target } => {
                    write!(f, "jump(")?;
                    fmt_expr(f, target, &self.vars)?;
                    write!(f, ")")?;
                }
                Stmt::JumpIf { target, cond } => {
                    write!(f, "jumpi(")?;
                    fmt_expr(f, target, &self.vars)?;
                    write!(f, ", ")?;
                    fmt_expr(f, cond, &self.vars)?;
                    write!(f, ")")?;
                }
            }
            writeln!(f)?;
        }

        if let Some(result) = &self.result {
            write!(f, "    => ")?;
            fmt_expr(f, result, &self.vars)?;
            writeln!(f)?;
        }
        write!(f, "}}")
    }
}
