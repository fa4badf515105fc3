use super::{GotoMode, OperationSynthesizer};
use dispatch_data::{Expr, FUNCTION_POINTER_BITS, Fragment, Result, Stmt};

impl OperationSynthesizer {
    /// Decodes the element as a code offset and transfers control to it. Jump tables hold
    /// function pointers, so the element width is fixed.
    pub fn goto(&self, name: &str, mode: GotoMode) -> Result<Fragment> {
        self.geometry.require_width(FUNCTION_POINTER_BITS)?;

        let mut builder = Fragment::builder(name);
        let element = self.element(&mut builder, false);
        let decoded = self.extract(&element);

        match mode {
            GotoMode::Always => {
                builder.push(Stmt::Jump { target: decoded });
                Ok(builder.finish(None))
            }
            GotoMode::IfExists => {
                let target = Expr::Var(builder.bind("target", decoded));
                builder.push(Stmt::JumpIf { target: target.clone(), cond: target.clone() });
                Ok(builder.finish(Some(Expr::gt(target, Expr::konst(0u64)))))
            }
        }
    }
}
