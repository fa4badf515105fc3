use super::{OperationSynthesizer, Place, WriteMode};
use dispatch_data::{Expr, Fragment, Stmt};

impl OperationSynthesizer {
    /// Writes `value`, masked to the element width, at a reduced position.
    pub fn write(&self, name: &str, mode: WriteMode) -> Fragment {
        let mut builder = Fragment::builder(name);
        let element = self.element(&mut builder, true);
        let value = Expr::Var(builder.param("value"));

        let positioned = Expr::shl(element.shift.clone(), Expr::and(value, self.mask()));
        let kept = match mode {
            WriteMode::Safe => {
                let hole = Expr::not(Expr::shl(element.shift.clone(), self.mask()));
                Expr::and(element.word, hole)
            }
            WriteMode::Unsafe => element.word,
        };
        let merged = Expr::or(kept, positioned);

        match element.place {
            Place::Value => builder.finish(Some(merged)),
            Place::Memory { addr } => {
                builder.push(Stmt::MStore { offset: addr, value: merged });
                builder.finish(None)
            }
            Place::Storage { slot } => {
                builder.push(Stmt::SStore { slot, value: merged });
                builder.finish(None)
            }
        }
    }
}
