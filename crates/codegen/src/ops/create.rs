use super::OperationSynthesizer;
use dispatch_data::{
    ArrayLocation, Expr, Fragment, Result, Segment, Stmt, SynthError, TableLayout, TableLocation,
};

impl OperationSynthesizer {
    /// Builds the table's words from the layout.
    ///
    /// Word tables yield the single word as the result. Array tables store every word, empty
    /// segments included, so the created table never depends on what was there before.
    pub fn create(&self, name: &str, layout: &TableLayout) -> Result<Fragment> {
        if layout.segments.is_empty() {
            return Err(SynthError::EmptyTable);
        }
        let mut builder = Fragment::builder(name);

        match self.location {
            TableLocation::Word => {
                if !layout.is_single_segment() {
                    return Err(SynthError::TooManyValues {
                        values: layout.members().count(),
                        capacity: self.geometry.elements_per_word(),
                    });
                }
                let word = self.segment_word(&layout.segments.raw[0]);
                Ok(builder.finish(Some(word)))
            }
            TableLocation::Array(location) => {
                let base = Expr::Var(builder.param("base"));
                for (i, segment) in layout.segments.iter().enumerate() {
                    let index = Expr::konst(i as u64);
                    let offset = Expr::add(
                        base.clone(),
                        self.geometry.segment_offset_expr(index, location),
                    );
                    let value = self.segment_word(segment);
                    builder.push(match location {
                        ArrayLocation::Memory => Stmt::MStore { offset, value },
                        ArrayLocation::Storage => Stmt::SStore { slot: offset, value },
                    });
                }
                Ok(builder.finish(None))
            }
        }
    }

    /// `or` over every member shifted into its slot. Folds to a constant for literal members.
    pub fn segment_word(&self, segment: &Segment) -> Expr {
        Expr::or_all(segment.members.iter().map(|packed| {
            let shift = Expr::konst(u64::from(self.geometry.bits_from_right(packed.slot)));
            Expr::shl(shift, packed.member.value.to_expr())
        }))
    }
}
