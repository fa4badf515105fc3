use super::DispatchTable;
use dispatch_data::ReductionMode;
use std::fmt::Write;

const COLUMN_GAP: usize = 2;

impl DispatchTable {
    /// Comment block listing every entry with its position, sorted by position. Magic tables also
    /// show the reduction arithmetic of each selector.
    pub fn doc_comment(&self) -> String {
        let mut rows = vec![["name".to_string(), "selector".to_string(), "position".to_string()]];
        let mut entries: Vec<_> = self.entries.iter().collect();
        entries.sort_by_key(|entry| entry.position);
        rows.extend(entries.into_iter().map(|entry| {
            let position = match self.reduction {
                ReductionMode::Indexed { .. } => entry.position.to_string(),
                ReductionMode::Magic { modulus, .. } => format!(
                    "{:#x} % {modulus} = {}",
                    self.reduction.slice(entry.selector),
                    entry.position
                ),
            };
            [entry.label.clone(), entry.selector.to_string(), position]
        }));

        let widths: [usize; 2] = [0, 1].map(|column| {
            rows.iter().map(|row| row[column].len()).max().unwrap_or(0) + COLUMN_GAP
        });

        let mut out = String::new();
        let _ = writeln!(
            out,
            "// {}: {}, {} word(s) of {}-bit elements",
            self.name,
            self.reduction,
            self.layout.segment_count(),
            self.geometry.element_bits()
        );
        for [name, selector, position] in &rows {
            let _ = writeln!(
                out,
                "// {name:<name_width$}{selector:<selector_width$}{position}",
                name_width = widths[0],
                selector_width = widths[1]
            );
        }
        out
    }
}
