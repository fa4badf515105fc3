//! Mark (jump label) management for fragment labels
//!
//! evm-glue uses Mark for jump destinations. Every label a fragment references gets one mark,
//! shared by all fragments lowered in the same session.

use std::collections::HashMap;

/// Type alias for mark IDs used in evm-glue assembly
pub type MarkId = usize;

#[derive(Default)]
pub struct MarkAllocator {
    /// Maps label names to their mark ID
    label_marks: HashMap<String, MarkId>,
    /// Next available mark ID
    next_mark: MarkId,
}

impl MarkAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new anonymous mark ID
    pub fn allocate_mark(&mut self) -> MarkId {
        let mark = self.next_mark;
        self.next_mark += 1;
        mark
    }

    /// Get or allocate the mark for a label
    pub fn get_label_mark(&mut self, label: &str) -> MarkId {
        if let Some(&mark) = self.label_marks.get(label) {
            return mark;
        }
        let mark = self.allocate_mark();
        self.label_marks.insert(label.to_string(), mark);
        mark
    }

    /// Every label a mark was allocated for, placed or not.
    pub fn labels(&self) -> impl Iterator<Item = (&str, MarkId)> {
        self.label_marks.iter().map(|(label, &mark)| (label.as_str(), mark))
    }
}
