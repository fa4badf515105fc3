//! A generation run over several tables.

use crate::binder::{DispatchBinder, DispatchTable, Entry, TableConfig, ValueEntry};
use dispatch_data::{ConstantPool, Result, Stmt};
use log::info;

/// Collects the tables of one run and the constants they define. A table that fails to bind is
/// not added and leaves the run untouched.
#[derive(Default)]
pub struct Generation {
    tables: Vec<DispatchTable>,
    constants: ConstantPool,
}

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind_functions(
        &mut self,
        config: TableConfig,
        entries: &[Entry],
    ) -> Result<&DispatchTable> {
        let table = DispatchBinder::new(config).bind_functions(entries)?;
        Ok(self.add(table))
    }

    pub fn bind_values(
        &mut self,
        config: TableConfig,
        values: &[ValueEntry],
    ) -> Result<&DispatchTable> {
        let table = DispatchBinder::new(config).bind_values(values)?;
        Ok(self.add(table))
    }

    pub fn tables(&self) -> &[DispatchTable] {
        &self.tables
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    /// Interns the element mask and every constant table word of `table`.
    fn add(&mut self, table: DispatchTable) -> &DispatchTable {
        let bits = table.geometry.element_bits();
        self.constants.intern(format!("ELEMENT_MASK_{bits}"), table.geometry.element_mask());

        let prefix = table.name.to_ascii_uppercase();
        if let Some(word) = table.ops.create.result.as_ref().and_then(|result| result.as_const()) {
            self.constants.intern(format!("{prefix}_TABLE"), word);
        }
        let stored = table.ops.create.body.iter().filter_map(|stmt| match stmt {
            Stmt::MStore { value, .. } | Stmt::SStore { value, .. } => value.as_const(),
            _ => None,
        });
        for (i, word) in stored.enumerate() {
            self.constants.intern(format!("{prefix}_SEGMENT_{i}"), word);
        }

        info!("table `{}` bound with {} entries", table.name, table.entries.len());
        self.tables.push(table);
        &self.tables[self.tables.len() - 1]
    }
}
