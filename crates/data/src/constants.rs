//! Constants shared by the tables of one generation run.

use crate::index::{ConstId, IndexLinearSet, IndexVec};
use alloy_primitives::U256;

/// Interning table guaranteeing at most one definition per distinct constant value. The first
/// name a value is interned under is the one it keeps.
#[derive(Default)]
pub struct ConstantPool {
    values: IndexLinearSet<ConstId, U256>,
    names: IndexVec<ConstId, String>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interns `value`, returning the id of its single definition.
    pub fn intern(&mut self, name: impl Into<String>, value: U256) -> ConstId {
        match self.values.add(value) {
            Ok(id) => {
                let name_id = self.names.push(name.into());
                debug_assert_eq!(id, name_id);
                id
            }
            Err(existing) => existing,
        }
    }

    pub fn name(&self, id: ConstId) -> &str {
        &self.names[id]
    }

    pub fn value(&self, id: ConstId) -> U256 {
        self.values[id]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Definitions in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, U256)> {
        self.names.iter().zip(self.values.iter()).map(|(name, value)| (name.as_str(), *value))
    }
}
