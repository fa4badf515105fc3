//! Binding of callable entries and literal values to packed tables.

mod doc;

use crate::{
    layout,
    ops::{OperationBundle, OperationSynthesizer},
    reducer::{SearchOptions, SelectorReducer},
};
use alloy_primitives::U256;
use dispatch_data::{
    ArrayLocation, ElementKind, Expr, FUNCTION_POINTER_BITS, Fragment, Member, MemberValue,
    ReductionMode, Result, Selector, SynthError, TableLayout, TableLocation, WordGeometry,
};
use log::{debug, warn};

/// Prefix of generated wrapper labels.
pub const WRAPPER_PREFIX: &str = "__dispatch_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    External,
    Public,
    Internal,
    Private,
}

impl Visibility {
    /// Only externally callable entries are dispatched to.
    pub fn is_callable(self) -> bool {
        matches!(self, Visibility::External | Visibility::Public)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub selector: Selector,
    pub visibility: Visibility,
    /// Storage the entry operates on, passed in by its wrapper.
    pub storage: Option<String>,
}

impl Entry {
    pub fn new(name: impl Into<String>, selector: Selector, visibility: Visibility) -> Self {
        Self { name: name.into(), selector, visibility, storage: None }
    }

    pub fn with_storage(mut self, binding: impl Into<String>) -> Self {
        self.storage = Some(binding.into());
        self
    }

    /// External entries cannot be referenced from inside the contract and entries bound to
    /// storage need their storage argument supplied, both go through a wrapper.
    pub fn needs_wrapper(&self) -> bool {
        self.visibility == Visibility::External || self.storage.is_some()
    }

    /// Label the table points at for this entry.
    pub fn target_label(&self) -> String {
        if self.needs_wrapper() {
            format!("{WRAPPER_PREFIX}{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// A literal value keyed by a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueEntry {
    pub label: String,
    pub selector: Selector,
    pub value: U256,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Search a magic modulus. When the search fails the table either falls back to indexed
    /// positions or fails with [`SynthError::SearchExhausted`].
    Magic { options: SearchOptions, fallback_to_indexed: bool },
    Indexed,
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::Magic { options: SearchOptions::default(), fallback_to_indexed: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    pub name: String,
    /// Shape of the packed values. Function tables pack code offsets and need 16 bits.
    pub element: ElementKind,
    pub strategy: Strategy,
    /// Defaults to a word value for single segment tables and to memory otherwise.
    pub location: Option<TableLocation>,
}

impl TableConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element: ElementKind::FunctionPointer,
            strategy: Strategy::default(),
            location: None,
        }
    }
}

/// An entry with its computed position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundEntry {
    pub label: String,
    pub selector: Selector,
    pub position: u32,
    pub value: MemberValue,
}

/// A wrapper the caller has to emit for an entry the table cannot point at directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperStub {
    pub label: String,
    pub target: String,
    pub storage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchTable {
    pub name: String,
    pub reduction: ReductionMode,
    pub geometry: WordGeometry,
    pub location: TableLocation,
    pub layout: TableLayout,
    /// In input order.
    pub entries: Vec<BoundEntry>,
    pub wrappers: Vec<WrapperStub>,
    pub ops: OperationBundle,
    /// Computes the position of a raw selector, absent for indexed tables.
    pub position: Option<Fragment>,
}

pub struct DispatchBinder {
    config: TableConfig,
}

impl DispatchBinder {
    pub fn new(config: TableConfig) -> Self {
        Self { config }
    }

    /// Binds the callable entries among `entries` to a jump table.
    pub fn bind_functions(&self, entries: &[Entry]) -> Result<DispatchTable> {
        let callable: Vec<&Entry> = entries.iter().filter(|e| e.visibility.is_callable()).collect();
        if callable.is_empty() {
            return Err(SynthError::NoCallableEntries);
        }
        debug!(
            "table `{}`: {} of {} entries are callable",
            self.config.name,
            callable.len(),
            entries.len()
        );

        let wrappers = callable
            .iter()
            .filter(|entry| entry.needs_wrapper())
            .map(|entry| WrapperStub {
                label: entry.target_label(),
                target: entry.name.clone(),
                storage: entry.storage.clone(),
            })
            .collect();
        let keyed = callable
            .iter()
            .map(|entry| {
                (entry.name.clone(), entry.selector, MemberValue::Callable(entry.target_label()))
            })
            .collect();
        self.bind(keyed, wrappers, true)
    }

    /// Binds literal values to a lookup table.
    pub fn bind_values(&self, values: &[ValueEntry]) -> Result<DispatchTable> {
        if values.is_empty() {
            return Err(SynthError::EmptyTable);
        }
        let keyed = values
            .iter()
            .map(|entry| (entry.label.clone(), entry.selector, MemberValue::Literal(entry.value)))
            .collect();
        self.bind(keyed, Vec::new(), false)
    }

    fn bind(
        &self,
        keyed: Vec<(String, Selector, MemberValue)>,
        wrappers: Vec<WrapperStub>,
        jumps: bool,
    ) -> Result<DispatchTable> {
        let config = &self.config;
        let mut geometry = WordGeometry::for_kind(&config.element)?;
        if jumps {
            // Narrower elements would truncate code offsets.
            geometry = geometry.require_width(FUNCTION_POINTER_BITS)?;
        }
        let selectors: Vec<Selector> = keyed.iter().map(|(_, selector, _)| *selector).collect();
        let reduction = self.reduction(&selectors, geometry)?;
        debug!("table `{}`: {reduction}", config.name);

        let entries: Vec<BoundEntry> = keyed
            .into_iter()
            .enumerate()
            .map(|(ordinal, (label, selector, value))| BoundEntry {
                position: reduction.position_of(selector, ordinal),
                label,
                selector,
                value,
            })
            .collect();
        let members = entries
            .iter()
            .map(|entry| Member::new(entry.position, entry.value.clone(), entry.label.as_str()))
            .collect();
        let layout = layout::plan(members, geometry)?;

        let location = config.location.unwrap_or(if layout.is_single_segment() {
            TableLocation::Word
        } else {
            TableLocation::Array(ArrayLocation::Memory)
        });
        let synthesizer = OperationSynthesizer::new(geometry, location)?;
        let ops = synthesizer.bundle(&config.name, &layout, jumps)?;
        let position = self.position_fragment(reduction);

        Ok(DispatchTable {
            name: config.name.clone(),
            reduction,
            geometry,
            location,
            layout,
            entries,
            wrappers,
            ops,
            position,
        })
    }

    fn position_fragment(&self, reduction: ReductionMode) -> Option<Fragment> {
        let mut builder = Fragment::builder(format!("{}_position", self.config.name));
        let selector = Expr::Var(builder.param("selector"));
        reduction.position_expr(selector).map(|position| builder.finish(Some(position)))
    }

    fn reduction(&self, selectors: &[Selector], geometry: WordGeometry) -> Result<ReductionMode> {
        match self.config.strategy {
            Strategy::Indexed => Ok(SelectorReducer::indexed(selectors)),
            Strategy::Magic { options, fallback_to_indexed } => {
                match SelectorReducer::new(options, geometry).reduce(selectors) {
                    Some(mode) => Ok(mode),
                    None if fallback_to_indexed => {
                        warn!(
                            "table `{}`: no magic modulus up to {}, falling back to indexed positions",
                            self.config.name, options.max_modulus
                        );
                        Ok(SelectorReducer::indexed(selectors))
                    }
                    None => Err(SynthError::SearchExhausted {
                        max_modulus: options.max_modulus,
                        keys: selectors.len(),
                    }),
                }
            }
        }
    }
}
