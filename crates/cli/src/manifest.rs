//! JSON description of the tables to generate.

use alloy_primitives::U256;
use dispatch_codegen::{Entry, SearchOptions, Strategy, TableConfig, ValueEntry, Visibility};
use dispatch_data::{ArrayLocation, ElementKind, ParseSelectorError, Selector, TableLocation};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("malformed manifest: {0}")]
    Json(#[from] serde_json::Error),
    #[error("table `{table}`: {source}")]
    Selector {
        table: String,
        #[source]
        source: ParseSelectorError,
    },
    #[error("table `{table}`: invalid value `{value}` for `{label}`")]
    Value { table: String, label: String, value: String },
    #[error("table `{0}` lists both functions and values")]
    MixedTable(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategySpec {
    #[default]
    Magic,
    Indexed,
}

/// Element shape, e.g. `"bool"`, `{ "uint": 24 }` or `{ "struct": [{ "uint": 16 }, "bool"] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindSpec {
    Uint(u32),
    Bool,
    Enum(u32),
    Struct(Vec<KindSpec>),
    Array { element: Box<KindSpec>, len: u32 },
    DynamicArray(Box<KindSpec>),
    Bytes,
    Function,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSpec {
    Word,
    Memory,
    Storage,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilitySpec {
    External,
    #[default]
    Public,
    Internal,
    Private,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FunctionSpec {
    pub name: String,
    pub selector: String,
    #[serde(default)]
    pub visibility: VisibilitySpec,
    pub storage: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValueSpec {
    pub label: String,
    pub selector: String,
    /// Decimal or `0x` prefixed hex.
    pub value: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    pub name: String,
    /// Function tables default to code offsets, value tables to 16-bit integers.
    pub element: Option<KindSpec>,
    #[serde(default)]
    pub strategy: StrategySpec,
    #[serde(default = "default_true")]
    pub allow_slicing: bool,
    pub max_modulus: Option<u64>,
    #[serde(default = "default_true")]
    pub fallback_to_indexed: bool,
    pub location: Option<LocationSpec>,
    #[serde(default)]
    pub functions: Vec<FunctionSpec>,
    #[serde(default)]
    pub values: Vec<ValueSpec>,
}

/// What a table binds, resolved from its spec.
pub enum TableInput {
    Functions(Vec<Entry>),
    Values(Vec<ValueEntry>),
}

fn default_true() -> bool {
    true
}

impl Manifest {
    pub fn parse(source: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(source)?)
    }
}

impl From<VisibilitySpec> for Visibility {
    fn from(spec: VisibilitySpec) -> Self {
        match spec {
            VisibilitySpec::External => Visibility::External,
            VisibilitySpec::Public => Visibility::Public,
            VisibilitySpec::Internal => Visibility::Internal,
            VisibilitySpec::Private => Visibility::Private,
        }
    }
}

impl From<&KindSpec> for ElementKind {
    fn from(spec: &KindSpec) -> Self {
        match spec {
            KindSpec::Uint(bits) => ElementKind::Uint { bits: *bits },
            KindSpec::Bool => ElementKind::Bool,
            KindSpec::Enum(variants) => ElementKind::Enum { variants: *variants },
            KindSpec::Struct(fields) => {
                ElementKind::Struct { fields: fields.iter().map(ElementKind::from).collect() }
            }
            KindSpec::Array { element, len } => {
                let element = Box::new(ElementKind::from(element.as_ref()));
                ElementKind::FixedArray { element, len: *len }
            }
            KindSpec::DynamicArray(element) => {
                ElementKind::DynamicArray { element: Box::new(ElementKind::from(element.as_ref())) }
            }
            KindSpec::Bytes => ElementKind::Bytes,
            KindSpec::Function => ElementKind::FunctionPointer,
        }
    }
}

impl From<LocationSpec> for TableLocation {
    fn from(spec: LocationSpec) -> Self {
        match spec {
            LocationSpec::Word => TableLocation::Word,
            LocationSpec::Memory => TableLocation::Array(ArrayLocation::Memory),
            LocationSpec::Storage => TableLocation::Array(ArrayLocation::Storage),
        }
    }
}

impl TableSpec {
    pub fn config(&self) -> TableConfig {
        let strategy = match self.strategy {
            StrategySpec::Indexed => Strategy::Indexed,
            StrategySpec::Magic => {
                let defaults = SearchOptions::default();
                let options = SearchOptions {
                    allow_slicing: self.allow_slicing,
                    max_modulus: self.max_modulus.unwrap_or(defaults.max_modulus),
                    ..defaults
                };
                Strategy::Magic { options, fallback_to_indexed: self.fallback_to_indexed }
            }
        };
        let element = match &self.element {
            Some(kind) => kind.into(),
            None if self.values.is_empty() => ElementKind::FunctionPointer,
            None => ElementKind::Uint { bits: 16 },
        };
        TableConfig {
            element,
            strategy,
            location: self.location.map(TableLocation::from),
            ..TableConfig::new(self.name.as_str())
        }
    }

    pub fn input(&self) -> Result<TableInput, ManifestError> {
        if !self.functions.is_empty() && !self.values.is_empty() {
            return Err(ManifestError::MixedTable(self.name.clone()));
        }
        if !self.values.is_empty() {
            let values = self.values.iter().map(|spec| self.value_entry(spec));
            return values.collect::<Result<_, _>>().map(TableInput::Values);
        }
        self.functions
            .iter()
            .map(|spec| {
                let selector = self.selector(&spec.selector)?;
                let entry = Entry::new(spec.name.as_str(), selector, spec.visibility.into());
                Ok(match &spec.storage {
                    Some(storage) => entry.with_storage(storage.as_str()),
                    None => entry,
                })
            })
            .collect::<Result<_, _>>()
            .map(TableInput::Functions)
    }

    fn value_entry(&self, spec: &ValueSpec) -> Result<ValueEntry, ManifestError> {
        let value = spec.value.parse::<U256>().map_err(|_| ManifestError::Value {
            table: self.name.clone(),
            label: spec.label.clone(),
            value: spec.value.clone(),
        })?;
        let selector = self.selector(&spec.selector)?;
        Ok(ValueEntry { label: spec.label.clone(), selector, value })
    }

    fn selector(&self, text: &str) -> Result<Selector, ManifestError> {
        text.parse()
            .map_err(|source| ManifestError::Selector { table: self.name.clone(), source })
    }
}
