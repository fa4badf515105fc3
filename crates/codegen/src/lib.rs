//! Packed dispatch table synthesis for the EVM
//!
//! Turns a static set of selectors and their values into a packed table and the code fragments
//! operating on it:
//!
//! 1. [`reducer`] finds a reduction of the selectors into dense positions, either a magic
//!    modulus over a bit window of the selectors or plain input order.
//! 2. [`layout`] places every position in a word (segment) and an element slot within it.
//! 3. [`ops`] derives the create, read, write and goto fragments from the geometry.
//! 4. [`binder`] drives the above for a list of callable entries or literal values and renders
//!    the documentation block of the resulting table.
//!
//! ## Word Layout
//! Elements are packed from the most significant end: slot `0` occupies the top bits of a word.
//! Tables spanning several words are kept in memory (byte addressed, every element readable as the
//! top of the word loaded at its byte offset) or in consecutive storage slots.
//!
//! ## Fragments
//! Fragments are structured, not rendered; [`lower`] turns them into `evm_glue` assembly.

pub mod binder;
pub mod generation;
pub mod layout;
pub mod lower;
pub mod ops;
pub mod reducer;


pub use binder::{
    BoundEntry, DispatchBinder, DispatchTable, Entry, Strategy, TableConfig, ValueEntry,
    Visibility, WrapperStub,
};
pub use generation::Generation;
pub use lower::{LoweredFragment, Lowering, lower_fragment};
pub use ops::{GotoMode, OperationBundle, OperationSynthesizer, WriteMode};
pub use reducer::{SearchOptions, SelectorReducer, find_modulus};
