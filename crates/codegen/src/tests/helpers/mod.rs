pub mod builders;

// Re-export commonly used items for convenience
pub use builders::{
    Arg, CallId, EvmBuilder, FragmentProgram, TableRun, callable_layout, empty_layout,
    execute_bytecode, geometry, literal_layout, result_address, synthesizer, table_arg,
};
pub use constants::*;
