//! Memory slots for fragment variables
//!
//! Memory layout:
//! - 0x00-0x7F: Reserved EVM scratch space
//! - 0x80+: Fragment variables (32 bytes each, indexed by `VarId`)
//!
//! Slots are reused by every fragment; a variable only lives while its fragment runs.

use dispatch_data::{Idx, VarId};

/// Type alias for EVM memory addresses
pub type MemoryAddress = u32;

pub mod constants {
    use super::MemoryAddress;

    pub const VARS_START: MemoryAddress = 0x80;
    pub const SLOT_SIZE: MemoryAddress = 0x20;
}

/// Memory address of `var`.
pub fn var_address(var: VarId) -> MemoryAddress {
    constants::VARS_START + constants::SLOT_SIZE * var.index() as MemoryAddress
}
