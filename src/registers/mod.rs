pub mod bottom_up;

use std::fmt;

use crate::error::Result;
use crate::ir::Block;

pub use bottom_up::BottomUp;

/// Physical register holding spill addresses. Never allocated to a value.
pub const SCRATCH_REGISTER: u32 = 0;
/// First address of the spill area.
pub const SPILL_BASE: i64 = 32768;
/// Bytes per spill slot.
pub const SPILL_SLOT_SIZE: i64 = 4;

/// Counters describing the spill code an allocation inserted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AllocStats {
    /// Evictions that wrote the value to a fresh spill slot.
    pub spill_stores: usize,
    /// Evictions of values that could be recomputed or reloaded.
    pub clean_evictions: usize,
    /// Values reloaded from memory.
    pub restores: usize,
    /// Values rebuilt with `loadI`.
    pub rematerializations: usize,
    pub spill_slots: usize,
}

impl fmt::Display for AllocStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} spill stores, {} clean evictions, {} restores, {} rematerializations, {} spill slots",
            self.spill_stores,
            self.clean_evictions,
            self.restores,
            self.rematerializations,
            self.spill_slots
        )
    }
}

/// The result of register allocation: physical-register code plus counters.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub block: Block,
    pub stats: AllocStats,
}

pub trait RegisterAllocator {
    /// Rewrites an annotated block to use physical registers only.
    fn allocate(&self, block: &Block) -> Result<Allocation>;
}
