//! Next-use analysis.
//!
//! A single backward pass over a block that renames source registers into
//! virtual registers (one per live range) and records, for every register
//! operand, the index of the next instruction that reads the same value.

use std::collections::HashMap;

use indexmap::IndexMap;
use log::{debug, trace};

use crate::error::{Error, Result};
use crate::ir::{Block, NO_NEXT_USE, Opcode, Operand};

/// Summary of an annotation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Liveness {
    /// Number of virtual registers handed out.
    pub vr_count: usize,
    /// Values live on entry to each instruction, in program order.
    pub live: Vec<usize>,
}

impl Liveness {
    /// Peak register pressure over the block.
    pub fn max_live(&self) -> usize {
        self.live.iter().copied().max().unwrap_or(0)
    }
}

#[derive(Default)]
struct NextUse {
    sr_to_vr: IndexMap<u32, u32>,
    last_use: HashMap<u32, u32>,
    last_store: u32,
    next_vr: u32,
}

impl NextUse {
    fn update(&mut self, op: &mut Operand, index: u32) -> Option<u32> {
        let sr = op.sr?;
        let vr = match self.sr_to_vr.get(&sr) {
            Some(&vr) => vr,
            None => {
                let vr = self.next_vr;
                self.next_vr += 1;
                self.sr_to_vr.insert(sr, vr);
                vr
            }
        };

        op.vr = Some(vr);
        op.nu = self.last_use.get(&sr).copied().unwrap_or(NO_NEXT_USE);
        op.dirty = op.nu > self.last_store;
        self.last_use.insert(sr, index);
        Some(sr)
    }
}

/// Annotates every register operand of `block` with its virtual register,
/// next use and dirty flag.
///
/// Registers read before any write in the block are live on entry and get
/// their virtual register at their last use.
pub fn annotate(block: &mut Block) -> Result<Liveness> {
    if block.is_empty() {
        return Err(Error::EmptyBlock);
    }

    let mut state = NextUse::default();
    let mut live = vec![0; block.len()];

    for (pos, line) in block.lines_mut().iter_mut().enumerate().rev() {
        let index = line.index as u32;
        if line.instr.opcode() == Opcode::Store {
            state.last_store = index;
        }

        // A write opens the live range, so the definition is handled first
        if let Some(dst) = line.instr.dst_mut() {
            if let Some(sr) = state.update(dst, index) {
                state.sr_to_vr.shift_remove(&sr);
                state.last_use.insert(sr, NO_NEXT_USE);
            }
        }

        for src in line.instr.sources_mut().into_iter().flatten() {
            state.update(src, index);
        }

        live[pos] = state.sr_to_vr.len();
        trace!("line {index}: live {:?}", state.sr_to_vr);
    }

    let liveness = Liveness {
        vr_count: state.next_vr as usize,
        live,
    };
    debug!(
        "next-use: {} instructions, {} virtual registers, max live {}",
        block.len(),
        liveness.vr_count,
        liveness.max_live()
    );

    Ok(liveness)
}
