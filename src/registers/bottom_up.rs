use log::{debug, info, trace};

use crate::error::{Error, Result};
use crate::ir::{Block, Instr, NO_NEXT_USE, Operand};

use super::{
    AllocStats, Allocation, RegisterAllocator, SCRATCH_REGISTER, SPILL_BASE, SPILL_SLOT_SIZE,
};

// Eviction costs, cheapest first
const REMAT_COST: i64 = 1;
const CLEAN_COST: i64 = 3;
const DIRTY_COST: i64 = 6;

/// Local bottom-up allocator over `k` physical registers.
///
/// Walks the block once, binding virtual registers to physical ones on
/// demand. When none is free it evicts the register whose value is cheapest
/// to bring back and farthest from its next use.
#[derive(Debug, Clone, Copy)]
pub struct BottomUp {
    k: usize,
}

impl BottomUp {
    pub fn new(k: usize) -> Result<Self> {
        if k < 2 {
            return Err(Error::TooFewRegisters { k });
        }
        Ok(BottomUp { k })
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

impl RegisterAllocator for BottomUp {
    fn allocate(&self, block: &Block) -> Result<Allocation> {
        let vr_count = vr_count(block)?;
        let mut state = State::new(self.k, vr_count);

        for line in block.lines() {
            state.allocate_line(line.index, &line.instr)?;
            debug_assert!(state.bindings_consistent(), "bindings diverged at {}", line.index);
        }

        let stats = state.stats;
        info!("allocated {} instructions with k = {}: {stats}", block.len(), self.k);

        Ok(Allocation {
            block: state.output,
            stats,
        })
    }
}

/// One past the highest virtual register, checking every operand has one.
fn vr_count(block: &Block) -> Result<usize> {
    let mut count = 0;
    for line in block.lines() {
        for op in line.instr.operands() {
            let vr = op.vr.ok_or(Error::Unannotated { index: line.index })?;
            count = count.max(vr as usize + 1);
        }
    }
    Ok(count)
}

fn scratch() -> Operand {
    Operand::physical(SCRATCH_REGISTER)
}

struct State {
    k: usize,
    vr_to_pr: Vec<Option<u32>>,
    vr_to_memory: Vec<Option<i64>>,
    vr_remat: Vec<Option<i64>>,
    pr_to_vr: Vec<Option<u32>>,
    pr_next: Vec<u32>,
    free: Vec<u32>,
    reserved: Vec<bool>,
    next_spill_location: i64,
    current: usize,
    output: Block,
    stats: AllocStats,
}

impl State {
    fn new(k: usize, vr_count: usize) -> Self {
        State {
            k,
            vr_to_pr: vec![None; vr_count],
            vr_to_memory: vec![None; vr_count],
            vr_remat: vec![None; vr_count],
            pr_to_vr: vec![None; k],
            pr_next: vec![NO_NEXT_USE; k],
            // popped from the back, so the highest register goes first
            free: (1..k as u32).collect(),
            reserved: vec![false; k],
            next_spill_location: SPILL_BASE,
            current: 0,
            output: Block::new(),
            stats: AllocStats::default(),
        }
    }

    fn allocate_line(&mut self, index: usize, instr: &Instr) -> Result<()> {
        self.current = index;
        let mut instr = instr.clone();

        // Registers already holding this line's values must survive it
        self.reserved.fill(false);
        for op in instr.operands() {
            if let Some(pr) = op.vr.and_then(|vr| self.vr_to_pr[vr as usize]) {
                self.reserved[pr as usize] = true;
            }
        }

        for src in instr.sources_mut().into_iter().flatten() {
            self.process_operand(src)?;
        }

        for src in instr.sources().into_iter().flatten() {
            if src.is_last_use() {
                if let Some(pr) = src.pr {
                    self.free_pr(pr);
                }
            }
        }

        match &instr {
            Instr::LoadI { value, dst } => {
                if let Some(vr) = dst.vr {
                    self.vr_remat[vr as usize] = Some(*value);
                }
            }
            Instr::Load { addr, dst } if !dst.dirty => {
                if let (Some(addr), Some(dst)) = (addr.vr, dst.vr) {
                    self.vr_to_memory[dst as usize] = self.vr_remat[addr as usize];
                }
            }
            _ => {}
        }

        self.reserved.fill(false);
        if let Some(dst) = instr.dst_mut() {
            let vr = dst.vr.ok_or(Error::Unannotated { index })?;
            let pr = self.get_pr(vr)?;
            self.pr_next[pr as usize] = dst.nu;
            dst.pr = Some(pr);
        }

        self.output.push(index, instr);
        trace!(
            "after {index}: pr_to_vr {:?} pr_next {:?} free {:?}",
            self.pr_to_vr, self.pr_next, self.free
        );
        Ok(())
    }

    /// Makes a source operand resident, restoring its value if it was evicted.
    fn process_operand(&mut self, op: &mut Operand) -> Result<()> {
        let vr = op.vr.ok_or(Error::Unannotated {
            index: self.current,
        })?;

        let pr = match self.vr_to_pr[vr as usize] {
            Some(pr) => pr,
            None => {
                let pr = self.get_pr(vr)?;
                let v = vr as usize;
                if self.vr_remat[v].is_some() || self.vr_to_memory[v].is_some() {
                    self.restore_register(vr, pr)?;
                    op.spilled = true;
                }
                pr
            }
        };

        op.pr = Some(pr);
        self.pr_next[pr as usize] = op.nu;
        Ok(())
    }

    fn free_pr(&mut self, pr: u32) {
        let Some(vr) = self.pr_to_vr[pr as usize].take() else {
            return;
        };
        self.vr_to_pr[vr as usize] = None;
        self.pr_next[pr as usize] = NO_NEXT_USE;
        self.free.push(pr);
        debug!("{}: freed r{pr} (vr{vr})", self.current);
    }

    fn get_pr(&mut self, vr: u32) -> Result<u32> {
        let pr = match self.free.pop() {
            Some(pr) => pr,
            None => {
                let victim = self.pick_victim()?;
                if let Some(old) = self.pr_to_vr[victim as usize] {
                    self.spill_register(old, victim);
                }
                victim
            }
        };

        self.reserved[pr as usize] = true;
        self.pr_next[pr as usize] = NO_NEXT_USE;
        self.vr_to_pr[vr as usize] = Some(pr);
        self.pr_to_vr[pr as usize] = Some(vr);
        debug!("{}: vr{vr} -> r{pr}", self.current);
        Ok(pr)
    }

    fn cost(&self, vr: u32) -> i64 {
        let v = vr as usize;
        if self.vr_remat[v].is_some() {
            REMAT_COST
        } else if self.vr_to_memory[v].is_some() {
            CLEAN_COST
        } else {
            DIRTY_COST
        }
    }

    /// The unreserved register with the lowest eviction score. Ties go to
    /// the lowest register number.
    fn pick_victim(&self) -> Result<u32> {
        let mut best: Option<(i64, u32)> = None;
        for pr in 1..self.k as u32 {
            if self.reserved[pr as usize] {
                continue;
            }
            let Some(vr) = self.pr_to_vr[pr as usize] else {
                continue;
            };
            let distance = i64::from(self.pr_next[pr as usize]) - self.current as i64;
            let score = self.cost(vr) - distance;
            if best.is_none_or(|(min, _)| score < min) {
                best = Some((score, pr));
            }
        }

        best.map(|(_, pr)| pr).ok_or(Error::AllocationExhausted {
            index: self.current,
            k: self.k,
        })
    }

    fn spill_register(&mut self, vr: u32, pr: u32) {
        let v = vr as usize;
        if self.vr_remat[v].is_some() || self.vr_to_memory[v].is_some() {
            self.stats.clean_evictions += 1;
            debug!("{}: evicted vr{vr} from r{pr} without a store", self.current);
        } else {
            let addr = self.next_spill_location;
            self.next_spill_location += SPILL_SLOT_SIZE;
            self.vr_to_memory[v] = Some(addr);
            self.emit(Instr::LoadI {
                value: addr,
                dst: scratch(),
            });
            self.emit(Instr::Store {
                value: Operand::physical(pr),
                addr: scratch(),
            });
            self.stats.spill_stores += 1;
            self.stats.spill_slots += 1;
            debug!("{}: spilled vr{vr} from r{pr} to {addr}", self.current);
        }

        self.vr_to_pr[v] = None;
        self.pr_to_vr[pr as usize] = None;
    }

    fn restore_register(&mut self, vr: u32, pr: u32) -> Result<()> {
        let v = vr as usize;
        if let Some(value) = self.vr_remat[v] {
            self.emit(Instr::LoadI {
                value,
                dst: Operand::physical(pr),
            });
            self.stats.rematerializations += 1;
            debug!("{}: rematerialized vr{vr} = {value} into r{pr}", self.current);
        } else {
            let addr = self.vr_to_memory[v].ok_or(Error::MissingSpillLocation {
                index: self.current,
                vr,
            })?;
            self.emit(Instr::LoadI {
                value: addr,
                dst: scratch(),
            });
            self.emit(Instr::Load {
                addr: scratch(),
                dst: Operand::physical(pr),
            });
            self.stats.restores += 1;
            debug!("{}: restored vr{vr} from {addr} into r{pr}", self.current);
        }

        self.vr_to_pr[v] = Some(pr);
        self.pr_to_vr[pr as usize] = Some(vr);
        self.pr_next[pr as usize] = NO_NEXT_USE - 1;
        Ok(())
    }

    fn emit(&mut self, instr: Instr) {
        self.output.push(self.current, instr);
    }

    fn bindings_consistent(&self) -> bool {
        let forward = self.vr_to_pr.iter().enumerate().all(|(vr, pr)| match pr {
            Some(pr) => self.pr_to_vr[*pr as usize] == Some(vr as u32),
            None => true,
        });
        let backward = self.pr_to_vr.iter().enumerate().all(|(pr, vr)| match vr {
            Some(vr) => {
                pr != SCRATCH_REGISTER as usize && self.vr_to_pr[*vr as usize] == Some(pr as u32)
            }
            None => true,
        });
        let free_unbound = self.free.iter().all(|pr| self.pr_to_vr[*pr as usize].is_none());
        forward && backward && free_unbound
    }
}
