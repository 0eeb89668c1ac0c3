pub mod display;

use std::fmt;

pub use display::{Listing, Table};

/// Next-use sentinel: the value is never read again in this block.
pub const NO_NEXT_USE: u32 = u32::MAX;

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum Opcode {
    LoadI,
    Load,
    Store,
    Add,
    Sub,
    Mult,
    LShift,
    RShift,
    Output,
    Nop,
}

impl Opcode {
    pub fn from_mnemonic(word: &str) -> Option<Self> {
        let opcode = match word {
            "loadI" => Opcode::LoadI,
            "load" => Opcode::Load,
            "store" => Opcode::Store,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mult" => Opcode::Mult,
            "lshift" => Opcode::LShift,
            "rshift" => Opcode::RShift,
            "output" => Opcode::Output,
            "nop" => Opcode::Nop,
            _ => return None,
        };
        Some(opcode)
    }

    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::LoadI => "loadI",
            Opcode::Load => "load",
            Opcode::Store => "store",
            Opcode::Add => "add",
            Opcode::Sub => "sub",
            Opcode::Mult => "mult",
            Opcode::LShift => "lshift",
            Opcode::RShift => "rshift",
            Opcode::Output => "output",
            Opcode::Nop => "nop",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.mnemonic())
    }
}

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mult,
    LShift,
    RShift,
}

impl ArithOp {
    pub fn opcode(self) -> Opcode {
        match self {
            ArithOp::Add => Opcode::Add,
            ArithOp::Sub => Opcode::Sub,
            ArithOp::Mult => Opcode::Mult,
            ArithOp::LShift => Opcode::LShift,
            ArithOp::RShift => Opcode::RShift,
        }
    }

    pub fn from_opcode(opcode: Opcode) -> Option<Self> {
        match opcode {
            Opcode::Add => Some(ArithOp::Add),
            Opcode::Sub => Some(ArithOp::Sub),
            Opcode::Mult => Some(ArithOp::Mult),
            Opcode::LShift => Some(ArithOp::LShift),
            Opcode::RShift => Some(ArithOp::RShift),
            _ => None,
        }
    }

    /// Evaluates the operation with 64-bit wrapping semantics.
    pub fn apply(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            ArithOp::Add => lhs.wrapping_add(rhs),
            ArithOp::Sub => lhs.wrapping_sub(rhs),
            ArithOp::Mult => lhs.wrapping_mul(rhs),
            ArithOp::LShift => lhs.checked_shl(rhs as u32).unwrap_or(0),
            ArithOp::RShift => lhs.checked_shr(rhs as u32).unwrap_or(0),
        }
    }
}

/// Which register name of an operand a pass reads or prints.
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub enum View {
    Source,
    Virtual,
    Physical,
}

/// A register operand.
///
/// `sr` comes from the input text, `vr`/`nu`/`dirty` from next-use analysis
/// and `pr`/`spilled` from the allocator.
#[derive(Debug, PartialEq, Clone, Copy, Eq)]
pub struct Operand {
    pub sr: Option<u32>,
    pub vr: Option<u32>,
    pub pr: Option<u32>,
    pub nu: u32,
    pub dirty: bool,
    pub spilled: bool,
}

impl Default for Operand {
    fn default() -> Self {
        Operand {
            sr: None,
            vr: None,
            pr: None,
            nu: NO_NEXT_USE,
            dirty: false,
            spilled: false,
        }
    }
}

impl Operand {
    pub fn source(sr: u32) -> Self {
        Operand {
            sr: Some(sr),
            ..Default::default()
        }
    }

    pub fn physical(pr: u32) -> Self {
        Operand {
            pr: Some(pr),
            ..Default::default()
        }
    }

    pub fn reg(&self, view: View) -> Option<u32> {
        match view {
            View::Source => self.sr,
            View::Virtual => self.vr,
            View::Physical => self.pr,
        }
    }

    pub fn is_last_use(&self) -> bool {
        self.nu == NO_NEXT_USE
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum Instr {
    LoadI { value: i64, dst: Operand },
    Load { addr: Operand, dst: Operand },
    Store { value: Operand, addr: Operand },
    Arith {
        op: ArithOp,
        lhs: Operand,
        rhs: Operand,
        dst: Operand,
    },
    Output { addr: i64 },
    Nop,
}

impl Instr {
    pub fn opcode(&self) -> Opcode {
        match self {
            Instr::LoadI { .. } => Opcode::LoadI,
            Instr::Load { .. } => Opcode::Load,
            Instr::Store { .. } => Opcode::Store,
            Instr::Arith { op, .. } => op.opcode(),
            Instr::Output { .. } => Opcode::Output,
            Instr::Nop => Opcode::Nop,
        }
    }

    /// Source operands in `src1`, `src2` order.
    pub fn sources(&self) -> [Option<&Operand>; 2] {
        match self {
            Instr::Load { addr, .. } => [Some(addr), None],
            Instr::Store { value, addr } => [Some(value), Some(addr)],
            Instr::Arith { lhs, rhs, .. } => [Some(lhs), Some(rhs)],
            Instr::LoadI { .. } | Instr::Output { .. } | Instr::Nop => [None, None],
        }
    }

    pub fn sources_mut(&mut self) -> [Option<&mut Operand>; 2] {
        match self {
            Instr::Load { addr, .. } => [Some(addr), None],
            Instr::Store { value, addr } => [Some(value), Some(addr)],
            Instr::Arith { lhs, rhs, .. } => [Some(lhs), Some(rhs)],
            Instr::LoadI { .. } | Instr::Output { .. } | Instr::Nop => [None, None],
        }
    }

    pub fn dst(&self) -> Option<&Operand> {
        match self {
            Instr::LoadI { dst, .. } | Instr::Load { dst, .. } | Instr::Arith { dst, .. } => {
                Some(dst)
            }
            Instr::Store { .. } | Instr::Output { .. } | Instr::Nop => None,
        }
    }

    pub fn dst_mut(&mut self) -> Option<&mut Operand> {
        match self {
            Instr::LoadI { dst, .. } | Instr::Load { dst, .. } | Instr::Arith { dst, .. } => {
                Some(dst)
            }
            Instr::Store { .. } | Instr::Output { .. } | Instr::Nop => None,
        }
    }

    /// All register operands: the sources followed by the destination.
    pub fn operands(&self) -> impl Iterator<Item = &Operand> {
        let [src1, src2] = self.sources();
        src1.into_iter().chain(src2).chain(self.dst())
    }
}

/// An instruction and its position in the block it was parsed from.
#[derive(Debug, PartialEq, Clone)]
pub struct Line {
    pub index: usize,
    pub instr: Instr,
}

/// A straight-line block of instructions in program order.
#[derive(Default, Debug, PartialEq, Clone)]
pub struct Block {
    lines: Vec<Line>,
}

impl Block {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a block numbering the instructions by position.
    pub fn from_instrs(instrs: Vec<Instr>) -> Self {
        let lines = instrs
            .into_iter()
            .enumerate()
            .map(|(index, instr)| Line { index, instr })
            .collect();
        Block { lines }
    }

    pub fn push(&mut self, index: usize, instr: Instr) {
        self.lines.push(Line { index, instr });
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn lines_mut(&mut self) -> &mut [Line] {
        &mut self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn instrs(&self) -> impl DoubleEndedIterator<Item = &Instr> {
        self.lines.iter().map(|line| &line.instr)
    }

    /// One past the highest register number used in the given view.
    pub fn register_count(&self, view: View) -> usize {
        self.instrs()
            .flat_map(|instr| instr.operands())
            .filter_map(|op| op.reg(view))
            .map(|reg| reg as usize + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn listing(&self, view: View) -> Listing<'_> {
        Listing::new(self, view)
    }

    pub fn table(&self) -> Table<'_> {
        Table::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;

    #[test]
    fn test_operand_order() {
        let instr = store(3, 4);
        let [src1, src2] = instr.sources();
        assert_eq!(src1.and_then(|op| op.sr), Some(3));
        assert_eq!(src2.and_then(|op| op.sr), Some(4));
        assert!(instr.dst().is_none());

        let instr = arith(ArithOp::Sub, 1, 2, 5);
        let srs: Vec<_> = instr.operands().filter_map(|op| op.sr).collect();
        assert_eq!(srs, vec![1, 2, 5]);
    }

    #[test]
    fn test_opcodes() {
        assert_eq!(loadi(1, 1).opcode(), Opcode::LoadI);
        assert_eq!(arith(ArithOp::RShift, 1, 2, 3).opcode(), Opcode::RShift);
        assert_eq!(Instr::Output { addr: 0 }.opcode(), Opcode::Output);
        for opcode in [Opcode::Add, Opcode::Sub, Opcode::Mult, Opcode::LShift, Opcode::RShift] {
            assert_eq!(ArithOp::from_opcode(opcode).map(ArithOp::opcode), Some(opcode));
            assert_eq!(Opcode::from_mnemonic(opcode.mnemonic()), Some(opcode));
        }
        assert_eq!(ArithOp::from_opcode(Opcode::Load), None);
    }

    #[test]
    fn test_arith_apply() {
        assert_eq!(ArithOp::Add.apply(2, 3), 5);
        assert_eq!(ArithOp::Sub.apply(2, 3), -1);
        assert_eq!(ArithOp::Mult.apply(4, 3), 12);
        assert_eq!(ArithOp::LShift.apply(3, 2), 12);
        assert_eq!(ArithOp::RShift.apply(12, 2), 3);
        assert_eq!(ArithOp::LShift.apply(1, 64), 0);
        assert_eq!(ArithOp::Add.apply(i64::MAX, 1), i64::MIN);
    }

    #[test]
    fn test_register_count() {
        let block = Block::from_instrs(vec![loadi(5, 7), arith(ArithOp::Add, 7, 7, 2)]);
        assert_eq!(block.register_count(View::Source), 8);
        assert_eq!(block.register_count(View::Physical), 0);
        assert_eq!(block.lines()[1].index, 1);
    }
}
