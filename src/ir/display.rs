use std::fmt;

use super::{Block, Instr, Operand, View};

/// Renders one instruction in ILOC syntax using the registers of `view`.
pub struct Render<'a> {
    pub instr: &'a Instr,
    pub view: View,
}

struct Reg<'a>(&'a Operand, View);

impl fmt::Display for Reg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.reg(self.1) {
            Some(reg) => write!(f, "r{reg}"),
            None => f.write_str("r?"),
        }
    }
}

impl fmt::Display for Render<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let view = self.view;
        match self.instr {
            Instr::LoadI { value, dst } => write!(f, "loadI {value} => {}", Reg(dst, view)),
            Instr::Load { addr, dst } => {
                write!(f, "load {} => {}", Reg(addr, view), Reg(dst, view))
            }
            Instr::Store { value, addr } => {
                write!(f, "store {} => {}", Reg(value, view), Reg(addr, view))
            }
            Instr::Arith { op, lhs, rhs, dst } => write!(
                f,
                "{} {}, {} => {}",
                op.opcode(),
                Reg(lhs, view),
                Reg(rhs, view),
                Reg(dst, view)
            ),
            Instr::Output { addr } => write!(f, "output {addr}"),
            Instr::Nop => f.write_str("nop"),
        }
    }
}

/// A block printed one instruction per line.
pub struct Listing<'a> {
    block: &'a Block,
    view: View,
}

impl<'a> Listing<'a> {
    pub fn new(block: &'a Block, view: View) -> Self {
        Listing { block, view }
    }
}

impl fmt::Display for Listing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instr in self.block.instrs() {
            writeln!(
                f,
                "{}",
                Render {
                    instr,
                    view: self.view
                }
            )?;
        }
        Ok(())
    }
}

/// A block of source-register code printed as a table.
pub struct Table<'a> {
    block: &'a Block,
}

impl<'a> Table<'a> {
    pub fn new(block: &'a Block) -> Self {
        Table { block }
    }
}

fn cell(op: &Operand) -> String {
    match op.sr {
        Some(sr) => format!("r{sr}"),
        None => "-".to_string(),
    }
}

impl fmt::Display for Table<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let none = || "-".to_string();
        for instr in self.block.instrs() {
            let (src1, src2, dst) = match instr {
                Instr::LoadI { value, dst } => (value.to_string(), none(), cell(dst)),
                Instr::Load { addr, dst } => (cell(addr), none(), cell(dst)),
                // a store writes memory through its address operand
                Instr::Store { value, addr } => (cell(value), none(), cell(addr)),
                Instr::Arith { lhs, rhs, dst, .. } => (cell(lhs), cell(rhs), cell(dst)),
                Instr::Output { addr } => (addr.to_string(), none(), none()),
                Instr::Nop => (none(), none(), none()),
            };
            writeln!(
                f,
                "| {:<6} | {:<4} | {:<4} | => | {:<4} |",
                instr.opcode(),
                src1,
                src2,
                dst
            )?;
        }
        Ok(())
    }
}
