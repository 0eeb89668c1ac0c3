use crate::ir::{ArithOp, Block, Instr, Operand};

// Helpers to build blocks over source registers for testing

pub fn loadi(value: i64, dst: u32) -> Instr {
    Instr::LoadI {
        value,
        dst: Operand::source(dst),
    }
}
pub fn load(addr: u32, dst: u32) -> Instr {
    Instr::Load {
        addr: Operand::source(addr),
        dst: Operand::source(dst),
    }
}
pub fn store(value: u32, addr: u32) -> Instr {
    Instr::Store {
        value: Operand::source(value),
        addr: Operand::source(addr),
    }
}
pub fn arith(op: ArithOp, lhs: u32, rhs: u32, dst: u32) -> Instr {
    Instr::Arith {
        op,
        lhs: Operand::source(lhs),
        rhs: Operand::source(rhs),
        dst: Operand::source(dst),
    }
}
pub fn output(addr: i64) -> Instr {
    Instr::Output { addr }
}
pub fn nop() -> Instr {
    Instr::Nop
}

/// Parses ILOC text, panicking on malformed input.
pub fn parse(src: &str) -> Block {
    crate::frontend::parse(src).expect("failed to parse")
}

/// Parses ILOC text and runs next-use analysis over it.
pub fn annotated(src: &str) -> Block {
    let mut block = parse(src);
    crate::liveness::annotate(&mut block).expect("next-use analysis failed");
    block
}
