use std::collections::HashMap;

use log::debug;

use crate::error::{Error, Result};
use crate::ir::{Block, Instr, Operand, View};
use crate::scheduler::latency;

/// Observable behaviour of a simulated block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    /// Values printed by `output`, in order.
    pub outputs: Vec<i64>,
    /// Sum of instruction latencies.
    pub cycles: u64,
}

struct Machine {
    view: View,
    registers: HashMap<u32, i64>,
    memory: HashMap<i64, i64>,
    index: usize,
}

impl Machine {
    fn new(view: View) -> Self {
        Machine {
            view,
            registers: HashMap::new(),
            memory: HashMap::new(),
            index: 0,
        }
    }

    fn name(&self, op: &Operand) -> Result<u32> {
        op.reg(self.view)
            .ok_or(Error::Unannotated { index: self.index })
    }

    fn read(&self, op: &Operand) -> Result<i64> {
        let reg = self.name(op)?;
        self.registers
            .get(&reg)
            .copied()
            .ok_or(Error::UndefinedRegister {
                index: self.index,
                reg,
            })
    }

    fn write(&mut self, op: &Operand, value: i64) -> Result<()> {
        let reg = self.name(op)?;
        self.registers.insert(reg, value);
        Ok(())
    }

    // Memory is zero until written
    fn load(&self, addr: i64) -> i64 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    fn step(&mut self, instr: &Instr, outputs: &mut Vec<i64>) -> Result<()> {
        match instr {
            Instr::LoadI { value, dst } => self.write(dst, *value)?,
            Instr::Load { addr, dst } => {
                let value = self.load(self.read(addr)?);
                self.write(dst, value)?;
            }
            Instr::Store { value, addr } => {
                let value = self.read(value)?;
                let addr = self.read(addr)?;
                self.memory.insert(addr, value);
            }
            Instr::Arith { op, lhs, rhs, dst } => {
                let result = op.apply(self.read(lhs)?, self.read(rhs)?);
                self.write(dst, result)?;
            }
            Instr::Output { addr } => outputs.push(self.load(*addr)),
            Instr::Nop => {}
        }
        Ok(())
    }
}

/// Executes `block`, naming registers by `view`.
pub fn run(block: &Block, view: View) -> Result<Execution> {
    let mut machine = Machine::new(view);
    let mut outputs = Vec::new();
    let mut cycles = 0;

    for line in block.lines() {
        machine.index = line.index;
        machine.step(&line.instr, &mut outputs)?;
        cycles += u64::from(latency(line.instr.opcode()));
    }

    debug!("simulated {} instructions in {cycles} cycles", block.len());
    Ok(Execution { outputs, cycles })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{BottomUp, RegisterAllocator};
    use crate::test_helpers::*;

    #[test]
    fn test_run_outputs_and_cycles() {
        let block = parse(
            "loadI 3 => r1
             loadI 4 => r2
             add r1, r2 => r3
             mult r1, r2 => r4
             add r3, r4 => r5
             loadI 1024 => r6
             store r5 => r6
             output 1024",
        );
        let execution = run(&block, View::Source).unwrap();
        assert_eq!(execution.outputs, vec![19]);
        // 5 single-cycle instructions, one mult, one store, one output
        assert_eq!(execution.cycles, 1 + 1 + 1 + 2 + 1 + 1 + 3 + 1);
    }

    #[test]
    fn test_run_memory() {
        let block = parse(
            "loadI 100 => r1
             loadI 7 => r2
             store r2 => r1
             load r1 => r3
             lshift r3, r2 => r4
             rshift r4, r2 => r5
             sub r5, r3 => r6
             store r6 => r1
             output 100
             output 104",
        );
        assert_eq!(run(&block, View::Source).unwrap().outputs, vec![0, 0]);

        let block = parse("loadI 100 => r1\nloadI 7 => r2\nstore r2 => r1\noutput 100");
        assert_eq!(run(&block, View::Source).unwrap().outputs, vec![7]);
    }

    #[test]
    fn test_run_undefined_register() {
        let block = parse("loadI 1 => r1\nadd r1, r9 => r2");
        match run(&block, View::Source) {
            Err(Error::UndefinedRegister { index, reg }) => {
                assert_eq!(index, 1);
                assert_eq!(reg, 9);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_run_missing_view() {
        let block = parse("loadI 1 => r1");
        assert!(matches!(
            run(&block, View::Physical),
            Err(Error::Unannotated { index: 0 })
        ));
    }

    #[test]
    fn test_allocated_code_matches_source() {
        let src = "loadI 1024 => r1
                   load r1 => r2
                   loadI 5 => r3
                   loadI 6 => r4
                   add r3, r4 => r5
                   add r5, r2 => r6
                   loadI 2048 => r7
                   store r6 => r7
                   output 2048";
        let block = annotated(src);
        let expected = run(&block, View::Source).unwrap();
        assert_eq!(expected.outputs, vec![11]);
        assert_eq!(run(&block, View::Virtual).unwrap().outputs, vec![11]);

        for k in 3..6 {
            let allocation = BottomUp::new(k).unwrap().allocate(&block).unwrap();
            let actual = run(&allocation.block, View::Physical).unwrap();
            assert_eq!(actual.outputs, expected.outputs, "k = {k}");
            assert!(actual.cycles >= expected.cycles);
        }
    }
}
