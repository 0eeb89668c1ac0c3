use crate::error::{Error, Result};
use crate::frontend::tokenizer::{Lexeme, Token};
use crate::ir::{ArithOp, Block, Instr, Opcode, Operand};

pub struct Parser;

impl Parser {
    pub fn parse(tokens: &[Lexeme]) -> Result<Block> {
        if tokens.is_empty() {
            return Err(Error::syntax(1, "no instructions found"));
        }

        let mut cursor = Cursor { tokens, pos: 0 };
        let mut block = Block::new();

        // Each instruction starts with its mnemonic
        while let Some(lexeme) = cursor.advance() {
            let line = lexeme.line;
            let opcode = match lexeme.token {
                Token::Opcode(opcode) => opcode,
                ref other => {
                    return Err(Error::syntax(
                        line,
                        format!("expected an instruction, found {other}"),
                    ));
                }
            };

            let instr = match opcode {
                Opcode::LoadI => {
                    let value = cursor.constant(line)?;
                    cursor.arrow(line)?;
                    let dst = cursor.register(line)?;
                    Instr::LoadI { value, dst }
                }
                Opcode::Load => {
                    let addr = cursor.register(line)?;
                    cursor.arrow(line)?;
                    let dst = cursor.register(line)?;
                    Instr::Load { addr, dst }
                }
                Opcode::Store => {
                    let value = cursor.register(line)?;
                    cursor.arrow(line)?;
                    let addr = cursor.register(line)?;
                    Instr::Store { value, addr }
                }
                Opcode::Output => Instr::Output {
                    addr: cursor.constant(line)?,
                },
                Opcode::Nop => Instr::Nop,
                Opcode::Add | Opcode::Sub | Opcode::Mult | Opcode::LShift | Opcode::RShift => {
                    let lhs = cursor.register(line)?;
                    cursor.comma(line)?;
                    let rhs = cursor.register(line)?;
                    cursor.arrow(line)?;
                    let dst = cursor.register(line)?;
                    let op = ArithOp::from_opcode(opcode)
                        .ok_or_else(|| Error::syntax(line, format!("{opcode} is not arithmetic")))?;
                    Instr::Arith { op, lhs, rhs, dst }
                }
            };

            block.push(block.len(), instr);
        }

        Ok(block)
    }
}

struct Cursor<'a> {
    tokens: &'a [Lexeme],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn advance(&mut self) -> Option<&'a Lexeme> {
        let lexeme = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(lexeme)
    }

    // Takes the next token, reporting a truncated instruction against `line`
    fn expect(&mut self, line: usize, what: &str) -> Result<&'a Lexeme> {
        self.advance()
            .ok_or_else(|| Error::syntax(line, format!("expected {what}, found end of input")))
    }

    fn register(&mut self, line: usize) -> Result<Operand> {
        let lexeme = self.expect(line, "a register")?;
        match lexeme.token {
            Token::Register(sr) => Ok(Operand::source(sr)),
            ref other => Err(Error::syntax(
                lexeme.line,
                format!("expected a register, found {other}"),
            )),
        }
    }

    fn constant(&mut self, line: usize) -> Result<i64> {
        let lexeme = self.expect(line, "a constant")?;
        match lexeme.token {
            Token::Constant(value) => Ok(value),
            ref other => Err(Error::syntax(
                lexeme.line,
                format!("expected a constant, found {other}"),
            )),
        }
    }

    fn arrow(&mut self, line: usize) -> Result<()> {
        self.punct(line, Token::Arrow, "'=>'")
    }

    fn comma(&mut self, line: usize) -> Result<()> {
        self.punct(line, Token::Comma, "','")
    }

    fn punct(&mut self, line: usize, want: Token, what: &str) -> Result<()> {
        let lexeme = self.expect(line, what)?;
        if lexeme.token == want {
            Ok(())
        } else {
            Err(Error::syntax(
                lexeme.line,
                format!("expected {what}, found {}", lexeme.token),
            ))
        }
    }
}
