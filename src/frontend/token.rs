use std::fmt;

use crate::ir::Opcode;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Opcode(Opcode),
    Register(u32),
    Constant(i64),
    Comma,
    Arrow,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lexeme {
    pub token: Token,
    pub line: usize,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Opcode(opcode) => write!(f, "INSTRUCTION {opcode}"),
            Token::Register(reg) => write!(f, "REGISTER r{reg}"),
            Token::Constant(value) => write!(f, "CONSTANT {value}"),
            Token::Comma => f.write_str("COMMA"),
            Token::Arrow => f.write_str("ARROW"),
        }
    }
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.line, self.token)
    }
}
