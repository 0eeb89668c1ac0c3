pub mod parser;
pub mod token;
pub mod tokenizer;

use crate::error::Result;
use crate::ir::Block;

/// Tokenizes and parses ILOC text into a block of source-register code.
pub fn parse(input: &str) -> Result<Block> {
    let tokens = tokenizer::Tokenizer::tokenize(input)?;
    parser::Parser::parse(&tokens)
}
