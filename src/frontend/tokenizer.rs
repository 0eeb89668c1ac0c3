use crate::error::{Error, Result};
use crate::ir::Opcode;

pub use crate::frontend::token::{Lexeme, Token};

pub struct Tokenizer;

impl Tokenizer {
    pub fn tokenize(input: &str) -> Result<Vec<Lexeme>> {
        let bytes = input.as_bytes();
        let mut position = 0;
        let mut line = 1;
        let mut tokens = Vec::new();

        // Process the input until we've consumed it all
        while position < bytes.len() {
            position = Self::next_token(bytes, position, &mut line, &mut tokens)?;
        }

        if tokens.is_empty() {
            return Err(Error::syntax(line, "no instructions found"));
        }

        Ok(tokens)
    }

    // Try to extract the next token from the input starting at position
    fn next_token(
        input: &[u8],
        mut position: usize,
        line: &mut usize,
        tokens: &mut Vec<Lexeme>,
    ) -> Result<usize> {
        // Skip whitespace and comments
        while position < input.len() {
            match input[position] {
                b'\n' => {
                    *line += 1;
                    position += 1;
                }
                b'/' if input.get(position + 1) == Some(&b'/') => {
                    while position < input.len() && input[position] != b'\n' {
                        position += 1;
                    }
                }
                c if c.is_ascii_whitespace() => position += 1,
                _ => break,
            }
        }

        if position >= input.len() {
            return Ok(position);
        }

        let mut push = |token| {
            tokens.push(Lexeme { token, line: *line });
        };
        let next_char = input[position];

        // Mnemonics and registers
        if next_char.is_ascii_alphabetic() {
            let end_pos = Self::scan_while(input, position, |c| c.is_ascii_alphanumeric());
            let word = Self::text(input, position, end_pos);

            if let Some(digits) = word.strip_prefix('r') {
                if !digits.is_empty() && digits.bytes().all(|c| c.is_ascii_digit()) {
                    let reg = digits
                        .parse::<u32>()
                        .map_err(|e| Error::syntax(*line, format!("register {word}: {e}")))?;
                    push(Token::Register(reg));
                    return Ok(end_pos);
                }
            }

            return match Opcode::from_mnemonic(word) {
                Some(opcode) => {
                    push(Token::Opcode(opcode));
                    Ok(end_pos)
                }
                None => Err(Error::syntax(*line, format!("unknown word '{word}'"))),
            };
        }

        // Constants, optionally negative
        if next_char.is_ascii_digit()
            || (next_char == b'-' && input.get(position + 1).is_some_and(u8::is_ascii_digit))
        {
            let end_pos = Self::scan_while(input, position + 1, |c| c.is_ascii_digit());
            let num_str = Self::text(input, position, end_pos);
            let num = num_str
                .parse::<i64>()
                .map_err(|e| Error::syntax(*line, format!("constant {num_str}: {e}")))?;
            push(Token::Constant(num));
            return Ok(end_pos);
        }

        match next_char {
            b',' => {
                push(Token::Comma);
                Ok(position + 1)
            }
            b'=' if input.get(position + 1) == Some(&b'>') => {
                push(Token::Arrow);
                Ok(position + 2)
            }
            _ => Err(Error::syntax(
                *line,
                format!("invalid character '{}'", char::from(next_char)),
            )),
        }
    }

    fn scan_while(input: &[u8], mut position: usize, pred: impl Fn(u8) -> bool) -> usize {
        while position < input.len() && pred(input[position]) {
            position += 1;
        }
        position
    }

    fn text(input: &[u8], start: usize, end: usize) -> &str {
        // the scanners only accept ASCII, so this slice is always valid UTF-8
        std::str::from_utf8(&input[start..end]).unwrap_or_default()
    }
}
