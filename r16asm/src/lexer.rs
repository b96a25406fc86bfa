use crate::error::{Error, LexError};
use crate::token::{Token, TokenKind};
use r16::Opcode;

/// Tokenizes one logical source line (comments are stripped by the
/// caller). The lexer keeps one token of lookahead: [`current`] returns
/// the token at the cursor and [`advance`] moves past it. Once the line is
/// exhausted every query yields the `Eof` token.
///
/// [`current`]: #method.current
/// [`advance`]: #method.advance
#[derive(Debug)]
pub struct Lexer<'i> {
    input: &'i str,
    pos: usize,
    line: u32,
    col: u32,
    current: Token,
}

impl<'i> Lexer<'i> {
    pub fn new(input: &'i str, line: u32) -> Result<Lexer<'i>, Error> {
        let mut lexer = Lexer {
            input,
            pos: 0,
            line,
            col: 1,
            current: Token::new(TokenKind::Eof, String::new(), 0, line, 1),
        };
        lexer.advance()?;
        Ok(lexer)
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn ended(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    /// Scans the next token into `current`.
    pub fn advance(&mut self) -> Result<(), Error> {
        self.skip_spaces();

        if self.pos >= self.input.len() {
            self.current = Token::new(
                TokenKind::Eof,
                String::new(),
                0,
                self.line,
                self.input.len() as u32 + 1,
            );
            return Ok(());
        }

        let c = self.byte();
        match c {
            b'[' => self.single_char(TokenKind::LBracket, "["),
            b']' => self.single_char(TokenKind::RBracket, "]"),
            b',' => self.single_char(TokenKind::Comma, ","),
            b':' => self.single_char(TokenKind::Colon, ":"),
            b'.' => self.scan_directive()?,
            _ if c.is_ascii_digit() || (c == b'-' && self.next_is_digit()) => {
                self.scan_int()?
            }
            _ if c.is_ascii_alphabetic() || c == b'_' => self.scan_identifier(),
            _ => {
                let c = self.input[self.pos..].chars().next().unwrap_or('\u{FFFD}');
                return Err(self.error(LexError::UnexpectedCharacter(c)));
            }
        }

        Ok(())
    }

    fn byte(&self) -> u8 {
        self.input.as_bytes()[self.pos]
    }

    fn next_is_digit(&self) -> bool {
        self.pos + 1 < self.input.len() && self.input.as_bytes()[self.pos + 1].is_ascii_digit()
    }

    fn bump(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
            self.col += 1;
        }
    }

    fn skip_spaces(&mut self) {
        while self.pos < self.input.len() && (self.byte() == b' ' || self.byte() == b'\t') {
            self.bump();
        }
    }

    fn single_char(&mut self, kind: TokenKind, text: &str) {
        self.current = Token::new(kind, text.to_string(), 0, self.line, self.col);
        self.bump();
    }

    fn scan_int(&mut self) -> Result<(), Error> {
        let start = self.pos;
        let start_col = self.col;
        self.bump();
        while self.pos < self.input.len() && self.byte().is_ascii_digit() {
            self.bump();
        }

        let text = &self.input[start..self.pos];
        let value = text
            .parse::<i64>()
            .map_err(|_| Error::lex(self.line, start_col, LexError::BadIntLiteral(text.to_string())))?;
        self.current = Token::new(TokenKind::Int, text.to_string(), value, self.line, start_col);
        Ok(())
    }

    fn scan_identifier(&mut self) {
        let start = self.pos;
        let start_col = self.col;
        self.bump();
        while self.pos < self.input.len()
            && (self.byte().is_ascii_alphanumeric() || self.byte() == b'_')
        {
            self.bump();
        }

        let ident = self.input[start..self.pos].to_ascii_uppercase();

        if ident.parse::<Opcode>().is_ok() {
            self.current =
                Token::new(TokenKind::Instruction, ident, 0, self.line, start_col);
        } else if let Some(index) = register_index(&ident) {
            self.current =
                Token::new(TokenKind::Register, ident, index, self.line, start_col);
        } else {
            self.current = Token::new(TokenKind::Label, ident, 0, self.line, start_col);
        }
    }

    fn scan_directive(&mut self) -> Result<(), Error> {
        self.bump();
        let start = self.pos;
        let start_col = self.col;
        while self.pos < self.input.len() && self.byte().is_ascii_alphabetic() {
            self.bump();
        }

        let name = self.input[start..self.pos].to_ascii_uppercase();
        if name == "DATA" || name == "CODE" || name == "WORD" {
            self.current = Token::new(TokenKind::Directive, name, 0, self.line, start_col);
            Ok(())
        } else {
            Err(Error::lex(
                self.line,
                start_col,
                LexError::UnknownDirective(name),
            ))
        }
    }

    fn error(&self, kind: LexError) -> Error {
        Error::lex(self.line, self.col, kind)
    }
}

/// `R` followed by a single decimal digit names one of `R0`..`R9`. The
/// upper registers (`R10`..`R15`, the stack and instruction pointers)
/// cannot be named in source text.
fn register_index(ident: &str) -> Option<i64> {
    let bytes = ident.as_bytes();
    if bytes.len() == 2 && bytes[0] == b'R' && bytes[1].is_ascii_digit() {
        Some(i64::from(bytes[1] - b'0'))
    } else {
        None
    }
}
