use std::error::Error as StdError;
use std::fmt;

use r16::Opcode;

/// Failure while tokenizing a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LexError {
    UnexpectedCharacter(char),
    UnknownDirective(String),
    BadIntLiteral(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            LexError::UnexpectedCharacter(c) => write!(f, "Unexpected character: {}", c),
            LexError::UnknownDirective(name) => write!(f, "Unknown directive: .{}", name),
            LexError::BadIntLiteral(text) => write!(f, "Invalid integer literal: {}", text),
        }
    }
}

/// Failure while parsing the token stream of a line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseError {
    InvalidLineStart,
    ExpectedColon,
    ExpectedComma,
    InvalidOperand,
    InvalidMemoryOperand,
    MissingClosingBracket,
    NotEnoughOperands(Opcode),
    ExpectedWordDirective,
    ExpectedInteger,
    UnexpectedDirective(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::InvalidLineStart => f.write_str("Invalid line start"),
            ParseError::ExpectedColon => f.write_str("Expected ':' after label"),
            ParseError::ExpectedComma => f.write_str("Expected comma after operand"),
            ParseError::InvalidOperand => f.write_str("Invalid operand"),
            ParseError::InvalidMemoryOperand => f.write_str("Invalid memory operand"),
            ParseError::MissingClosingBracket => {
                f.write_str("Missing closing bracket in memory operand")
            }
            ParseError::NotEnoughOperands(opcode) => {
                write!(f, "Not enough operands for {}", opcode)
            }
            ParseError::ExpectedWordDirective => {
                f.write_str("Expected .WORD directive in data section")
            }
            ParseError::ExpectedInteger => f.write_str("Expected integer literal after .WORD"),
            ParseError::UnexpectedDirective(name) => {
                write!(f, "Directive .{} is not allowed here", name)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Lex(LexError),
    Parse(ParseError),
}

/// A compile-time error carrying the 1-based position of the offending
/// token. Fatal for the translation unit; no object is emitted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Error {
    pub line: u32,
    pub col: u32,
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn lex(line: u32, col: u32, kind: LexError) -> Error {
        Error {
            line,
            col,
            kind: ErrorKind::Lex(kind),
        }
    }

    pub(crate) fn parse(line: u32, col: u32, kind: ParseError) -> Error {
        Error {
            line,
            col,
            kind: ErrorKind::Parse(kind),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.kind {
            ErrorKind::Lex(err) => write!(
                f,
                "Lexer error at line {}, col {}: {}",
                self.line, self.col, err
            ),
            ErrorKind::Parse(err) => write!(
                f,
                "Parse error at line {}, col {}: {}",
                self.line, self.col, err
            ),
        }
    }
}

impl StdError for Error {}
