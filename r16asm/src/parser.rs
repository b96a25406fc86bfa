use std::collections::BTreeMap;

use matches::debug_assert_matches;
use r16::{Opcode, Word};

use crate::error::{Error, ParseError};
use crate::lexer::Lexer;
use crate::token::TokenKind;

/// The operand forms of the source language. Label references stay
/// symbolic until link time; `memory` records whether the source operand
/// was bracketed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Immediate(i64),
    Register(u8),
    MemoryImmediate(i64),
    MemoryRegister(u8),
    LabelRef { name: String, memory: bool },
}

/// One parsed construct of the code section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Item {
    /// A label definition. Occupies no bytecode; anchors a symbol at the
    /// current code offset.
    Label(String),
    Instruction {
        opcode: Opcode,
        operands: Vec<Operand>,
    },
}

/// Everything the parser accumulates over one translation unit.
#[derive(Debug, Default, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
    pub data_words: Vec<Word>,
    /// Data label name to the word offset of the first word of its line.
    pub data_labels: BTreeMap<String, u32>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Section {
    Code,
    Data,
}

/// Line-oriented parser. Each line gets a fresh [`Lexer`]; the section,
/// the instruction list and the data segment persist across lines.
///
/// [`Lexer`]: struct.Lexer.html
pub struct Parser {
    section: Section,
    program: Program,
}

/// Parses a complete source text: strips `;` comments and trailing
/// whitespace, then feeds the lines to a [`Parser`].
///
/// [`Parser`]: struct.Parser.html
pub fn parse_source(source: &str) -> Result<Program, Error> {
    let mut parser = Parser::new();
    for (index, line) in source.lines().enumerate() {
        let line = line.splitn(2, ';').next().unwrap_or("").trim_end();
        parser.parse_line(line, index as u32 + 1)?;
    }
    Ok(parser.finish())
}

impl Parser {
    pub fn new() -> Parser {
        Parser {
            section: Section::Code,
            program: Program::default(),
        }
    }

    pub fn finish(self) -> Program {
        self.program
    }

    /// Parses one comment-free line, identified by its 1-based number.
    pub fn parse_line(&mut self, line: &str, number: u32) -> Result<(), Error> {
        let mut lexer = Lexer::new(line, number)?;
        if lexer.ended() {
            return Ok(());
        }

        let first = lexer.current().clone();

        if first.kind == TokenKind::Directive {
            return match first.text.as_str() {
                "DATA" => {
                    self.section = Section::Data;
                    Ok(())
                }
                "CODE" => {
                    self.section = Section::Code;
                    Ok(())
                }
                "WORD" if self.section == Section::Data => {
                    lexer.advance()?;
                    self.parse_word_list(&mut lexer, None)
                }
                _ => Err(Error::parse(
                    first.line,
                    first.col,
                    ParseError::UnexpectedDirective(first.text),
                )),
            };
        }

        if self.section == Section::Data {
            return self.parse_data_line(&mut lexer);
        }

        if first.kind == TokenKind::Label {
            lexer.advance()?;
            if lexer.current().kind != TokenKind::Colon {
                return Err(Error::parse(first.line, first.col, ParseError::ExpectedColon));
            }
            lexer.advance()?;
            self.program.items.push(Item::Label(first.text));

            // An instruction may share the line with the label.
            if lexer.current().kind == TokenKind::Instruction {
                return self.parse_instruction(&mut lexer);
            }
            return Ok(());
        }

        if first.kind == TokenKind::Instruction {
            return self.parse_instruction(&mut lexer);
        }

        Err(Error::parse(
            first.line,
            first.col,
            ParseError::InvalidLineStart,
        ))
    }

    fn parse_instruction(&mut self, lexer: &mut Lexer) -> Result<(), Error> {
        let token = lexer.current().clone();
        debug_assert_matches!(token.kind, TokenKind::Instruction);
        let opcode = token
            .text
            .parse::<Opcode>()
            .map_err(|_| Error::parse(token.line, token.col, ParseError::InvalidLineStart))?;
        lexer.advance()?;

        let expected = opcode.operand_count();
        let mut operands = Vec::with_capacity(expected);

        for index in 0..expected {
            if lexer.ended() {
                return Err(Error::parse(
                    token.line,
                    token.col,
                    ParseError::NotEnoughOperands(opcode),
                ));
            }

            operands.push(parse_operand(lexer)?);

            if index + 1 < expected {
                let current = lexer.current();
                if current.kind != TokenKind::Comma {
                    return Err(Error::parse(
                        current.line,
                        current.col,
                        ParseError::ExpectedComma,
                    ));
                }
                lexer.advance()?;
            }
        }

        self.program.items.push(Item::Instruction { opcode, operands });
        Ok(())
    }

    fn parse_data_line(&mut self, lexer: &mut Lexer) -> Result<(), Error> {
        debug_assert_matches!(self.section, Section::Data);

        let first = lexer.current().clone();
        let label = if first.kind == TokenKind::Label {
            lexer.advance()?;
            if lexer.current().kind != TokenKind::Colon {
                return Err(Error::parse(first.line, first.col, ParseError::ExpectedColon));
            }
            lexer.advance()?;
            Some(first.text)
        } else {
            None
        };

        if lexer.ended() {
            // A bare label binds to the next word to be emitted.
            if let Some(name) = label {
                self.define_data_label(name);
            }
            return Ok(());
        }

        let directive = lexer.current().clone();
        if directive.kind == TokenKind::Directive && directive.text == "WORD" {
            lexer.advance()?;
            self.parse_word_list(lexer, label)
        } else {
            Err(Error::parse(
                directive.line,
                directive.col,
                ParseError::ExpectedWordDirective,
            ))
        }
    }

    /// Collects the comma-separated integer list after `.WORD`, appending
    /// one 32-bit word per value. The label (if any) points at the first
    /// word of the line.
    fn parse_word_list(&mut self, lexer: &mut Lexer, label: Option<String>) -> Result<(), Error> {
        if let Some(name) = label {
            self.define_data_label(name);
        }

        let first = lexer.current().clone();
        if first.kind != TokenKind::Int {
            return Err(Error::parse(
                first.line,
                first.col,
                ParseError::ExpectedInteger,
            ));
        }

        while lexer.current().kind == TokenKind::Int {
            self.program.data_words.push(lexer.current().value as Word);
            lexer.advance()?;
            if lexer.current().kind == TokenKind::Comma {
                lexer.advance()?;
            } else {
                break;
            }
        }

        Ok(())
    }

    fn define_data_label(&mut self, name: String) {
        let word_offset = self.program.data_words.len() as u32;
        self.program.data_labels.insert(name, word_offset);
    }
}

fn parse_operand(lexer: &mut Lexer) -> Result<Operand, Error> {
    let token = lexer.current().clone();

    let operand = match token.kind {
        TokenKind::Register => {
            lexer.advance()?;
            Operand::Register(token.value as u8)
        }
        TokenKind::Int => {
            lexer.advance()?;
            Operand::Immediate(token.value)
        }
        TokenKind::Label => {
            lexer.advance()?;
            Operand::LabelRef {
                name: token.text,
                memory: false,
            }
        }
        TokenKind::LBracket => {
            lexer.advance()?;
            let inner = lexer.current().clone();
            let operand = match inner.kind {
                TokenKind::Register => Operand::MemoryRegister(inner.value as u8),
                TokenKind::Int => Operand::MemoryImmediate(inner.value),
                TokenKind::Label => Operand::LabelRef {
                    name: inner.text,
                    memory: true,
                },
                _ => {
                    return Err(Error::parse(
                        inner.line,
                        inner.col,
                        ParseError::InvalidMemoryOperand,
                    ))
                }
            };
            lexer.advance()?;

            let closing = lexer.current();
            if closing.kind != TokenKind::RBracket {
                return Err(Error::parse(
                    closing.line,
                    closing.col,
                    ParseError::MissingClosingBracket,
                ));
            }
            lexer.advance()?;
            operand
        }
        _ => {
            return Err(Error::parse(
                token.line,
                token.col,
                ParseError::InvalidOperand,
            ))
        }
    };

    Ok(operand)
}
