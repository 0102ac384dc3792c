//! Instruction set of the bot control language.
//!
//! Each opcode is one variant of [`Instruction`]. A variant knows how to print
//! itself (`Display`), how to pull its operands out of the token stream
//! ([`Instruction::parse`]) and, in `vm.rs`, how to execute against a machine.

use std::fmt;

use super::ast::{Ast, Section};
use super::error::CompileError;
use super::lexer::{Lexeme, Token};
use super::opcode::{self, Opcode};
use super::parser::Compiler;

/// Where a `PSH` reads from, or a `POP` writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Source {
    /// `CON`: the operand is the value itself.
    Constant,
    /// `REG`: the operand is a register index.
    Register,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant => f.write_str("CON"),
            Self::Register => f.write_str("REG"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Section marker, always the first non-comment entry of a section.
    Begin(Section),
    /// Source comment, kept so listings round-trip.
    Comment(String),
    Nop,
    /// Placeholder for a token that did not form an instruction.
    Illegal(String),

    // Sensors
    Rdx,
    Rdy,
    Rde,

    // Transfer
    Push { source: Source, value: i16 },
    /// Only `REG` targets compile. A `CON` target is a run-time no-op.
    Pop { target: Source, index: i16 },

    // Comparison (a pushed first, b second)
    Geq,
    Leq,
    Ieq,
    Grt,
    Lst,

    // Arithmetic / logic
    Not,
    And,
    Ior,
    Xor,
    Add,
    Sub,
    Mul,
    Div,
    Neg,
    Abs,

    // Actuators
    Rid,
    Scn,
    Thr,
    Trn,
    Mne,
    Rep,
    Imp,
}

impl Instruction {
    /// Operand-free instruction for a token, if the token is one.
    pub const fn simple(token: Token) -> Option<Self> {
        Some(match token {
            Token::Nop => Self::Nop,
            Token::Rdx => Self::Rdx,
            Token::Rdy => Self::Rdy,
            Token::Rde => Self::Rde,
            Token::Geq => Self::Geq,
            Token::Leq => Self::Leq,
            Token::Ieq => Self::Ieq,
            Token::Grt => Self::Grt,
            Token::Lst => Self::Lst,
            Token::Not => Self::Not,
            Token::And => Self::And,
            Token::Ior => Self::Ior,
            Token::Xor => Self::Xor,
            Token::Add => Self::Add,
            Token::Sub => Self::Sub,
            Token::Mul => Self::Mul,
            Token::Div => Self::Div,
            Token::Neg => Self::Neg,
            Token::Abs => Self::Abs,
            Token::Rid => Self::Rid,
            Token::Scn => Self::Scn,
            Token::Thr => Self::Thr,
            Token::Trn => Self::Trn,
            Token::Mne => Self::Mne,
            Token::Rep => Self::Rep,
            Token::Imp => Self::Imp,
            _ => return None,
        })
    }

    /// Token this instruction was compiled from. `None` for comments and
    /// illegal placeholders.
    pub const fn token(&self) -> Option<Token> {
        Some(match self {
            Self::Begin(_) => Token::Begin,
            Self::Comment(_) | Self::Illegal(_) => return None,
            Self::Nop => Token::Nop,
            Self::Rdx => Token::Rdx,
            Self::Rdy => Token::Rdy,
            Self::Rde => Token::Rde,
            Self::Push { .. } => Token::Psh,
            Self::Pop { .. } => Token::Pop,
            Self::Geq => Token::Geq,
            Self::Leq => Token::Leq,
            Self::Ieq => Token::Ieq,
            Self::Grt => Token::Grt,
            Self::Lst => Token::Lst,
            Self::Not => Token::Not,
            Self::And => Token::And,
            Self::Ior => Token::Ior,
            Self::Xor => Token::Xor,
            Self::Add => Token::Add,
            Self::Sub => Token::Sub,
            Self::Mul => Token::Mul,
            Self::Div => Token::Div,
            Self::Neg => Token::Neg,
            Self::Abs => Token::Abs,
            Self::Rid => Token::Rid,
            Self::Scn => Token::Scn,
            Self::Thr => Token::Thr,
            Self::Trn => Token::Trn,
            Self::Mne => Token::Mne,
            Self::Rep => Token::Rep,
            Self::Imp => Token::Imp,
        })
    }

    /// Opcode table row, for mnemonics and stack effects.
    pub fn opcode(&self) -> Option<&'static Opcode> {
        self.token().and_then(opcode::for_token)
    }

    /// Program-counter advance: opcode plus inline operand words.
    pub const fn width(&self) -> usize {
        match self {
            Self::Push { .. } | Self::Pop { .. } => 3,
            _ => 1,
        }
    }

    /// Compile the instruction introduced by `lexeme`, consuming whatever
    /// operand tokens it needs, and append it to `ast`.
    pub fn parse(compiler: &mut Compiler<'_>, lexeme: &Lexeme, ast: &mut Ast) -> Result<(), CompileError> {
        match lexeme.token {
            Token::Begin => {
                let kind = compiler.scan_ignore_whitespace();
                let section = match kind.token {
                    Token::Ev => Section::Evaluate,
                    Token::Ex => Section::Execute,
                    Token::Illegal => return Err(CompileError::illegal_token(&kind)),
                    _ => return Err(CompileError::unexpected_token(&kind, "EV or EX after BEGIN")),
                };
                ast.push(Self::Begin(section));
            }
            Token::Psh => {
                let selector = compiler.scan_ignore_whitespace();
                let source = match selector.token {
                    Token::Con => Source::Constant,
                    Token::Reg => Source::Register,
                    Token::Illegal => return Err(CompileError::illegal_token(&selector)),
                    _ => return Err(CompileError::unexpected_token(&selector, "CON or REG after PSH")),
                };
                let value = parse_literal(compiler)?;
                ast.push(Self::Push { source, value });
            }
            Token::Pop => {
                let selector = compiler.scan_ignore_whitespace();
                match selector.token {
                    Token::Reg => {}
                    Token::Illegal => return Err(CompileError::illegal_token(&selector)),
                    _ => return Err(CompileError::unexpected_token(&selector, "REG after POP")),
                }
                let index = parse_literal(compiler)?;
                ast.push(Self::Pop { target: Source::Register, index });
            }
            Token::Illegal => return Err(CompileError::illegal_token(lexeme)),
            token => match Self::simple(token) {
                Some(instruction) => ast.push(instruction),
                None => return Err(CompileError::unexpected_token(lexeme, "an instruction")),
            },
        }
        Ok(())
    }
}

/// Read the integer operand that follows a selector.
fn parse_literal(compiler: &mut Compiler<'_>) -> Result<i16, CompileError> {
    let lexeme = compiler.scan_ignore_whitespace();
    match lexeme.token {
        Token::Literal => lexeme
            .literal
            .parse::<i16>()
            .map_err(|e| CompileError::invalid_literal(&lexeme, e)),
        Token::Illegal => Err(CompileError::illegal_token(&lexeme)),
        _ => Err(CompileError::unexpected_token(&lexeme, "an integer literal")),
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin(section) => write!(f, "BEGIN {section}"),
            Self::Comment(text) => f.write_str(text),
            Self::Illegal(text) => write!(f, "ILLEGAL {text}"),
            Self::Push { source, value } => write!(f, "PSH {source} {value}"),
            Self::Pop { target, index } => write!(f, "POP {target} {index}"),
            other => match other.opcode() {
                Some(op) => f.write_str(op.mnemonic),
                None => write!(f, "{other:?}"),
            },
        }
    }
}
