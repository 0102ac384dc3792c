use std::fmt;

use thiserror::Error;

use super::ast::{Section, Span};
use super::lexer::{Lexeme, Token};

/// A compilation error, pinned to the token that caused it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub token: Token,
    pub literal: String,
    pub span: Span,
    /// Section being parsed when the error was raised.
    pub section: Option<Section>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A token that the current opcode or position cannot accept.
    UnexpectedToken,
    /// An operand that is not a base-10 integer in the `i16` range.
    InvalidLiteral,
    /// End of input reached before `END`.
    UnterminatedSection,
    /// A section that does not open with the expected `BEGIN EV` / `BEGIN EX`.
    WrongSectionMarker,
    /// A character the lexer could not classify.
    IllegalToken,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::UnexpectedToken => "unexpected-token",
            Self::InvalidLiteral => "invalid-literal",
            Self::UnterminatedSection => "unterminated-section",
            Self::WrongSectionMarker => "wrong-section-marker",
            Self::IllegalToken => "illegal-token",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl CompileError {
    fn at(kind: ErrorKind, lexeme: &Lexeme, message: String) -> Self {
        Self {
            kind,
            message,
            token: lexeme.token,
            literal: lexeme.literal.clone(),
            span: lexeme.span,
            section: None,
        }
    }

    pub fn unexpected_token(lexeme: &Lexeme, expected: impl fmt::Display) -> Self {
        Self::at(
            ErrorKind::UnexpectedToken,
            lexeme,
            format!("unexpected {} {:?}, expected {expected}", lexeme.token, lexeme.literal),
        )
    }

    pub fn invalid_literal(lexeme: &Lexeme, reason: impl fmt::Display) -> Self {
        Self::at(
            ErrorKind::InvalidLiteral,
            lexeme,
            format!("invalid integer literal {:?}: {reason}", lexeme.literal),
        )
    }

    pub fn unterminated_section(lexeme: &Lexeme, section: Section) -> Self {
        Self::at(
            ErrorKind::UnterminatedSection,
            lexeme,
            format!("unexpected {} in {} section, expected END", lexeme.token, section.name()),
        )
        .in_section(section)
    }

    pub fn wrong_section_marker(lexeme: &Lexeme, message: impl Into<String>) -> Self {
        Self::at(ErrorKind::WrongSectionMarker, lexeme, message.into())
    }

    pub fn illegal_token(lexeme: &Lexeme) -> Self {
        Self::at(
            ErrorKind::IllegalToken,
            lexeme,
            format!("illegal character {:?}", lexeme.literal),
        )
    }

    /// Attach the section being parsed. An already-set section is kept.
    pub fn in_section(mut self, section: Section) -> Self {
        self.section.get_or_insert(section);
        self
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = offset_to_line_col(source, self.span.start);
        match self.section {
            Some(section) => format!(
                "[{}] line {}:{} ({} section): {}",
                self.kind,
                line,
                col,
                section.name(),
                self.message,
            ),
            None => format!("[{}] line {}:{}: {}", self.kind, line, col, self.message),
        }
    }
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
