use tracing::debug;

use super::ast::{Ast, Gene, Program, Section};
use super::error::CompileError;
use super::instruction::Instruction;
use super::lexer::{Lexeme, Lexer, Token};

/// Compile DSL source into a `Program`.
///
/// All or nothing: the first error aborts and no partial program is returned.
pub fn parse(source: &str) -> Result<Program, CompileError> {
    Compiler::new(source).parse_program()
}

/// Recursive-descent compiler over a [`Lexer`].
///
/// Exposes the lexer's one-token pushback so `Instruction::parse` can read
/// operands and hand back a token it does not want.
pub struct Compiler<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Compiler<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lexer: Lexer::new(source),
        }
    }

    pub fn unscan(&mut self) {
        self.lexer.unscan();
    }

    pub fn scan_ignore_whitespace(&mut self) -> Lexeme {
        self.lexer.scan_ignore_whitespace()
    }

    pub fn parse_program(mut self) -> Result<Program, CompileError> {
        let mut genes = Vec::new();

        loop {
            // Comments between genes belong to the next gene's evaluation list
            let mut leading = Vec::new();
            loop {
                let lexeme = self.scan_ignore_whitespace();
                match lexeme.token {
                    Token::Comment => leading.push(Instruction::Comment(lexeme.literal)),
                    Token::Eof => {
                        debug!(genes = genes.len(), "program compiled");
                        return Ok(Program::new(genes));
                    }
                    _ => {
                        self.unscan();
                        break;
                    }
                }
            }

            let mut evaluate = Ast::from(leading);
            self.parse_section(&mut evaluate, Section::Evaluate)
                .map_err(|e| e.in_section(Section::Evaluate))?;

            let mut execute = Ast::new();
            self.parse_section(&mut execute, Section::Execute)
                .map_err(|e| e.in_section(Section::Execute))?;

            genes.push(Gene::new(evaluate, execute));
        }
    }

    /// Parse one `BEGIN <kind> ... END` block into `section`.
    ///
    /// Comments may come before the marker. Anything else that is not the
    /// expected `BEGIN` is rejected, as is a second `BEGIN` in the body.
    fn parse_section(&mut self, section: &mut Ast, require: Section) -> Result<(), CompileError> {
        let mut opened = false;

        loop {
            let lexeme = self.scan_ignore_whitespace();
            match lexeme.token {
                Token::Eof => return Err(CompileError::unterminated_section(&lexeme, require)),
                Token::End if opened => return Ok(()),
                Token::End => {
                    return Err(CompileError::wrong_section_marker(
                        &lexeme,
                        format!("section closed before BEGIN {require}"),
                    ));
                }
                Token::Comment => section.push(Instruction::Comment(lexeme.literal)),
                Token::Begin if opened => {
                    return Err(CompileError::wrong_section_marker(
                        &lexeme,
                        format!("unexpected BEGIN inside {} section", require.name()),
                    ));
                }
                Token::Begin => {
                    Instruction::parse(self, &lexeme, section)?;
                    if let Some(Instruction::Begin(found)) = section.last() {
                        if *found != require {
                            return Err(CompileError::wrong_section_marker(
                                &lexeme,
                                format!("unexpected section {found}, expected {require}"),
                            ));
                        }
                    }
                    opened = true;
                }
                Token::Illegal => return Err(CompileError::illegal_token(&lexeme)),
                _ if !opened => {
                    return Err(CompileError::wrong_section_marker(
                        &lexeme,
                        format!("unexpected {} {:?}, expected BEGIN {require}", lexeme.token, lexeme.literal),
                    ));
                }
                _ => Instruction::parse(self, &lexeme, section)?,
            }
        }
    }
}
