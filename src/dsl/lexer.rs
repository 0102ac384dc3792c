use std::fmt;

use super::ast::Span;
use super::opcode;

/// Token categories produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    Illegal,
    Eof,
    Ws,
    Comment,
    /// Any word that is not a keyword, usually an integer.
    Literal,

    // Section markers
    Begin,
    End,
    Ev,
    Ex,

    Nop,

    // Sensors
    Rdx,
    Rdy,
    Rde,

    // Transfer
    Psh,
    Pop,
    Con,
    Reg,

    // Comparison
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

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Illegal => f.write_str("ILLEGAL"),
            Token::Eof => f.write_str("EOF"),
            Token::Ws => f.write_str("whitespace"),
            Token::Comment => f.write_str("comment"),
            Token::Literal => f.write_str("literal"),
            other => match opcode::for_token(*other) {
                Some(op) => f.write_str(op.mnemonic),
                None => write!(f, "{other:?}"),
            },
        }
    }
}

/// A token together with its source text and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub token: Token,
    pub literal: String,
    pub span: Span,
}

impl Lexeme {
    fn new(token: Token, literal: &str, start: usize, end: usize) -> Self {
        Self {
            token,
            literal: literal.to_string(),
            span: Span::new(start, end),
        }
    }
}

/// Tokenize a whole source string, ending with an `Eof` lexeme.
///
/// Whitespace and comments are kept; the compiler skips them itself.
pub fn lex(source: &str) -> Vec<Lexeme> {
    let mut lexer = Lexer::new(source);
    let mut out = Vec::new();
    loop {
        let lexeme = lexer.scan();
        let done = lexeme.token == Token::Eof;
        out.push(lexeme);
        if done {
            return out;
        }
    }
}

/// Pull-style scanner with a single token of pushback.
///
/// Never fails: unrecognised characters come back as `Token::Illegal` and
/// are left for the compiler to reject.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    last: Option<Lexeme>,
    replay: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            last: None,
            replay: false,
        }
    }

    /// Next token. Returns the buffered token instead if `unscan` was called.
    pub fn scan(&mut self) -> Lexeme {
        if self.replay {
            self.replay = false;
            if let Some(last) = &self.last {
                return last.clone();
            }
        }
        let lexeme = self.next_lexeme();
        self.last = Some(lexeme.clone());
        lexeme
    }

    /// Push the last scanned token back. Only one level deep: calling this
    /// twice in a row still replays a single token.
    pub fn unscan(&mut self) {
        if self.last.is_some() {
            self.replay = true;
        }
    }

    /// Like `scan`, but steps over one whitespace run.
    pub fn scan_ignore_whitespace(&mut self) -> Lexeme {
        let lexeme = self.scan();
        if lexeme.token == Token::Ws {
            self.scan()
        } else {
            lexeme
        }
    }

    fn next_lexeme(&mut self) -> Lexeme {
        let start = self.pos;
        let Some(&ch) = self.bytes.get(start) else {
            return Lexeme::new(Token::Eof, "", start, start);
        };

        match ch {
            b' ' | b'\t' | b'\n' | b'\r' => {
                self.advance_while(is_whitespace);
                Lexeme::new(Token::Ws, &self.source[start..self.pos], start, self.pos)
            }
            b'/' if self.bytes.get(start + 1) == Some(&b'/') => {
                // Line comment: runs up to (not including) the newline
                self.advance_while(|b| b != b'\n');
                let text = self.source[start..self.pos].trim_end_matches('\r');
                Lexeme::new(Token::Comment, text, start, self.pos)
            }
            c if is_word(c) => {
                self.advance_while(is_word);
                let word = &self.source[start..self.pos];
                let token = opcode::lookup(word).map_or(Token::Literal, |op| op.token);
                Lexeme::new(token, word, start, self.pos)
            }
            _ => {
                let illegal = self.source[start..].chars().next().unwrap_or('\u{FFFD}');
                self.pos += illegal.len_utf8();
                Lexeme {
                    token: Token::Illegal,
                    literal: illegal.to_string(),
                    span: Span::new(start, self.pos),
                }
            }
        }
    }

    fn advance_while(&mut self, pred: impl Fn(u8) -> bool) {
        while self.pos < self.bytes.len() && pred(self.bytes[self.pos]) {
            self.pos += 1;
        }
    }
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Keyword and literal characters. `-` is included so negative literals
/// lex as one word.
fn is_word(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-'
}
