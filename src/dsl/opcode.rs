//! Static opcode table.
//!
//! One row per keyword of the language. The lexer resolves words through it
//! and listings take their mnemonics from it. Built at compile time and never
//! mutated.

use super::lexer::Token;

/// Broad instruction grouping, used to group the opcode reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// `BEGIN`, `END`, `EV`, `EX`.
    Section,
    /// `CON` / `REG` operand selectors.
    Selector,
    Sensor,
    Transfer,
    Comparison,
    Arithmetic,
    Actuator,
    Structural,
}

impl Family {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Section => "section",
            Self::Selector => "selector",
            Self::Sensor => "sensor",
            Self::Transfer => "transfer",
            Self::Comparison => "comparison",
            Self::Arithmetic => "arithmetic",
            Self::Actuator => "actuator",
            Self::Structural => "structural",
        }
    }
}

/// Inline operands an opcode consumes at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    None,
    /// `EV` or `EX`.
    SectionKind,
    /// `CON` or `REG`, then an integer literal.
    SourceAndValue,
    /// `REG`, then an integer literal.
    Register,
}

impl Operands {
    /// Operand syntax as written after the mnemonic.
    pub const fn syntax(self) -> &'static str {
        match self {
            Self::None => "",
            Self::SectionKind => "EV|EX",
            Self::SourceAndValue => "CON|REG <n>",
            Self::Register => "REG <n>",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub mnemonic: &'static str,
    pub token: Token,
    pub family: Family,
    pub operands: Operands,
    /// Values consumed from the stack at run time.
    pub pops: u8,
    /// Values produced on the stack at run time.
    pub pushes: u8,
    pub summary: &'static str,
}

const fn op(
    mnemonic: &'static str,
    token: Token,
    family: Family,
    operands: Operands,
    pops: u8,
    pushes: u8,
    summary: &'static str,
) -> Opcode {
    Opcode { mnemonic, token, family, operands, pops, pushes, summary }
}

impl Opcode {
    /// Mnemonic followed by its operand syntax, e.g. `PSH CON|REG <n>`.
    pub fn usage(&self) -> String {
        match self.operands {
            Operands::None => self.mnemonic.to_string(),
            other => format!("{} {}", self.mnemonic, other.syntax()),
        }
    }

    /// Run-time stack effect in `( pops -- pushes )` form.
    pub fn stack_effect(&self) -> String {
        format!("( {} -- {} )", self.pops, self.pushes)
    }
}

use Family as F;
use Operands as O;

pub static OPCODES: [Opcode; 34] = [
    op("BEGIN", Token::Begin, F::Section, O::SectionKind, 0, 0, "open a section"),
    op("END", Token::End, F::Section, O::None, 0, 0, "close a section"),
    op("EV", Token::Ev, F::Section, O::None, 0, 0, "evaluation section kind"),
    op("EX", Token::Ex, F::Section, O::None, 0, 0, "execution section kind"),
    op("CON", Token::Con, F::Selector, O::None, 0, 0, "constant operand"),
    op("REG", Token::Reg, F::Selector, O::None, 0, 0, "register operand"),
    op("NOP", Token::Nop, F::Structural, O::None, 0, 0, "do nothing"),
    op("RDX", Token::Rdx, F::Sensor, O::None, 0, 1, "push velocity x"),
    op("RDY", Token::Rdy, F::Sensor, O::None, 0, 1, "push velocity y"),
    op("RDE", Token::Rde, F::Sensor, O::None, 0, 1, "push available energy"),
    op("PSH", Token::Psh, F::Transfer, O::SourceAndValue, 0, 1, "push constant or register"),
    op("POP", Token::Pop, F::Transfer, O::Register, 1, 0, "pop into register"),
    op("GEQ", Token::Geq, F::Comparison, O::None, 2, 1, "a >= b"),
    op("LEQ", Token::Leq, F::Comparison, O::None, 2, 1, "a <= b"),
    op("IEQ", Token::Ieq, F::Comparison, O::None, 2, 1, "a == b"),
    op("GRT", Token::Grt, F::Comparison, O::None, 2, 1, "a > b"),
    op("LST", Token::Lst, F::Comparison, O::None, 2, 1, "a < b"),
    op("NOT", Token::Not, F::Arithmetic, O::None, 1, 1, "logical not"),
    op("AND", Token::And, F::Arithmetic, O::None, 2, 1, "bitwise and"),
    op("IOR", Token::Ior, F::Arithmetic, O::None, 2, 1, "bitwise or"),
    op("XOR", Token::Xor, F::Arithmetic, O::None, 2, 1, "bitwise xor"),
    op("ADD", Token::Add, F::Arithmetic, O::None, 2, 1, "a + b"),
    op("SUB", Token::Sub, F::Arithmetic, O::None, 2, 1, "a - b"),
    op("MUL", Token::Mul, F::Arithmetic, O::None, 2, 1, "a * b"),
    op("DIV", Token::Div, F::Arithmetic, O::None, 2, 1, "a / b, skipped when b is 0"),
    op("NEG", Token::Neg, F::Arithmetic, O::None, 1, 1, "-a"),
    op("ABS", Token::Abs, F::Arithmetic, O::None, 2, 1, "length of (x, y)"),
    op("RID", Token::Rid, F::Actuator, O::None, 1, 1, "resolve remote id"),
    op("SCN", Token::Scn, F::Actuator, O::None, 2, 2, "scan along (x, y)"),
    op("THR", Token::Thr, F::Actuator, O::None, 2, 0, "thrust by (x, y)"),
    op("TRN", Token::Trn, F::Actuator, O::None, 1, 0, "turn by degrees"),
    op("MNE", Token::Mne, F::Actuator, O::None, 1, 0, "mine with strength"),
    op("REP", Token::Rep, F::Actuator, O::None, 1, 0, "reproduce with energy"),
    op("IMP", Token::Imp, F::Actuator, O::None, 1, 0, "impulse along heading"),
];

/// Resolve a source word to its opcode. Keywords are case-insensitive.
pub fn lookup(word: &str) -> Option<&'static Opcode> {
    OPCODES
        .iter()
        .find(|op| op.mnemonic.eq_ignore_ascii_case(word))
}

/// Table row for a token, if the token is a keyword.
pub fn for_token(token: Token) -> Option<&'static Opcode> {
    OPCODES.iter().find(|op| op.token == token)
}

/// Rows that can appear as instructions inside a section body.
pub fn instructions() -> impl Iterator<Item = &'static Opcode> {
    OPCODES
        .iter()
        .filter(|op| !matches!(op.family, Family::Section | Family::Selector))
}
