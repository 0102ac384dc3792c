//! Compiled program structure for the bot control language.

use std::fmt;
use std::ops::Deref;

use super::instruction::Instruction;

/// Source span for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Which half of a gene an instruction list belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `BEGIN EV`: decides whether the gene fires this tick.
    Evaluate,
    /// `BEGIN EX`: runs only when the evaluation left a value >= 1.
    Execute,
}

impl Section {
    /// Keyword that follows `BEGIN` for this section.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Evaluate => "EV",
            Self::Execute => "EX",
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Evaluate => "evaluation",
            Self::Execute => "execution",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Ordered instruction list. Execution always starts at index 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ast(Vec<Instruction>);

impl Ast {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub(crate) fn push(&mut self, instruction: Instruction) {
        self.0.push(instruction);
    }

    /// Number of instruction words, counting inline operands.
    pub fn word_count(&self) -> usize {
        self.0.iter().map(Instruction::width).sum()
    }
}

impl Deref for Ast {
    type Target = [Instruction];

    fn deref(&self) -> &[Instruction] {
        &self.0
    }
}

impl From<Vec<Instruction>> for Ast {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self(instructions)
    }
}

impl FromIterator<Instruction> for Ast {
    fn from_iter<I: IntoIterator<Item = Instruction>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for Ast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for instruction in &self.0 {
            match instruction {
                Instruction::Begin(_) => writeln!(f, "{instruction}")?,
                _ => writeln!(f, "\t{instruction}")?,
            }
        }
        Ok(())
    }
}

/// One guarded rule: an evaluation list and an execution list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Gene {
    evaluate: Ast,
    execute: Ast,
}

impl Gene {
    pub fn new(evaluate: Ast, execute: Ast) -> Self {
        Self { evaluate, execute }
    }

    pub fn evaluate(&self) -> &Ast {
        &self.evaluate
    }

    pub fn execute(&self) -> &Ast {
        &self.execute
    }

    pub fn section(&self, section: Section) -> &Ast {
        match section {
            Section::Evaluate => &self.evaluate,
            Section::Execute => &self.execute,
        }
    }
}

impl fmt::Display for Gene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.evaluate)?;
        writeln!(f, "END")?;
        write!(f, "{}", self.execute)?;
        writeln!(f, "END")
    }
}

/// A compiled bot program. Gene order is evaluation order.
///
/// Programs are read-only after compilation; bots share them behind an `Arc`
/// and swap the whole thing when re-programmed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    genes: Vec<Gene>,
}

impl Program {
    pub fn new(genes: Vec<Gene>) -> Self {
        Self { genes }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn genes(&self) -> &[Gene] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Gene> {
        self.genes.iter()
    }

    /// Total instruction count across all genes and sections.
    pub fn instruction_count(&self) -> usize {
        self.genes
            .iter()
            .map(|g| g.evaluate.len() + g.execute.len())
            .sum()
    }
}

impl<'a> IntoIterator for &'a Program {
    type Item = &'a Gene;
    type IntoIter = std::slice::Iter<'a, Gene>;

    fn into_iter(self) -> Self::IntoIter {
        self.genes.iter()
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, gene) in self.genes.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{gene}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::instruction::Source;

    fn sample_gene() -> Gene {
        Gene::new(
            Ast::from(vec![
                Instruction::Begin(Section::Evaluate),
                Instruction::Rde,
                Instruction::Push { source: Source::Constant, value: 10 },
                Instruction::Geq,
            ]),
            Ast::from(vec![
                Instruction::Begin(Section::Execute),
                Instruction::Push { source: Source::Constant, value: 5 },
                Instruction::Rep,
            ]),
        )
    }

    #[test]
    fn word_count_includes_operands() {
        let gene = sample_gene();
        assert_eq!(gene.evaluate().word_count(), 1 + 1 + 3 + 1);
        assert_eq!(gene.execute().word_count(), 1 + 3 + 1);
    }

    #[test]
    fn gene_listing() {
        let listing = sample_gene().to_string();
        assert_eq!(
            listing,
            "BEGIN EV\n\tRDE\n\tPSH CON 10\n\tGEQ\nEND\nBEGIN EX\n\tPSH CON 5\n\tREP\nEND\n"
        );
    }

    #[test]
    fn program_counts() {
        let program = Program::new(vec![sample_gene(), Gene::default()]);
        assert_eq!(program.len(), 2);
        assert_eq!(program.instruction_count(), 7);
        assert_eq!(program.genes()[0].section(Section::Execute).len(), 3);
    }
}
