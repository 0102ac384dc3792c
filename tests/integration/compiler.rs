//! Source → program: structure, diagnostics and listings.

use moonshot::dsl::ast::Section;
use moonshot::dsl::error::ErrorKind;
use moonshot::dsl::instruction::{Instruction, Source};
use moonshot::dsl::lexer::{lex, Token};
use moonshot::dsl::parser::parse;
use moonshot::sim::scenario::DEMO_PROGRAM;

use crate::common::*;

#[test]
fn keywords_are_case_insensitive() {
    let upper = compile("BEGIN EV PSH CON 5 RDE GEQ END BEGIN EX PSH CON 1 MNE END");
    let lower = compile("begin ev psh con 5 rde geq end Begin Ex Psh Con 1 mne End");
    assert_eq!(upper, lower);
}

#[test]
fn lexer_keeps_whitespace_and_comments() {
    let tokens: Vec<Token> = lex("RDX // read\n-5").into_iter().map(|l| l.token).collect();
    assert_eq!(tokens, vec![
        Token::Rdx,
        Token::Ws,
        Token::Comment,
        Token::Ws,
        Token::Literal,
        Token::Eof,
    ]);
}

#[test]
fn demo_program_listing_round_trips() {
    let program = compile(DEMO_PROGRAM);
    assert_eq!(program.len(), 6);
    let listing = program.to_string();
    assert_eq!(*compile(&listing), *program);
}

#[test]
fn operands_are_stored_inline() {
    let program = compile("BEGIN EV PSH REG 3 END BEGIN EX PSH CON -7 POP REG 3 END");
    let gene = &program.genes()[0];
    assert_eq!(gene.evaluate()[1], Instruction::Push { source: Source::Register, value: 3 });
    assert_eq!(gene.execute()[1], Instruction::Push { source: Source::Constant, value: -7 });
    assert_eq!(gene.execute()[2], Instruction::Pop { target: Source::Register, index: 3 });
    assert_eq!(gene.section(Section::Execute).word_count(), 7);
}

#[test]
fn error_reports_line_and_column() {
    let source = "BEGIN EV\n  RDX\n  PSH CON abc\nEND\nBEGIN EX END\n";
    let err = parse(source).unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidLiteral);
    let text = err.format_with_source(source);
    assert!(text.starts_with("[invalid-literal] line 3:11 (evaluation section):"), "{text}");
}

#[test]
fn every_error_kind_is_reachable() {
    let cases = [
        ("BEGIN EV RDX RDX", ErrorKind::UnterminatedSection),
        ("BEGIN EV PSH CON 70000 END BEGIN EX END", ErrorKind::InvalidLiteral),
        ("BEGIN EV PSH 1 END BEGIN EX END", ErrorKind::UnexpectedToken),
        ("BEGIN EX END BEGIN EV END", ErrorKind::WrongSectionMarker),
        ("BEGIN EV RDX @ END BEGIN EX END", ErrorKind::IllegalToken),
    ];
    for (source, kind) in cases {
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind, kind, "{source}");
        assert!(!err.message.is_empty());
    }
}

#[test]
fn first_error_aborts_compilation() {
    // Two bad genes; only the first is reported
    let err = parse("BEGIN EV PSH CON x END BEGIN EX END BEGIN EV @ END BEGIN EX END").unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidLiteral);
    assert_eq!(err.literal, "x");
}
