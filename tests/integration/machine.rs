//! Execution semantics through the public API.

use std::sync::Arc;

use moonshot::dsl::pool::{StackPool, MAX_STACK};
use moonshot::dsl::vm::{Fault, Limits, Machine};

use crate::common::*;

#[test]
fn reset_and_execute_bracket_every_tick() {
    let mut m = machine(&always("PSH CON 1 MNE"));
    let mut host = RecordingHost::default();
    for _ in 0..3 {
        m.run(&mut host);
    }
    assert_eq!(host.resets, 3);
    assert_eq!(host.executes, 3);
    assert_eq!(host.actions, vec![Action::Mine(1); 3]);
}

#[test]
fn empty_program_still_brackets() {
    let mut m = machine("");
    let mut host = RecordingHost::default();
    m.run(&mut host);
    assert_eq!((host.resets, host.executes), (1, 1));
    assert!(m.activations().is_empty());
}

#[test]
fn energy_gate_for_reproduction() {
    let source = "BEGIN EV RDE PSH CON 1000 GEQ END BEGIN EX PSH CON 500 REP END";
    let mut m = machine(source);

    let mut rich = RecordingHost::with_energy(1000);
    m.run(&mut rich);
    assert_eq!(rich.actions, vec![Action::Reproduce(500)]);

    let mut poor = RecordingHost::with_energy(999);
    m.run(&mut poor);
    assert!(poor.actions.is_empty());
}

#[test]
fn scan_result_lands_on_stack() {
    let mut m = machine(&always("PSH CON 1 PSH CON 2 SCN"));
    let mut host = RecordingHost {
        scan_result: (16, 17),
        ..RecordingHost::default()
    };
    m.run(&mut host);
    assert_eq!(m.stack(), &[16, 17]);
}

#[test]
fn genes_run_in_order_and_share_registers() {
    let source = "
BEGIN EV PSH CON 1 END
BEGIN EX PSH CON 10 POP REG 4 PSH CON 1 TRN END
BEGIN EV PSH REG 4 PSH CON 10 IEQ END
BEGIN EX PSH CON 2 TRN END
BEGIN EV PSH REG 4 PSH CON 11 IEQ END
BEGIN EX PSH CON 3 TRN END";
    let mut m = machine(source);
    let mut host = RecordingHost::default();
    m.run(&mut host);
    assert_eq!(host.actions, vec![Action::Turn(1), Action::Turn(2)]);
    assert_eq!(m.activations(), &[true, true, false]);
}

#[test]
fn garbage_never_panics() {
    // Every stack-consuming opcode against an empty stack
    let body = "NOT AND IOR XOR ADD SUB MUL DIV NEG ABS RID SCN THR TRN MNE REP IMP GEQ LEQ IEQ GRT LST";
    let mut m = machine(&format!("BEGIN EV {body} END BEGIN EX {body} END"));
    let mut host = RecordingHost::default();
    m.run(&mut host);
    assert!(host.actions.is_empty());
    assert_eq!(m.activations(), &[false]);
    assert_eq!(m.fault_count(), 22);
}

#[test]
fn overflowing_pushes_are_dropped() {
    let pushes = "PSH CON 1 ".repeat(MAX_STACK + 10);
    let mut m = machine(&always(&pushes));
    let mut faults = 0;
    m.run_with(&mut RecordingHost::default(), |step| {
        if step.fault == Some(Fault::StackOverflow) {
            faults += 1;
        }
    });
    assert_eq!(m.stack().len(), MAX_STACK);
    assert_eq!(faults, 10);
}

#[test]
fn watchdog_bounds_long_sections() {
    let pushes = "PSH CON 1 ".repeat(100);
    let mut m = machine(&always(&pushes)).with_limits(Limits {
        max_steps_per_phase: Some(11),
    });
    m.run(&mut RecordingHost::default());
    assert_eq!(m.stack().len(), 10);
}

#[test]
fn machines_on_many_threads_share_one_pool() {
    let pool = Arc::new(StackPool::new(8));
    let program = compile(&always("PSH REG 0 PSH CON 1 ADD POP REG 0"));

    std::thread::scope(|s| {
        for _ in 0..4 {
            let pool = Arc::clone(&pool);
            let program = Arc::clone(&program);
            s.spawn(move || {
                let mut m = Machine::with_pool(program, &pool);
                let mut host = RecordingHost::default();
                for _ in 0..50 {
                    m.run(&mut host);
                }
                assert_eq!(m.registers()[0], 50);
            });
        }
    });
    assert!((1..=4).contains(&pool.idle()));
}
