//! Shared helpers for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use moonshot::dsl::ast::Program;
use moonshot::dsl::compile_source;
use moonshot::dsl::host::HostState;
use moonshot::dsl::vm::Machine;

/// Compile or panic; test programs are expected to be valid.
pub fn compile(source: &str) -> Arc<Program> {
    compile_source(source).expect("test program should compile")
}

/// Fresh machine for `source`.
pub fn machine(source: &str) -> Machine {
    Machine::new(compile(source))
}

/// Program with a single always-active gene whose execute section is `body`.
pub fn always(body: &str) -> String {
    format!("BEGIN EV PSH CON 1 END\nBEGIN EX\n{body}\nEND\n")
}

/// Actuator call seen by [`RecordingHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RemoteId(i16),
    Scan(i16, i16),
    Thrust(i16, i16),
    Turn(i16),
    Mine(i16),
    Reproduce(i16),
    Impulse(i16),
}

/// Host with fixed sensor readings that records every actuator call.
#[derive(Debug, Default, Clone)]
pub struct RecordingHost {
    pub x: i16,
    pub y: i16,
    pub energy: i16,
    pub id: i16,
    pub scan_result: (i16, i16),
    pub actions: Vec<Action>,
    pub resets: usize,
    pub executes: usize,
}

impl RecordingHost {
    pub fn with_energy(energy: i16) -> Self {
        Self {
            energy,
            ..Self::default()
        }
    }
}

impl HostState for RecordingHost {
    fn reset(&mut self) {
        self.resets += 1;
    }

    fn execute(&mut self) {
        self.executes += 1;
    }

    fn x(&self) -> i16 {
        self.x
    }

    fn y(&self) -> i16 {
        self.y
    }

    fn energy(&self) -> i16 {
        self.energy
    }

    fn id(&self) -> i16 {
        self.id
    }

    fn remote_id(&mut self, id: i16) -> i16 {
        self.actions.push(Action::RemoteId(id));
        id
    }

    fn scan(&mut self, x: i16, y: i16) -> (i16, i16) {
        self.actions.push(Action::Scan(x, y));
        self.scan_result
    }

    fn thrust(&mut self, x: i16, y: i16) {
        self.actions.push(Action::Thrust(x, y));
    }

    fn turn(&mut self, angle: i16) {
        self.actions.push(Action::Turn(angle));
    }

    fn mine(&mut self, strength: i16) {
        self.actions.push(Action::Mine(strength));
    }

    fn reproduce(&mut self, energy: i16) {
        self.actions.push(Action::Reproduce(energy));
    }

    fn impulse(&mut self, strength: i16) {
        self.actions.push(Action::Impulse(strength));
    }
}
