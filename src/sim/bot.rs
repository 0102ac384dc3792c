use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, trace, warn};

use super::vector::Vec2;
use crate::dsl::ast::Program;
use crate::dsl::host::HostState;
use crate::dsl::parser::parse;
use crate::dsl::vm::{Limits, Machine, REGISTER_COUNT};
use crate::error::AppError;

/// Mass of a freshly built bot.
pub const DEFAULT_MASS: f64 = 100.0;

/// Share of mass a bot can turn into usable energy.
pub const REACTOR_EFFICIENCY: f64 = 0.65;

/// Longest thrust vector applied in one tick.
pub const MAX_THRUST: f64 = 300.0;

/// The physical side of a bot: the sensors a machine reads and the actuators
/// it drives.
///
/// Thrust requested during a tick is accumulated and applied once, in
/// `execute`. Position only changes in [`Body::integrate`], which the world
/// calls after every machine has finished.
#[derive(Debug, Clone, Serialize)]
pub struct Body {
    id: i16,
    pub position: Vec2,
    pub velocity: Vec2,
    pub mass: f64,
    /// Heading in radians.
    pub angle: f64,
    thrust: Vec2,
    /// Impulses applied since the last frame reset.
    impulses: Vec<Vec2>,
    mined: u32,
    reproduced: u32,
}

impl Body {
    pub fn new(id: i16) -> Self {
        Self {
            id,
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            mass: DEFAULT_MASS,
            angle: 0.0,
            thrust: Vec2::ZERO,
            impulses: Vec::new(),
            mined: 0,
            reproduced: 0,
        }
    }

    /// Thrust accumulated so far this tick.
    pub fn pending_thrust(&self) -> Vec2 {
        self.thrust
    }

    pub fn impulses(&self) -> &[Vec2] {
        &self.impulses
    }

    /// Heading in whole degrees, `0..360`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn heading_degrees(&self) -> i32 {
        (self.angle.to_degrees().round() as i32).rem_euclid(360)
    }

    pub fn mine_count(&self) -> u32 {
        self.mined
    }

    pub fn reproduce_count(&self) -> u32 {
        self.reproduced
    }

    /// Forget impulses recorded during the previous frame.
    pub fn frame_reset(&mut self) {
        self.impulses.clear();
    }

    /// Advance position by one physics step.
    pub fn integrate(&mut self, dt: f64) {
        self.position += self.velocity.scale(dt);
    }
}

/// Round to the nearest `i16`, saturating at the ends of the range.
#[allow(clippy::cast_possible_truncation)]
fn round_i16(value: f64) -> i16 {
    value.round().clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}

impl HostState for Body {
    fn reset(&mut self) {
        self.thrust = Vec2::ZERO;
    }

    fn execute(&mut self) {
        if self.thrust.is_zero() {
            return;
        }
        let impulse = self.thrust.clamp(MAX_THRUST);
        self.velocity += impulse.scale(1.0 / self.mass);
        self.impulses.push(impulse);
        trace!(bot = self.id, x = impulse.x, y = impulse.y, "thrust applied");
    }

    fn x(&self) -> i16 {
        round_i16(self.velocity.x)
    }

    fn y(&self) -> i16 {
        round_i16(self.velocity.y)
    }

    fn energy(&self) -> i16 {
        round_i16(self.mass * REACTOR_EFFICIENCY)
    }

    fn id(&self) -> i16 {
        self.id
    }

    fn remote_id(&mut self, _id: i16) -> i16 {
        1
    }

    fn scan(&mut self, _x: i16, _y: i16) -> (i16, i16) {
        (0, 0)
    }

    fn thrust(&mut self, x: i16, y: i16) {
        self.thrust += Vec2::new(f64::from(x), f64::from(y));
    }

    fn turn(&mut self, angle: i16) {
        self.angle += f64::from(angle).to_radians();
        trace!(bot = self.id, degrees = angle, heading = self.heading_degrees(), "turn");
    }

    fn mine(&mut self, _strength: i16) {
        self.mined += 1;
    }

    fn reproduce(&mut self, _energy: i16) {
        self.reproduced += 1;
    }

    fn impulse(&mut self, strength: i16) {
        self.thrust += Vec2::for_angle(self.angle).scale(f64::from(strength));
    }
}

/// A machine together with the body it drives.
#[derive(Debug)]
pub struct Bot {
    machine: Machine,
    body: Body,
}

impl Bot {
    pub fn new(id: i16, program: Arc<Program>) -> Self {
        Self {
            machine: Machine::new(program),
            body: Body::new(id),
        }
    }

    /// A bot with no genes. Its machine runs but never acts.
    pub fn idle(id: i16) -> Self {
        Self::new(id, Arc::new(Program::empty()))
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.body.position = Vec2::new(x, y);
        self
    }

    pub fn with_velocity(mut self, x: f64, y: f64) -> Self {
        self.body.velocity = Vec2::new(x, y);
        self
    }

    pub fn id(&self) -> i16 {
        self.body.id
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.machine.set_limits(limits);
    }

    /// Install an already compiled program.
    pub fn set_program(&mut self, program: Arc<Program>) {
        debug!(bot = self.id(), genes = program.len(), "program installed");
        self.machine.load(program);
    }

    /// Compile `source` and install it. On error the current program stays.
    pub fn reprogram(&mut self, name: &str, source: &str) -> Result<(), AppError> {
        match parse(source) {
            Ok(program) => {
                self.set_program(Arc::new(program));
                Ok(())
            }
            Err(source_err) => {
                warn!(bot = self.id(), program = name, error = %source_err, "program rejected");
                Err(AppError::Compile {
                    name: name.to_string(),
                    source: source_err,
                })
            }
        }
    }

    /// One machine run against this bot's body.
    pub fn run(&mut self) {
        self.machine.run(&mut self.body);
    }

    pub fn snapshot(&self) -> BotSnapshot {
        BotSnapshot {
            id: self.id(),
            position: self.body.position,
            velocity: self.body.velocity,
            heading: self.body.heading_degrees(),
            energy: self.body.energy(),
            registers: *self.machine.registers(),
            activations: self.machine.activations().to_vec(),
            faults: self.machine.fault_count(),
        }
    }
}

/// Point-in-time view of a bot, for reporting.
#[derive(Debug, Clone, Serialize)]
pub struct BotSnapshot {
    pub id: i16,
    pub position: Vec2,
    pub velocity: Vec2,
    pub heading: i32,
    pub energy: i16,
    pub registers: [i16; REGISTER_COUNT],
    pub activations: Vec<bool>,
    pub faults: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn sensors_round_velocity_and_energy() {
        let mut body = Body::new(4);
        body.velocity = Vec2::new(100.4, -10.6);
        assert_eq!(body.x(), 100);
        assert_eq!(body.y(), -11);
        assert_eq!(body.energy(), 65);
        assert_eq!(body.id(), 4);

        body.mass = 1600.0;
        assert_eq!(body.energy(), 1040);
        body.velocity = Vec2::new(1e9, -1e9);
        assert_eq!(body.x(), i16::MAX);
        assert_eq!(body.y(), i16::MIN);
    }

    #[test]
    fn thrust_accumulates_until_execute() {
        let mut body = Body::new(1);
        body.thrust(3, 0);
        body.thrust(0, 4);
        assert_eq!(body.pending_thrust(), Vec2::new(3.0, 4.0));
        assert_eq!(body.velocity, Vec2::ZERO);

        body.execute();
        assert!((body.velocity.x - 0.03).abs() < EPS);
        assert!((body.velocity.y - 0.04).abs() < EPS);
        assert_eq!(body.impulses().len(), 1);
    }

    #[test]
    fn thrust_is_clamped() {
        let mut body = Body::new(1);
        body.thrust(300, 400);
        body.execute();
        assert!((body.velocity.x - 1.8).abs() < EPS);
        assert!((body.velocity.y - 2.4).abs() < EPS);
    }

    #[test]
    fn reset_drops_pending_thrust() {
        let mut body = Body::new(1);
        body.thrust(50, 50);
        body.reset();
        body.execute();
        assert_eq!(body.velocity, Vec2::ZERO);
        assert!(body.impulses().is_empty());
    }

    #[test]
    fn impulse_follows_heading() {
        let mut body = Body::new(1);
        body.turn(90);
        assert_eq!(body.heading_degrees(), 90);
        body.impulse(10);
        let thrust = body.pending_thrust();
        assert!(thrust.x.abs() < EPS);
        assert!((thrust.y - 10.0).abs() < EPS);

        body.turn(-180);
        assert_eq!(body.heading_degrees(), 270);
    }

    #[test]
    fn stub_sensors_and_counters() {
        let mut body = Body::new(1);
        assert_eq!(body.remote_id(9), 1);
        assert_eq!(body.scan(5, 5), (0, 0));
        body.mine(3);
        body.reproduce(500);
        body.reproduce(500);
        assert_eq!(body.mine_count(), 1);
        assert_eq!(body.reproduce_count(), 2);
    }

    #[test]
    fn integrate_moves_by_velocity() {
        let mut body = Body::new(1);
        body.velocity = Vec2::new(60.0, -30.0);
        body.integrate(0.5);
        assert_eq!(body.position, Vec2::new(30.0, -15.0));
    }

    #[test]
    fn bot_runs_program_against_body() {
        let mut bot = Bot::idle(2).with_velocity(250.0, 0.0);
        bot.reprogram("brake", "BEGIN EV RDX RDY ABS PSH CON 200 GEQ END BEGIN EX RDX NEG RDY NEG THR END")
            .unwrap();
        bot.run();
        assert_eq!(bot.machine().activations(), &[true]);
        assert!((bot.body().velocity.x - 247.5).abs() < EPS);
    }

    #[test]
    fn failed_reprogram_keeps_old_program() {
        let mut bot = Bot::idle(2);
        bot.reprogram("counter", "BEGIN EV PSH CON 1 END BEGIN EX PSH REG 0 PSH CON 1 ADD POP REG 0 END")
            .unwrap();

        let err = bot.reprogram("broken", "BEGIN EV PSH CON END").unwrap_err();
        assert!(matches!(err, AppError::Compile { ref name, .. } if name == "broken"));

        bot.run();
        bot.run();
        assert_eq!(bot.machine().registers()[0], 2);
    }

    #[test]
    fn snapshot_reports_machine_state() {
        let mut bot = Bot::idle(7).with_position(1.0, 2.0);
        bot.reprogram("r", "BEGIN EV PSH CON 0 END BEGIN EX END BEGIN EV PSH CON 1 END BEGIN EX PSH CON 5 POP REG 15 END")
            .unwrap();
        bot.run();

        let snap = bot.snapshot();
        assert_eq!(snap.id, 7);
        assert_eq!(snap.position, Vec2::new(1.0, 2.0));
        assert_eq!(snap.activations, vec![false, true]);
        assert_eq!(snap.registers[15], 5);
        assert_eq!(snap.energy, 65);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["registers"][15], 5);
    }
}
