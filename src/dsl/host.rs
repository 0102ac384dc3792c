/// The object a machine reads sensors from and sends actuator commands to.
///
/// Implemented by the simulation, not by the runtime. For one bot, `reset`,
/// the per-gene calls and `execute` are all made by the worker currently
/// ticking that bot, so implementations need no locking of their own.
///
/// Actuators accumulate intent for the current tick; nothing should take
/// effect until `execute`.
pub trait HostState {
    /// Start of tick: forget last tick's accumulated intent.
    fn reset(&mut self);
    /// End of tick: apply accumulated intent.
    fn execute(&mut self);

    /// Velocity x component.
    fn x(&self) -> i16;
    /// Velocity y component.
    fn y(&self) -> i16;
    /// Usable energy (mass times reactor efficiency).
    fn energy(&self) -> i16;
    fn id(&self) -> i16;

    fn remote_id(&mut self, id: i16) -> i16;
    /// Nearest object along the relative vector `(x, y)`.
    fn scan(&mut self, x: i16, y: i16) -> (i16, i16);
    fn thrust(&mut self, x: i16, y: i16);
    /// Turn by `angle` degrees.
    fn turn(&mut self, angle: i16);
    fn mine(&mut self, strength: i16);
    fn reproduce(&mut self, energy: i16);
    /// Push along the current heading.
    fn impulse(&mut self, strength: i16);
}

/// Recording host for unit tests.
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub(crate) struct MockHost {
    pub x: i16,
    pub y: i16,
    pub energy: i16,
    pub id: i16,
    pub scan_result: (i16, i16),
    pub remote_id_result: i16,
    pub calls: Vec<Call>,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Call {
    Reset,
    Execute,
    RemoteId(i16),
    Scan(i16, i16),
    Thrust(i16, i16),
    Turn(i16),
    Mine(i16),
    Reproduce(i16),
    Impulse(i16),
}

#[cfg(test)]
impl MockHost {
    /// Calls other than the `reset`/`execute` bracketing.
    pub fn actions(&self) -> Vec<Call> {
        self.calls
            .iter()
            .copied()
            .filter(|c| !matches!(c, Call::Reset | Call::Execute))
            .collect()
    }
}

#[cfg(test)]
impl HostState for MockHost {
    fn reset(&mut self) {
        self.calls.push(Call::Reset);
    }

    fn execute(&mut self) {
        self.calls.push(Call::Execute);
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
        self.calls.push(Call::RemoteId(id));
        self.remote_id_result
    }

    fn scan(&mut self, x: i16, y: i16) -> (i16, i16) {
        self.calls.push(Call::Scan(x, y));
        self.scan_result
    }

    fn thrust(&mut self, x: i16, y: i16) {
        self.calls.push(Call::Thrust(x, y));
    }

    fn turn(&mut self, angle: i16) {
        self.calls.push(Call::Turn(angle));
    }

    fn mine(&mut self, strength: i16) {
        self.calls.push(Call::Mine(strength));
    }

    fn reproduce(&mut self, energy: i16) {
        self.calls.push(Call::Reproduce(energy));
    }

    fn impulse(&mut self, strength: i16) {
        self.calls.push(Call::Impulse(strength));
    }
}
