use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use super::bot::Bot;
use super::world::World;
use crate::dsl::compile_source;
use crate::error::AppError;

/// Six genes on two counters: brake above speed 200, turn 10° and kick every
/// 80 ticks (reg 0), kick forward every 20 ticks (reg 1), and reproduce once
/// energy reaches 1000.
pub const DEMO_PROGRAM: &str = "
BEGIN EV
    // enough energy to split?
    RDE
    PSH CON 1000
    GEQ
END
BEGIN EX
    PSH CON 500
    REP
END

BEGIN EV
    // speed >= 200
    RDX
    RDY
    ABS
    PSH CON 200
    GEQ
END
BEGIN EX
    PSH CON 0
    POP REG 0
    // thrust against current velocity
    RDX
    NEG
    RDY
    NEG
    THR
END

// reg 0 counts up to the next turn
BEGIN EV
    PSH REG 0
    PSH CON 80
    LEQ
END
BEGIN EX
    PSH REG 0
    PSH CON 1
    ADD
    POP REG 0
END

BEGIN EV
    PSH REG 0
    PSH CON 80
    GRT
END
BEGIN EX
    PSH CON 0
    POP REG 0
    PSH CON 10
    TRN
    PSH CON 500
    IMP
END

// reg 1 counts up to the next kick
BEGIN EV
    PSH REG 1
    PSH CON 20
    LEQ
END
BEGIN EX
    PSH REG 1
    PSH CON 1
    ADD
    POP REG 1
END

BEGIN EV
    PSH REG 1
    PSH CON 20
    GRT
END
BEGIN EX
    PSH CON 500
    IMP
    PSH CON 0
    POP REG 1
END
";

/// A named world setup.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip)]
    load: fn(&mut World) -> Result<(), AppError>,
}

impl Scenario {
    pub fn load(&self, world: &mut World) -> Result<(), AppError> {
        (self.load)(world)?;
        info!(scenario = self.name, bots = world.len(), "scenario loaded");
        Ok(())
    }
}

static SCENARIOS: LazyLock<IndexMap<&'static str, Scenario>> = LazyLock::new(|| {
    [
        Scenario {
            name: "all",
            description: "two drifting bots and one running the demo program",
            load: load_all,
        },
        Scenario {
            name: "idle",
            description: "a single bot with no program",
            load: load_idle,
        },
    ]
    .into_iter()
    .map(|s| (s.name, s))
    .collect()
});

/// Registered scenarios in display order.
pub fn scenarios() -> impl Iterator<Item = &'static Scenario> {
    SCENARIOS.values()
}

pub fn find(name: &str) -> Result<&'static Scenario, AppError> {
    SCENARIOS.get(name).ok_or_else(|| AppError::UnknownScenario {
        name: name.to_string(),
    })
}

fn load_all(world: &mut World) -> Result<(), AppError> {
    world.spawn(Bot::idle(1).with_position(0.0, 100.0).with_velocity(100.0, 0.0));
    world.spawn(Bot::idle(2).with_position(600.0, 100.0).with_velocity(-10.0, 0.0));

    let program = compile_source(DEMO_PROGRAM).map_err(|source| AppError::Compile {
        name: "demo".to_string(),
        source,
    })?;
    world.spawn(Bot::new(3, program).with_position(200.0, 200.0));
    Ok(())
}

fn load_idle(world: &mut World) -> Result<(), AppError> {
    world.spawn(Bot::idle(1));
    Ok(())
}
