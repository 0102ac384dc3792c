//! World ticking, scenarios and settings files.

use moonshot::error::AppError;
use moonshot::settings::{load_settings, save_settings, SimSettings};
use moonshot::sim::scenario::{self, DEMO_PROGRAM};
use moonshot::sim::{Bot, World};

use crate::common::*;

fn world_with(workers: usize) -> World {
    World::new(&SimSettings {
        workers,
        ..SimSettings::default()
    })
    .expect("world")
}

#[test]
fn demo_scenario_is_deterministic_across_worker_counts() {
    let mut serial = world_with(1);
    let mut parallel = world_with(4);
    scenario::find("all").unwrap().load(&mut serial).unwrap();
    scenario::find("all").unwrap().load(&mut parallel).unwrap();

    serial.advance(300);
    parallel.advance(300);

    for (a, b) in serial.bots().iter().zip(parallel.bots()) {
        let (a, b) = (a.snapshot(), b.snapshot());
        assert_eq!(a.registers, b.registers);
        assert_eq!(a.position, b.position);
        assert_eq!(a.heading, b.heading);
    }
}

#[test]
fn many_bots_share_one_program() {
    let program = compile(DEMO_PROGRAM);
    let mut world = world_with(3);
    for id in 0..100 {
        world.spawn(Bot::new(id, program.clone()));
    }
    world.advance(10);
    assert!(world.bots().iter().all(|b| b.machine().registers()[1] == 10));
    assert_eq!(std::sync::Arc::strong_count(&program), 101);
}

#[test]
fn settings_file_drives_world() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sim.json");
    let settings = SimSettings {
        workers: 2,
        cycles_per_tick: 2,
        default_scenario: "idle".into(),
        ..SimSettings::default()
    };
    save_settings(&path, &settings).unwrap();

    let loaded = load_settings(&path).unwrap().unwrap();
    let mut world = World::new(&loaded).unwrap();
    scenario::find(&loaded.default_scenario).unwrap().load(&mut world).unwrap();
    assert_eq!(world.len(), 1);
    assert_eq!(world.workers(), 2);

    world
        .bot_mut(0)
        .unwrap()
        .reprogram("counter", &always("PSH REG 0 PSH CON 1 ADD POP REG 0"))
        .unwrap();
    world.advance(3);
    assert_eq!(world.bots()[0].machine().registers()[0], 6);
}

#[test]
fn rejected_program_is_reported_with_its_name() {
    let mut bot = Bot::idle(1);
    let err = bot.reprogram("pilot", "BEGIN EV ; END BEGIN EX END").unwrap_err();
    match err {
        AppError::Compile { name, source } => {
            assert_eq!(name, "pilot");
            assert_eq!(source.literal, ";");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(bot.machine().program().is_empty());
}

#[test]
fn unknown_scenario_is_an_error() {
    assert!(matches!(
        scenario::find("asteroid"),
        Err(AppError::UnknownScenario { name }) if name == "asteroid"
    ));
}
