//! Reference simulation: bots with a simple kinematic body, ticked in
//! parallel on a fixed worker pool.

pub mod bot;
pub mod scenario;
pub mod vector;
pub mod world;

pub use bot::{Body, Bot, BotSnapshot};
pub use vector::Vec2;
pub use world::World;
