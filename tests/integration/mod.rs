//! Integration tests, grouped by component.

pub mod compiler;
pub mod machine;
pub mod simulation;
