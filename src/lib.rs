//! Bot control language runtime: lexer, compiler, fail-soft stack machine and
//! a small reference simulation that drives many machines in parallel.

pub mod dsl;
pub mod error;
pub mod settings;
pub mod sim;
