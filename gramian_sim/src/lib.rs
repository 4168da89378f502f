// gramian_sim/src/lib.rs

//! Scenario driver for the Gramian engine: a synthetic renderer standing in for the
//! external one, the research scenarios, and their configuration and result files.

// This prelude is for convenience for other files WITHIN the gramian_sim crate.
pub mod prelude;

pub mod cli;
pub mod config;
pub mod error;
pub mod logger;
pub mod persistence;
pub mod renderer;
pub mod scenarios;
