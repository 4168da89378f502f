// gramian_core/src/lib.rs

// This file defines the public modules of your library.
pub mod error;
pub mod frames;
pub mod gramian;
pub mod models;
pub mod observation;
pub mod perturbation;
pub mod prelude;
pub mod search;
pub mod types;
pub mod utils;
