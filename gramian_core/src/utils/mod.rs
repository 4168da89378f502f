// gramian_core/src/utils/mod.rs

pub mod integrators;
pub mod rotations;
pub mod serde_helpers;
pub mod spacing;
