// gramian_core/src/models/mod.rs

pub mod dynamics;
pub mod kinematics;
pub mod trajectory;
