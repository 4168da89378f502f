// gramian_sim/src/prelude.rs

// Re-export the entire gramian_core prelude so you can easily access
// pure types like `Pose`, `Gramian`, `ObservationAdapter`, etc.
pub use gramian_core::prelude::*;

// Re-export common driver types.
pub use crate::config::SimConfig;
pub use crate::error::{SimError, SimResult};
pub use crate::persistence::{load_batch, save_batch, save_json, ExtremumRecord};
pub use crate::renderer::{PinholeCamera, PixelNoise, SplatRenderer};
pub use crate::scenarios::{format_latex, observation_setup, DynamicOutcome, EpsilonSweep};
