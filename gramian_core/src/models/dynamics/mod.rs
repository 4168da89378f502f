// gramian_core/src/models/dynamics/mod.rs

use crate::frames::StateVariable;
use crate::utils::integrators::Integrator;
use nalgebra::DVector;
use std::fmt::Debug;

pub type State = DVector<f64>;

// --- DYNAMICS MODEL TRAIT ---
// Represents the physics of a body with no control input. `x_dot = f(x, t)`
/// Represents the physics model of a rigid body.
/// Defines how the body's velocity state evolves over time.
pub trait Dynamics: Debug + Send + Sync {
    /// Returns the complete layout of the state vector for this specific model.
    /// The order of this Vec defines the indices for the state vector `x`.
    fn get_state_layout(&self) -> Vec<StateVariable>;

    /// Returns the total number of states (the length of the state vector `x`).
    fn get_state_dim(&self) -> usize {
        self.get_state_layout().len()
    }

    /// Computes the time derivative of the state vector: `x_dot = f(x, t)`.
    fn get_derivatives(&self, x: &State, t: f64) -> State;

    /// Propagates the state forward by `dt` using a numerical integrator.
    ///
    /// # Arguments
    /// * `x`: Current state vector.
    /// * `t`: Current time.
    /// * `dt`: Time step duration. Must be non-negative.
    /// * `integrator`: A reference to an object implementing the `Integrator` trait (e.g., `RK4`).
    ///
    /// # Returns
    /// The estimated state vector at time `t + dt`.
    fn propagate(&self, x: &State, t: f64, dt: f64, integrator: &dyn Integrator<f64>) -> State {
        debug_assert!(dt >= 0.0, "Dynamics::propagate: dt cannot be negative");

        let func = |func_x: &State, func_t: f64| -> State { self.get_derivatives(func_x, func_t) };

        integrator.step(&func, x, t, t + dt)
    }
}

pub mod newton_euler;

pub use newton_euler::{NewtonEulerModel, RigidBodyParams};
