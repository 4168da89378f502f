// gramian_core/src/models/dynamics/newton_euler.rs

use crate::frames::{rigid_body_velocity_layout, StateVariable};
use crate::models::dynamics::{Dynamics, State};
use nalgebra::{DVector, Matrix3, Vector3};
use serde::{Deserialize, Serialize};

/// Physical parameters of the tumbling body: a solid cube under uniform gravity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigidBodyParams {
    /// Mass in kg.
    pub mass: f64,
    /// Edge length of the cube in m.
    pub edge_length: f64,
    /// Magnitude of gravity in m/s^2, acting along -z of the world frame.
    pub gravity: f64,
}

impl Default for RigidBodyParams {
    fn default() -> Self {
        Self {
            mass: 1.0,
            edge_length: 1.0,
            gravity: 9.8,
        }
    }
}

impl RigidBodyParams {
    /// Body-frame inertia tensor of a solid cube: `(1/6) m l^2 I`.
    pub fn inertia(&self) -> Matrix3<f64> {
        Matrix3::identity() * (self.mass * self.edge_length * self.edge_length / 6.0)
    }

    /// Gravitational force in the world frame.
    pub fn gravity_force(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.mass * self.gravity)
    }
}

/// Newton-Euler equations for a torque-free rigid body.
///
/// The state is `[v; w]`: translational velocity in the world frame followed by angular
/// velocity in the body frame. Neither equation depends on the pose, so the same velocity
/// history drives any number of initial poses.
#[derive(Debug, Clone)]
pub struct NewtonEulerModel {
    params: RigidBodyParams,
    inertia: Matrix3<f64>,
    inertia_inv: Matrix3<f64>,
}

impl NewtonEulerModel {
    /// Returns `None` when the inertia tensor is singular (zero mass or edge length).
    pub fn new(params: RigidBodyParams) -> Option<Self> {
        let inertia = params.inertia();
        let inertia_inv = inertia.try_inverse()?;
        Some(Self {
            params,
            inertia,
            inertia_inv,
        })
    }

    pub fn params(&self) -> &RigidBodyParams {
        &self.params
    }

    /// Translational acceleration, world frame. Constant: gravity only.
    pub fn linear_acceleration(&self) -> Vector3<f64> {
        self.params.gravity_force() / self.params.mass
    }

    /// Euler's rotation equations with zero applied torque, body frame:
    /// `w_dot = J^-1 (tau - w x (J w))`.
    pub fn angular_acceleration(&self, omega: &Vector3<f64>) -> Vector3<f64> {
        let torque = Vector3::zeros();
        self.inertia_inv * (torque - omega.cross(&(self.inertia * omega)))
    }
}

impl Dynamics for NewtonEulerModel {
    fn get_state_layout(&self) -> Vec<StateVariable> {
        rigid_body_velocity_layout()
    }

    fn get_derivatives(&self, x: &State, _t: f64) -> State {
        let mut x_dot = DVector::zeros(6);
        let omega = Vector3::new(x[3], x[4], x[5]);

        // --- Translational dynamics (world frame) ---
        x_dot
            .fixed_rows_mut::<3>(0)
            .copy_from(&self.linear_acceleration());

        // --- Rotational dynamics (body frame) ---
        x_dot
            .fixed_rows_mut::<3>(3)
            .copy_from(&self.angular_acceleration(&omega));

        x_dot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::integrators::RK4;
    use approx::assert_abs_diff_eq;

    #[test]
    fn cube_inertia_is_isotropic() {
        let params = RigidBodyParams {
            mass: 2.0,
            edge_length: 3.0,
            gravity: 9.8,
        };
        assert_abs_diff_eq!(params.inertia(), Matrix3::identity() * 3.0);
        assert!(NewtonEulerModel::new(RigidBodyParams {
            mass: 0.0,
            ..params
        })
        .is_none());
    }

    #[test]
    fn derivatives_are_gravity_and_zero_spin_up() {
        let model = NewtonEulerModel::new(RigidBodyParams::default()).unwrap();
        assert_eq!(model.get_state_dim(), 6);
        let x = DVector::from_vec(vec![3.0, 5.0, 9.0, 3.0, 2.0, 1.5]);
        let x_dot = model.get_derivatives(&x, 0.0);
        assert_abs_diff_eq!(x_dot[2], -9.8, epsilon = 1e-12);
        assert_abs_diff_eq!(x_dot[0], 0.0);
        // isotropic inertia: w x (J w) = 0, so the spin is constant
        for i in 3..6 {
            assert_abs_diff_eq!(x_dot[i], 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn propagate_integrates_free_fall_velocity() {
        let model = NewtonEulerModel::new(RigidBodyParams::default()).unwrap();
        let x = DVector::from_vec(vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0]);
        let next = model.propagate(&x, 0.0, 0.5, &RK4);
        assert_abs_diff_eq!(next[2], 1.0 - 9.8 * 0.5, epsilon = 1e-12);
    }
}
