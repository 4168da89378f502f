// gramian_core/src/models/kinematics.rs

//! Forward-Euler pose kinematics driven by a precomputed velocity history.

use crate::models::trajectory::RigidBodyState;
use crate::types::Pose;
use nalgebra::{Matrix4, Quaternion, UnitQuaternion, Vector3, Vector4};

/// The quaternion-rate operator for a body-frame angular velocity, already scaled by 1/2:
/// `q_dot = omega_matrix(w) * q` with `q` scalar-first `[w, x, y, z]`.
pub fn omega_matrix(omega: &Vector3<f64>) -> Matrix4<f64> {
    let (wx, wy, wz) = (omega.x, omega.y, omega.z);
    #[rustfmt::skip]
    let m = Matrix4::new(
        0.0, -wx, -wy, -wz,
        wx,  0.0,  wz, -wy,
        wy,  -wz, 0.0,  wx,
        wz,   wy, -wx, 0.0,
    );
    m * 0.5
}

/// Scalar-first components of a unit quaternion.
pub fn quaternion_to_wxyz(q: &UnitQuaternion<f64>) -> Vector4<f64> {
    Vector4::new(q.w, q.i, q.j, q.k)
}

/// Time derivative of the orientation quaternion, scalar-first.
pub fn quaternion_rate(q: &UnitQuaternion<f64>, omega_body: &Vector3<f64>) -> Vector4<f64> {
    omega_matrix(omega_body) * quaternion_to_wxyz(q)
}

/// One explicit Euler step of the pose. The quaternion is renormalized every step;
/// without it the explicit scheme drifts off the unit sphere.
pub fn euler_step(pose: &Pose, state: &RigidBodyState, dt: f64) -> Pose {
    let position = pose.position + state.velocity * dt;
    let q = quaternion_to_wxyz(&pose.orientation) + quaternion_rate(&pose.orientation, &state.angular_velocity) * dt;
    let orientation = UnitQuaternion::new_normalize(Quaternion::new(q[0], q[1], q[2], q[3]));
    Pose::new(position, orientation)
}

/// Integrates poses on a uniform grid of spacing `dt`. Pose `i` is built from pose `i-1`
/// and the velocities at sample `i-1`; the result has one pose per velocity sample.
pub fn integrate_kinematics(initial: &Pose, states: &[RigidBodyState], dt: f64) -> Vec<Pose> {
    let mut poses = Vec::with_capacity(states.len());
    if states.is_empty() {
        return poses;
    }
    let mut current = *initial;
    poses.push(current);
    for state in &states[..states.len() - 1] {
        current = euler_step(&current, state, dt);
        poses.push(current);
    }
    poses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::rotations::{euler_sxyz, matrix_to_quaternion};
    use approx::assert_abs_diff_eq;

    #[test]
    fn omega_matrix_matches_quaternion_product() {
        let q = matrix_to_quaternion(&euler_sxyz(0.1, 0.3, 0.1), None);
        let omega = Vector3::new(3.0, 2.0, 1.5);
        let expected = q.quaternion() * Quaternion::from_imag(omega) * 0.5;
        let rate = quaternion_rate(&q, &omega);
        assert_abs_diff_eq!(rate[0], expected.w, epsilon = 1e-12);
        assert_abs_diff_eq!(rate[1], expected.i, epsilon = 1e-12);
        assert_abs_diff_eq!(rate[2], expected.j, epsilon = 1e-12);
        assert_abs_diff_eq!(rate[3], expected.k, epsilon = 1e-12);
    }

    #[test]
    fn quaternion_stays_unit_after_many_steps() {
        let state = RigidBodyState {
            velocity: Vector3::new(1.0, 0.0, 0.0),
            angular_velocity: Vector3::new(30.0, -20.0, 15.0),
        };
        let states = vec![state; 5000];
        let poses = integrate_kinematics(&Pose::identity(), &states, 1e-2);
        assert_eq!(poses.len(), 5000);
        for pose in &poses {
            assert_abs_diff_eq!(pose.orientation.quaternion().norm(), 1.0, epsilon = 1e-9);
        }
        assert_abs_diff_eq!(poses[4999].position.x, 49.99, epsilon = 1e-9);
    }
}
