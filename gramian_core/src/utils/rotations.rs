// gramian_core/src/utils/rotations.rs

//! Elementary rotations and conversions between rotation matrices and quaternions.

use nalgebra::{Rotation3, UnitQuaternion, Vector3};

/// Rotation by `theta` about the x axis.
pub fn rot_x(theta: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), theta)
}

/// Rotation by `theta` about the y axis.
pub fn rot_y(theta: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), theta)
}

/// Rotation by `theta` about the z axis.
pub fn rot_z(theta: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), theta)
}

/// Static-axes x-y-z Euler angles: `R = Rz(az) * Ry(ay) * Rx(ax)`.
pub fn euler_sxyz(ax: f64, ay: f64, az: f64) -> Rotation3<f64> {
    rot_z(az) * rot_y(ay) * rot_x(ax)
}

/// Converts a rotation matrix to a unit quaternion, explicitly renormalized.
///
/// When `reference` is given, the sign is chosen so that the result lies in the same
/// hemisphere as `reference` (q and -q encode the same rotation).
pub fn matrix_to_quaternion(
    rotation: &Rotation3<f64>,
    reference: Option<&UnitQuaternion<f64>>,
) -> UnitQuaternion<f64> {
    let q = UnitQuaternion::from_rotation_matrix(rotation);
    let mut raw = q.into_inner();
    let flip = match reference {
        Some(r) => raw.dot(r.quaternion()) < 0.0,
        // canonical form: non-negative scalar part
        None => raw.w < 0.0,
    };
    if flip {
        raw = -raw;
    }
    UnitQuaternion::new_normalize(raw)
}
