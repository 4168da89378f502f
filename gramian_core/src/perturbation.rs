// gramian_core/src/perturbation.rs

//! Symmetric pose perturbations for central-difference derivatives.

use nalgebra::Vector3;

use crate::error::{GramianError, GramianResult};
use crate::frames::Dof;
use crate::types::Pose;
use crate::utils::rotations::{matrix_to_quaternion, rot_x, rot_y, rot_z};

/// Two perturbations (minus, plus) per degree of freedom.
pub const PERTURBATION_COUNT: usize = 12;

/// The 12 perturbed poses around a nominal pose, ordered
/// `(-x, +x, -y, +y, -z, +z, -rotx, +rotx, -roty, +roty, -rotz, +rotz)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbationSet {
    nominal: Pose,
    eps: f64,
    poses: [Pose; PERTURBATION_COUNT],
}

impl PerturbationSet {
    /// Wraps externally produced perturbed poses (e.g. time-aligned perturbed trajectories).
    /// The poses must already follow the standard ordering.
    pub fn from_poses(nominal: Pose, eps: f64, poses: [Pose; PERTURBATION_COUNT]) -> Self {
        Self {
            nominal,
            eps,
            poses,
        }
    }

    pub fn nominal(&self) -> &Pose {
        &self.nominal
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    pub fn poses(&self) -> &[Pose; PERTURBATION_COUNT] {
        &self.poses
    }

    /// The `(minus, plus)` pair for one degree of freedom.
    pub fn pair(&self, dof: Dof) -> (&Pose, &Pose) {
        let i = 2 * dof.index();
        (&self.poses[i], &self.poses[i + 1])
    }
}

/// Generates the standard perturbation set of `pose`.
///
/// Translations move the position by `±eps` along the world axes. Rotations compose the
/// nominal rotation with an elementary rotation of `±eps` about the body axis,
/// `R_nominal * R_axis(±eps)`, converted back to a renormalized unit quaternion that is
/// sign-aligned with the nominal one.
pub fn perturb(pose: &Pose, eps: f64) -> GramianResult<PerturbationSet> {
    if !(eps.is_finite() && eps > 0.0) {
        return Err(GramianError::InvalidEpsilon { eps });
    }
    let r_nominal = pose.orientation.to_rotation_matrix();
    let mut poses = [*pose; PERTURBATION_COUNT];

    for dof in Dof::ALL {
        for (slot, sign) in [(0, -1.0), (1, 1.0)] {
            let delta = sign * eps;
            let perturbed = &mut poses[2 * dof.index() + slot];
            if dof.is_translation() {
                let mut offset = Vector3::zeros();
                offset[dof.axis()] = delta;
                perturbed.position = pose.position + offset;
            } else {
                let r_delta = match dof {
                    Dof::RotX => rot_x(delta),
                    Dof::RotY => rot_y(delta),
                    _ => rot_z(delta),
                };
                perturbed.orientation =
                    matrix_to_quaternion(&(r_nominal * r_delta), Some(&pose.orientation));
            }
        }
    }

    Ok(PerturbationSet {
        nominal: *pose,
        eps,
        poses,
    })
}
