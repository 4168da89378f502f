// gramian_core/src/search/families.rs

//! Parametrised families of camera viewpoints and camera paths around an object.
//!
//! Cameras follow the convention of the renderer: they look along their local -z axis
//! with local +y up, and world +z is up.

use std::f64::consts::{FRAC_PI_2, PI};

use nalgebra::{Point3, Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{GramianError, GramianResult};
use crate::search::CandidateFamily;
use crate::types::Pose;
use crate::utils::rotations::{matrix_to_quaternion, rot_x, rot_y, rot_z};
use crate::utils::spacing::linspace;

fn camera_pose(position: Vector3<f64>, rotation: &Rotation3<f64>) -> Pose {
    Pose::new(position, matrix_to_quaternion(rotation, None))
}

fn check_radius(radius: f64) -> GramianResult<()> {
    if !(radius.is_finite() && radius > 0.0) {
        return Err(GramianError::InvalidFamily(format!(
            "radius must be finite and > 0, got {radius}"
        )));
    }
    Ok(())
}

/// A camera direction on the upper hemisphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewpointCandidate {
    pub azimuth: f64,
    pub elevation: f64,
}

/// Single cameras on a sphere around the origin, each pointing at the centre.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SphereViewpoints {
    pub radius: f64,
    pub n_azimuth: usize,
    pub n_elevation: usize,
}

impl SphereViewpoints {
    /// `n_azimuth` directions over the full circle and `n_azimuth / 2` elevations from the
    /// horizon to the zenith.
    pub fn new(radius: f64, n_azimuth: usize) -> GramianResult<Self> {
        Self::with_elevations(radius, n_azimuth, n_azimuth / 2)
    }

    pub fn with_elevations(radius: f64, n_azimuth: usize, n_elevation: usize) -> GramianResult<Self> {
        check_radius(radius)?;
        if n_azimuth == 0 || n_elevation == 0 {
            return Err(GramianError::InvalidFamily(format!(
                "sphere grid needs at least one azimuth and one elevation, got {n_azimuth}x{n_elevation}"
            )));
        }
        Ok(Self {
            radius,
            n_azimuth,
            n_elevation,
        })
    }

    pub fn camera(&self, candidate: &ViewpointCandidate) -> Pose {
        let r = rot_z(candidate.azimuth) * rot_x(-candidate.elevation);
        let position = r * Vector3::new(0.0, -self.radius, 0.0);
        camera_pose(position, &(r * rot_x(FRAC_PI_2)))
    }
}

impl CandidateFamily for SphereViewpoints {
    type Candidate = ViewpointCandidate;

    /// Azimuth-major: candidate `i * n_elevation + j` has azimuth `i` and elevation `j`.
    fn candidates(&self) -> Vec<ViewpointCandidate> {
        let elevations = linspace(0.0, FRAC_PI_2, self.n_elevation, true);
        linspace(0.0, 2.0 * PI, self.n_azimuth, false)
            .into_iter()
            .flat_map(|azimuth| {
                elevations.iter().map(move |&elevation| ViewpointCandidate {
                    azimuth,
                    elevation,
                })
            })
            .collect()
    }

    fn camera_path(&self, candidate: &ViewpointCandidate) -> Vec<Pose> {
        vec![self.camera(candidate)]
    }
}

/// The two angles that orient a semicircular camera arc.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcCandidate {
    pub angle_x: f64,
    pub angle_z: f64,
}

/// Semicircular camera paths over the object, rotated about x then z.
///
/// The unrotated arc starts on the -x axis and passes over the top of `center`. Each path's
/// per-point Gramians are summed with unit weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemicircleArcs {
    pub radius: f64,
    pub n_points: usize,
    pub n_angle_x: usize,
    pub n_angle_z: usize,
    pub center: Point3<f64>,
}

impl SemicircleArcs {
    pub fn new(
        radius: f64,
        n_points: usize,
        n_angle_x: usize,
        n_angle_z: usize,
        center: Point3<f64>,
    ) -> GramianResult<Self> {
        check_radius(radius)?;
        if n_points == 0 || n_angle_x == 0 || n_angle_z == 0 {
            return Err(GramianError::InvalidFamily(format!(
                "arc grid needs non-zero sizes, got {n_points} points and {n_angle_x}x{n_angle_z} angles"
            )));
        }
        Ok(Self {
            radius,
            n_points,
            n_angle_x,
            n_angle_z,
            center,
        })
    }
}

impl CandidateFamily for SemicircleArcs {
    type Candidate = ArcCandidate;

    /// Candidate `i_z * n_angle_x + i_x`.
    fn candidates(&self) -> Vec<ArcCandidate> {
        let angles_x = linspace(-FRAC_PI_2, FRAC_PI_2, self.n_angle_x, true);
        linspace(0.0, PI, self.n_angle_z, true)
            .into_iter()
            .flat_map(|angle_z| {
                angles_x
                    .iter()
                    .map(move |&angle_x| ArcCandidate { angle_x, angle_z })
            })
            .collect()
    }

    fn camera_path(&self, candidate: &ArcCandidate) -> Vec<Pose> {
        let frame = rot_z(candidate.angle_z) * rot_x(candidate.angle_x);
        let mount = rot_z(-FRAC_PI_2) * rot_x(FRAC_PI_2);
        linspace(0.0, PI, self.n_points, true)
            .into_iter()
            .map(|theta| {
                let local = Vector3::new(-self.radius * theta.cos(), 0.0, self.radius * theta.sin());
                let position = frame * local + self.center.coords;
                camera_pose(position, &(frame * rot_y(theta) * mount))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    /// Optical axis (local -z) in world coordinates.
    fn view_direction(camera: &Pose) -> Vector3<f64> {
        camera.orientation * -Vector3::z()
    }

    #[test]
    fn sphere_cameras_look_at_origin_with_z_up() {
        let family = SphereViewpoints::new(5.0, 8).unwrap();
        let candidates = family.candidates();
        assert_eq!(candidates.len(), 8 * 4);
        for c in &candidates {
            let cam = family.camera(c);
            assert_abs_diff_eq!(cam.position.norm(), 5.0, epsilon = 1e-12);
            assert!(cam.position.z >= -1e-12);
            let to_origin = -cam.position.normalize();
            assert_abs_diff_eq!(view_direction(&cam), to_origin, epsilon = 1e-12);
            // camera up never points below the horizon
            let up = cam.orientation * Vector3::y();
            assert!(up.z >= -1e-12, "{up}");
        }
    }

    #[test]
    fn sphere_index_is_azimuth_major() {
        let family = SphereViewpoints::with_elevations(1.0, 4, 3).unwrap();
        let c = family.candidates();
        assert_eq!(c.len(), 12);
        // i = 1, j = 2
        assert_abs_diff_eq!(c[5].azimuth, FRAC_PI_2, epsilon = 1e-12);
        assert_abs_diff_eq!(c[5].elevation, FRAC_PI_2, epsilon = 1e-12);
        assert_eq!(c[3].elevation, 0.0);
    }

    #[test]
    fn first_viewpoint_is_on_negative_y() {
        let family = SphereViewpoints::new(2.0, 4).unwrap();
        let cam = family.camera(&ViewpointCandidate {
            azimuth: 0.0,
            elevation: 0.0,
        });
        assert_abs_diff_eq!(cam.position, Vector3::new(0.0, -2.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(view_direction(&cam), Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn arc_points_look_at_center() {
        let center = Point3::new(0.5, -1.0, 0.25);
        let family = SemicircleArcs::new(3.0, 7, 3, 4, center).unwrap();
        let candidates = family.candidates();
        assert_eq!(candidates.len(), 12);
        for c in &candidates {
            let path = family.camera_path(c);
            assert_eq!(path.len(), 7);
            for cam in &path {
                let offset = cam.position - center.coords;
                assert_abs_diff_eq!(offset.norm(), 3.0, epsilon = 1e-12);
                assert_abs_diff_eq!(view_direction(cam), -offset.normalize(), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn unrotated_arc_passes_over_the_top() {
        let family = SemicircleArcs::new(2.0, 3, 1, 1, Point3::origin()).unwrap();
        let candidates = family.candidates();
        // single x angle is the start of the range
        assert_abs_diff_eq!(candidates[0].angle_x, -FRAC_PI_2, epsilon = 1e-12);
        let path = family.camera_path(&ArcCandidate {
            angle_x: 0.0,
            angle_z: 0.0,
        });
        assert_abs_diff_eq!(path[0].position, Vector3::new(-2.0, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(path[1].position, Vector3::new(0.0, 0.0, 2.0), epsilon = 1e-12);
        assert_abs_diff_eq!(path[2].position, Vector3::new(2.0, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn arc_index_is_z_major() {
        let family = SemicircleArcs::new(1.0, 2, 3, 2, Point3::origin()).unwrap();
        let c = family.candidates();
        // i_z = 1, i_x = 2
        assert_abs_diff_eq!(c[5].angle_z, PI, epsilon = 1e-12);
        assert_abs_diff_eq!(c[5].angle_x, FRAC_PI_2, epsilon = 1e-12);
    }

    #[test]
    fn invalid_families_are_rejected() {
        assert!(SphereViewpoints::new(0.0, 8).is_err());
        assert!(SphereViewpoints::new(1.0, 1).is_err());
        assert!(SemicircleArcs::new(1.0, 0, 2, 2, Point3::origin()).is_err());
    }
}
