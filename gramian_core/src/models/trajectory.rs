// gramian_core/src/models/trajectory.rs

use nalgebra::{DVector, Vector3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GramianError, GramianResult};
use crate::frames::rigid_body_velocity_layout;
use crate::models::dynamics::Dynamics;
use crate::models::kinematics::integrate_kinematics;
use crate::perturbation::{perturb, PerturbationSet, PERTURBATION_COUNT};
use crate::types::Pose;
use crate::utils::integrators::Integrator;

/// Velocity state of the rigid body at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RigidBodyState {
    /// Translational velocity, world frame.
    pub velocity: Vector3<f64>,
    /// Angular velocity, body frame.
    pub angular_velocity: Vector3<f64>,
}

impl RigidBodyState {
    /// Length of the state vector `[v; w]`.
    pub const DIM: usize = 6;

    fn to_vector(self) -> DVector<f64> {
        DVector::from_iterator(
            Self::DIM,
            self.velocity.iter().chain(self.angular_velocity.iter()).copied(),
        )
    }

    fn from_vector(x: &DVector<f64>) -> Self {
        Self {
            velocity: Vector3::new(x[0], x[1], x[2]),
            angular_velocity: Vector3::new(x[3], x[4], x[5]),
        }
    }
}

/// Uniform time grid `t0, t0 + dt, ..., tf` with `n_points` samples. Only constructed
/// through [`TimeGrid::new`], deserialisation included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeGrid")]
pub struct TimeGrid {
    t0: f64,
    tf: f64,
    n_points: usize,
}

#[derive(Deserialize)]
struct RawTimeGrid {
    t0: f64,
    tf: f64,
    n_points: usize,
}

impl TryFrom<RawTimeGrid> for TimeGrid {
    type Error = GramianError;

    fn try_from(raw: RawTimeGrid) -> GramianResult<Self> {
        Self::new(raw.t0, raw.tf, raw.n_points)
    }
}

impl TimeGrid {
    pub fn new(t0: f64, tf: f64, n_points: usize) -> GramianResult<Self> {
        if n_points < 2 {
            return Err(GramianError::InvalidTimeGrid(format!(
                "need at least 2 points, got {n_points}"
            )));
        }
        if !(t0.is_finite() && tf.is_finite() && tf > t0) {
            return Err(GramianError::InvalidTimeGrid(format!(
                "need finite t0 < tf, got [{t0}, {tf}]"
            )));
        }
        Ok(Self { t0, tf, n_points })
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    pub fn tf(&self) -> f64 {
        self.tf
    }

    pub fn n_points(&self) -> usize {
        self.n_points
    }

    pub fn dt(&self) -> f64 {
        (self.tf - self.t0) / (self.n_points - 1) as f64
    }

    pub fn times(&self) -> Vec<f64> {
        let dt = self.dt();
        (0..self.n_points)
            .map(|i| if i + 1 == self.n_points { self.tf } else { self.t0 + i as f64 * dt })
            .collect()
    }
}

/// One stored instant of a trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajectorySample {
    pub time: f64,
    pub pose: Pose,
    pub state: RigidBodyState,
}

/// A read-only sequence of samples produced by `simulate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    grid: TimeGrid,
    samples: Vec<TrajectorySample>,
}

impl Trajectory {
    pub fn grid(&self) -> &TimeGrid {
        &self.grid
    }

    pub fn samples(&self) -> &[TrajectorySample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn poses(&self) -> impl Iterator<Item = &Pose> + '_ {
        self.samples.iter().map(|s| &s.pose)
    }

    pub fn states(&self) -> Vec<RigidBodyState> {
        self.samples.iter().map(|s| s.state).collect()
    }
}

/// Initial pose and velocities of the tumbling body.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialCondition {
    pub pose: Pose,
    pub state: RigidBodyState,
}

/// Steps the velocity dynamics across `grid` with `integrator` (through
/// [`Dynamics::propagate`]), then the pose kinematics with forward Euler, producing the
/// nominal trajectory.
pub fn simulate(
    dynamics: &dyn Dynamics,
    integrator: &dyn Integrator<f64>,
    initial: &InitialCondition,
    grid: &TimeGrid,
) -> GramianResult<Trajectory> {
    let layout = dynamics.get_state_layout();
    if layout != rigid_body_velocity_layout() {
        return Err(GramianError::StateLayoutMismatch {
            expected: RigidBodyState::DIM,
            found: layout.len(),
        });
    }

    let times = grid.times();
    let mut states = Vec::with_capacity(times.len());
    let mut x = initial.state.to_vector();
    states.push(initial.state);
    for window in times.windows(2) {
        x = dynamics.propagate(&x, window[0], window[1] - window[0], integrator);
        states.push(RigidBodyState::from_vector(&x));
    }
    let poses = integrate_kinematics(&initial.pose, &states, grid.dt());
    debug!(
        n_points = grid.n_points,
        dt = grid.dt(),
        "integrated rigid-body trajectory"
    );

    let samples = times
        .into_iter()
        .zip(poses)
        .zip(states)
        .map(|((time, pose), state)| TrajectorySample { time, pose, state })
        .collect();
    Ok(Trajectory {
        grid: *grid,
        samples,
    })
}

/// The 12 perturbed trajectories that share the nominal velocity history, in perturbation
/// order. Valid because the dynamics have no feedback from pose to velocity.
#[derive(Debug, Clone, PartialEq)]
pub struct PerturbedTrajectories {
    eps: f64,
    poses: Vec<Vec<Pose>>,
}

impl PerturbedTrajectories {
    /// Re-integrates the kinematics of `nominal` from each pose of the initial perturbation set.
    pub fn from_nominal(nominal: &Trajectory, eps: f64) -> GramianResult<Self> {
        let first = nominal
            .samples()
            .first()
            .ok_or_else(|| GramianError::InvalidTimeGrid("empty trajectory".to_string()))?;
        let initial_set = perturb(&first.pose, eps)?;
        let states = nominal.states();
        let dt = nominal.grid().dt();
        let poses = initial_set
            .poses()
            .iter()
            .map(|p| integrate_kinematics(p, &states, dt))
            .collect();
        Ok(Self { eps, poses })
    }

    /// Builds the set from externally integrated trajectories, one per perturbation.
    pub fn from_poses(eps: f64, poses: Vec<Vec<Pose>>) -> GramianResult<Self> {
        if !(eps.is_finite() && eps > 0.0) {
            return Err(GramianError::InvalidEpsilon { eps });
        }
        if poses.len() != PERTURBATION_COUNT {
            return Err(GramianError::InvalidSampling(format!(
                "expected {PERTURBATION_COUNT} perturbed trajectories, got {}",
                poses.len()
            )));
        }
        Ok(Self { eps, poses })
    }

    pub fn eps(&self) -> f64 {
        self.eps
    }

    /// Trajectory `k` in perturbation order.
    pub fn trajectory(&self, k: usize) -> Option<&[Pose]> {
        self.poses.get(k).map(Vec::as_slice)
    }

    /// Checks every perturbed trajectory has as many samples as the nominal one.
    pub fn check_aligned(&self, nominal: &Trajectory) -> GramianResult<()> {
        for (index, traj) in self.poses.iter().enumerate() {
            if traj.len() != nominal.len() {
                return Err(GramianError::TrajectoryLengthMismatch {
                    nominal: nominal.len(),
                    index,
                    found: traj.len(),
                });
            }
        }
        Ok(())
    }

    /// The time-aligned perturbation set around nominal sample `i`.
    pub fn set_at(&self, nominal: &Trajectory, i: usize) -> GramianResult<PerturbationSet> {
        let sample = nominal.samples().get(i).ok_or_else(|| {
            GramianError::InvalidSampling(format!(
                "frame index {i} outside trajectory of {} samples",
                nominal.len()
            ))
        })?;
        let mut poses = [Pose::identity(); PERTURBATION_COUNT];
        for (k, slot) in poses.iter_mut().enumerate() {
            *slot = *self.poses[k].get(i).ok_or(GramianError::TrajectoryLengthMismatch {
                nominal: nominal.len(),
                index: k,
                found: self.poses[k].len(),
            })?;
        }
        Ok(PerturbationSet::from_poses(sample.pose, self.eps, poses))
    }
}

/// A uniformly strided subset of trajectory samples (rendered frames).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSampling {
    indices: Vec<usize>,
    frame_dt: f64,
}

impl FrameSampling {
    /// `n_frames` indices `0, s, 2s, ...` with stride `s = floor(n_points / n_frames)`.
    pub fn uniform(grid: &TimeGrid, n_frames: usize) -> GramianResult<Self> {
        if n_frames == 0 {
            return Err(GramianError::InvalidSampling("n_frames must be > 0".to_string()));
        }
        let stride = grid.n_points / n_frames;
        if stride == 0 {
            return Err(GramianError::InvalidSampling(format!(
                "{n_frames} frames requested from only {} points",
                grid.n_points
            )));
        }
        Ok(Self {
            indices: (0..n_frames).map(|k| k * stride).collect(),
            frame_dt: stride as f64 * grid.dt(),
        })
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Time between consecutive frames.
    pub fn frame_dt(&self) -> f64 {
        self.frame_dt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::{Dof, FrameId, StateVariable};
    use crate::models::dynamics::{NewtonEulerModel, RigidBodyParams};
    use crate::utils::integrators::RK4;
    use approx::assert_abs_diff_eq;
    use nalgebra::UnitQuaternion;

    fn model() -> NewtonEulerModel {
        NewtonEulerModel::new(RigidBodyParams::default()).unwrap()
    }

    #[test]
    fn time_grid_validation_and_spacing() {
        assert!(TimeGrid::new(0.0, 1.0, 1).is_err());
        assert!(TimeGrid::new(1.0, 1.0, 10).is_err());
        let grid = TimeGrid::new(0.0, 2.0, 3001).unwrap();
        assert_abs_diff_eq!(grid.dt(), 2.0 / 3000.0);
        let times = grid.times();
        assert_eq!(times.len(), 3001);
        assert_eq!(times[3000], 2.0);
    }

    #[test]
    fn raw_time_grid_goes_through_validation() {
        let grid = TimeGrid::try_from(RawTimeGrid {
            t0: 0.0,
            tf: 1.0,
            n_points: 11,
        })
        .unwrap();
        assert_eq!(grid.n_points(), 11);
        assert_abs_diff_eq!(grid.dt(), 0.1, epsilon = 1e-15);

        let empty = TimeGrid::try_from(RawTimeGrid {
            t0: 0.0,
            tf: 1.0,
            n_points: 0,
        });
        assert!(empty.is_err());
    }

    /// A model whose state is not the rigid-body velocity layout.
    #[derive(Debug)]
    struct Scalar;

    impl Dynamics for Scalar {
        fn get_state_layout(&self) -> Vec<StateVariable> {
            vec![StateVariable::Vx(FrameId::World)]
        }

        fn get_derivatives(&self, x: &DVector<f64>, _t: f64) -> DVector<f64> {
            -x
        }
    }

    #[test]
    fn foreign_state_layout_is_rejected() {
        let initial = InitialCondition {
            pose: Pose::identity(),
            state: RigidBodyState::default(),
        };
        let grid = TimeGrid::new(0.0, 1.0, 11).unwrap();
        let err = simulate(&Scalar, &RK4, &initial, &grid).unwrap_err();
        assert!(matches!(
            err,
            GramianError::StateLayoutMismatch {
                expected: 6,
                found: 1
            }
        ));
    }

    #[test]
    fn zero_spin_free_fall_keeps_orientation_and_is_parabolic() {
        let q0 = UnitQuaternion::from_euler_angles(0.1, 0.3, 0.1);
        let initial = InitialCondition {
            pose: Pose::new(Vector3::new(-1.5, 8.0, -1.5), q0),
            state: RigidBodyState {
                velocity: Vector3::new(3.0, 5.0, 9.0),
                angular_velocity: Vector3::zeros(),
            },
        };
        let grid = TimeGrid::new(0.0, 1.0, 1001).unwrap();
        let traj = simulate(&model(), &RK4, &initial, &grid).unwrap();
        assert_eq!(traj.len(), 1001);
        let dt = grid.dt();
        for (i, s) in traj.samples().iter().enumerate() {
            assert_abs_diff_eq!(s.pose.orientation.coords, q0.coords, epsilon = 1e-12);
            // forward Euler of v(t) = v0 - g t sums to p0 + v0 t - g dt^2 i(i-1)/2
            let t = i as f64 * dt;
            let fi = i as f64;
            let z = -1.5 + 9.0 * t - 9.8 * dt * dt * fi * (fi - 1.0) / 2.0;
            assert_abs_diff_eq!(s.pose.position.z, z, epsilon = 1e-9);
            assert_abs_diff_eq!(s.pose.position.x, -1.5 + 3.0 * t, epsilon = 1e-9);
            assert_abs_diff_eq!(s.state.velocity.z, 9.0 - 9.8 * s.time, epsilon = 1e-9);
        }
        // and converges to the continuous parabola
        let last = traj.samples().last().unwrap();
        assert_abs_diff_eq!(last.pose.position.z, -1.5 + 9.0 - 0.5 * 9.8, epsilon = 1e-2);
    }

    #[test]
    fn tumbling_trajectory_keeps_unit_quaternions() {
        let initial = InitialCondition {
            pose: Pose::identity(),
            state: RigidBodyState {
                velocity: Vector3::zeros(),
                angular_velocity: Vector3::new(3.0, 2.0, 1.5),
            },
        };
        let grid = TimeGrid::new(0.0, 2.0, 3001).unwrap();
        let traj = simulate(&model(), &RK4, &initial, &grid).unwrap();
        for pose in traj.poses() {
            assert_abs_diff_eq!(pose.orientation.quaternion().norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn perturbed_trajectories_keep_translation_offsets() {
        let initial = InitialCondition {
            pose: Pose::identity(),
            state: RigidBodyState {
                velocity: Vector3::new(1.0, 2.0, 3.0),
                angular_velocity: Vector3::new(0.5, 0.0, 0.0),
            },
        };
        let grid = TimeGrid::new(0.0, 1.0, 101).unwrap();
        let traj = simulate(&model(), &RK4, &initial, &grid).unwrap();
        let pert = PerturbedTrajectories::from_nominal(&traj, 0.01).unwrap();
        pert.check_aligned(&traj).unwrap();

        let set = pert.set_at(&traj, 50).unwrap();
        let (minus, plus) = set.pair(Dof::Y);
        let nominal = traj.samples()[50].pose;
        assert_abs_diff_eq!(plus.position - nominal.position, Vector3::new(0.0, 0.01, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(nominal.position - minus.position, Vector3::new(0.0, 0.01, 0.0), epsilon = 1e-12);
        assert!(pert.set_at(&traj, 101).is_err());
    }

    #[test]
    fn frame_sampling_strides_the_grid() {
        let grid = TimeGrid::new(0.0, 2.0, 3001).unwrap();
        let sampling = FrameSampling::uniform(&grid, 60).unwrap();
        assert_eq!(sampling.indices().len(), 60);
        assert_eq!(sampling.indices()[1], 50);
        assert_eq!(*sampling.indices().last().unwrap(), 2950);
        assert_abs_diff_eq!(sampling.frame_dt(), 50.0 * 2.0 / 3000.0, epsilon = 1e-15);
        assert!(FrameSampling::uniform(&grid, 0).is_err());
        assert!(FrameSampling::uniform(&grid, 4000).is_err());
    }
}
