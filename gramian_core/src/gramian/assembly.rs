// gramian_core/src/gramian/assembly.rs

use nalgebra::DMatrix;
use tracing::debug;

use crate::error::{GramianError, GramianResult};
use crate::frames::Dof;
use crate::gramian::{Gramian, GramianBatch, N_DOF};
use crate::models::trajectory::{FrameSampling, PerturbedTrajectories, Trajectory};
use crate::observation::{composite, ObservationAdapter, ObservationRequest, ObservationSetup};
use crate::perturbation::{perturb, PerturbationSet};
use crate::types::{Image, Pose};

/// Gramians of every sample of a trajectory or path, and their weighted sum.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegratedGramian {
    /// One Gramian per sample, in sample order.
    pub per_sample: GramianBatch,
    /// `weight * sum(per_sample)`.
    pub integrated: Gramian,
    /// The factor applied to the sum (the frame spacing for trajectories).
    pub weight: f64,
}

impl IntegratedGramian {
    fn from_samples(per_sample: GramianBatch, weight: f64) -> Self {
        let integrated = per_sample.sum() * weight;
        Self {
            per_sample,
            integrated,
            weight,
        }
    }
}

/// Empirical observability Gramian of a single nominal object pose.
///
/// Renders the 12 standard perturbations of `nominal` (12 adapter calls, in perturbation
/// order) and returns `(1 / (4 eps^2)) M^T M`, where column `j` of `M` is the flattened
/// difference `y(+eps_j) - y(-eps_j)`.
pub fn assemble_gramian<A>(
    nominal: &Pose,
    eps: f64,
    setup: &ObservationSetup,
    adapter: &mut A,
) -> GramianResult<Gramian>
where
    A: ObservationAdapter + ?Sized,
{
    let set = perturb(nominal, eps)?;
    gramian_from_perturbations(&set, 0, setup, adapter)
}

/// Gramian from an existing perturbation set, e.g. one taken from time-aligned perturbed
/// trajectories. `sample` selects per-sample world colour and background, and is reported
/// in errors.
pub fn gramian_from_perturbations<A>(
    set: &PerturbationSet,
    sample: usize,
    setup: &ObservationSetup,
    adapter: &mut A,
) -> GramianResult<Gramian>
where
    A: ObservationAdapter + ?Sized,
{
    gramian_with_camera(set, &setup.camera, sample, setup, adapter)
}

/// Integrated Gramian of a tumbling object seen from a fixed camera.
///
/// One Gramian per sampled frame, built from the time-aligned perturbed poses rather than
/// from fresh perturbations of the nominal pose, summed and multiplied by the frame
/// spacing. This is a rectangle-rule sum over the rendered frames, not a quadrature over
/// the integration grid.
pub fn assemble_gramian_integrated<A>(
    trajectory: &Trajectory,
    perturbed: &PerturbedTrajectories,
    sampling: &FrameSampling,
    setup: &ObservationSetup,
    adapter: &mut A,
) -> GramianResult<IntegratedGramian>
where
    A: ObservationAdapter + ?Sized,
{
    perturbed.check_aligned(trajectory)?;
    let mut per_sample = GramianBatch::default();
    for (sample, &index) in sampling.indices().iter().enumerate() {
        let set = perturbed.set_at(trajectory, index)?;
        per_sample.push(gramian_from_perturbations(&set, sample, setup, adapter)?);
        debug!(sample, index, "frame gramian assembled");
    }
    Ok(IntegratedGramian::from_samples(per_sample, sampling.frame_dt()))
}

/// Integrated Gramian of a static object seen from each camera pose along a path.
/// Sample `i` uses `cameras[i]`; the per-sample Gramians are summed and scaled by `weight`.
pub fn accumulate_along_path<A>(
    cameras: &[Pose],
    object: &Pose,
    eps: f64,
    setup: &ObservationSetup,
    adapter: &mut A,
    weight: f64,
) -> GramianResult<IntegratedGramian>
where
    A: ObservationAdapter + ?Sized,
{
    let set = perturb(object, eps)?;
    let mut per_sample = GramianBatch::default();
    for (sample, camera) in cameras.iter().enumerate() {
        per_sample.push(gramian_with_camera(&set, camera, sample, setup, adapter)?);
    }
    Ok(IntegratedGramian::from_samples(per_sample, weight))
}

fn gramian_with_camera<A>(
    set: &PerturbationSet,
    camera: &Pose,
    sample: usize,
    setup: &ObservationSetup,
    adapter: &mut A,
) -> GramianResult<Gramian>
where
    A: ObservationAdapter + ?Sized,
{
    let eps = set.eps();
    if !(eps.is_finite() && eps > 0.0) {
        return Err(GramianError::InvalidEpsilon { eps });
    }
    let world_color = setup.world_color.get(sample, "world colour")?.copied();
    let background = setup.background.get(sample, "background")?;

    let mut m: Option<DMatrix<f64>> = None;
    for dof in Dof::ALL {
        let (minus, plus) = set.pair(dof);
        let mut observe = |object: &Pose| -> GramianResult<Image> {
            let request = ObservationRequest {
                camera,
                object,
                world_color,
            };
            adapter
                .observe(&request)
                .map_err(|source| GramianError::Adapter {
                    sample,
                    dof,
                    source,
                })
        };
        let y_minus = observe(minus)?;
        let y_plus = observe(plus)?;
        if !(is_finite(&y_minus) && is_finite(&y_plus)) {
            return Err(GramianError::NonFiniteObservation { sample, dof });
        }

        if y_minus.shape() != y_plus.shape() {
            return Err(GramianError::ShapeMismatch {
                sample,
                dof,
                minus: y_minus.shape(),
                plus: y_plus.shape(),
            });
        }
        let y_minus = prepare(y_minus, background, sample, dof)?;
        let y_plus = prepare(y_plus, background, sample, dof)?;

        let n_el = y_plus.data().len();
        let m = m.get_or_insert_with(|| DMatrix::zeros(n_el, N_DOF));
        if m.nrows() != n_el {
            return Err(GramianError::ObservationSizeChanged {
                sample,
                dof,
                expected: m.nrows(),
                found: n_el,
            });
        }
        // raw differences: clamping here would bias the Gramian
        for ((dst, p), n) in m
            .column_mut(dof.index())
            .iter_mut()
            .zip(y_plus.data())
            .zip(y_minus.data())
        {
            *dst = p - n;
        }
    }

    let m = m.unwrap_or_else(|| DMatrix::zeros(0, N_DOF));
    let mtm = m.tr_mul(&m) * (1.0 / (4.0 * eps * eps));
    let gramian = Gramian::from_fn(|i, j| 0.5 * (mtm[(i, j)] + mtm[(j, i)]));
    debug!(sample, trace = gramian.trace(), "gramian assembled");
    Ok(gramian)
}

fn is_finite(image: &Image) -> bool {
    image.data().iter().all(|v| v.is_finite())
}

/// Composites onto the sample's background when one is configured, otherwise drops alpha.
fn prepare(
    observation: Image,
    background: Option<&Image>,
    sample: usize,
    dof: Dof,
) -> GramianResult<Image> {
    let channels = observation.channels();
    if channels != 3 && channels != 4 {
        return Err(GramianError::UnsupportedChannels {
            sample,
            dof,
            channels,
        });
    }
    match background {
        Some(bg) => {
            let same_size = (bg.height(), bg.width()) == (observation.height(), observation.width());
            if !same_size || !matches!(bg.channels(), 1 | 3 | 4) {
                return Err(GramianError::BackgroundShapeMismatch {
                    sample,
                    dof,
                    background: bg.shape(),
                    observation: observation.shape(),
                });
            }
            Ok(composite(&observation, bg))
        }
        None if observation.has_alpha() => Ok(observation.to_rgb()),
        None => Ok(observation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdapterError;
    use crate::models::dynamics::{NewtonEulerModel, RigidBodyParams};
    use crate::models::trajectory::{simulate, InitialCondition, RigidBodyState, TimeGrid};
    use crate::observation::{adapter_fn, PerSample};
    use crate::utils::integrators::RK4;
    use approx::assert_abs_diff_eq;
    use nalgebra::{SymmetricEigen, Vector3};

    fn setup() -> ObservationSetup {
        ObservationSetup::new(Pose::identity())
    }

    /// Red channel = 10 x, everything else constant.
    fn red_is_ten_x(req: &ObservationRequest<'_>) -> Result<Image, AdapterError> {
        let x = req.object.position.x;
        Ok(Image::from_fn(4, 5, 3, |_, _, px| {
            px[0] = 10.0 * x;
            px[1] = 0.0;
            px[2] = 0.0;
        }))
    }

    /// A smooth, nonlinear image depending on every degree of freedom.
    fn smooth_scene(req: &ObservationRequest<'_>) -> Result<Image, AdapterError> {
        let p = req.object.position;
        let q = req.object.orientation.scaled_axis();
        Ok(Image::from_fn(6, 6, 4, |r, c, px| {
            let (u, v) = (r as f64 / 5.0, c as f64 / 5.0);
            px[0] = (u * p.x + v * q.z).sin() + 0.3 * p.y * p.y;
            px[1] = (v * p.z - u * q.x).cos() * 0.5;
            px[2] = 0.2 * q.y * (1.0 + u) + 0.1 * p.x * v;
            px[3] = 1.0;
        }))
    }

    #[test]
    fn linear_red_channel_gives_single_entry() {
        let mut adapter = adapter_fn(red_is_ten_x);
        let g = assemble_gramian(&Pose::identity(), 0.01, &setup(), &mut adapter).unwrap();
        // dy/dx = 10 at each of 20 pixels: 20 * 10^2
        let mut expected = Gramian::zeros();
        expected[(0, 0)] = 100.0 * 20.0;
        assert_abs_diff_eq!(g, expected, epsilon = 1e-9);
    }

    #[test]
    fn single_pixel_red_channel_is_one_hundred() {
        let mut adapter = adapter_fn(|req| {
            let x = req.object.position.x;
            Image::new(1, 1, 3, vec![10.0 * x, 0.0, 0.0]).map_err(|e| e.into())
        });
        let g = assemble_gramian(&Pose::identity(), 0.01, &setup(), &mut adapter).unwrap();
        assert_abs_diff_eq!(g[(0, 0)], 100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(g.sum(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn gramian_is_symmetric_and_psd() {
        let mut adapter = adapter_fn(smooth_scene);
        let nominal = Pose::new(
            Vector3::new(0.3, -0.2, 0.5),
            nalgebra::UnitQuaternion::from_euler_angles(0.2, -0.1, 0.4),
        );
        let g = assemble_gramian(&nominal, 1e-3, &setup(), &mut adapter).unwrap();
        assert_eq!(g, g.transpose());
        let eig = SymmetricEigen::new(g);
        let tol = 1e-9 * eig.eigenvalues.amax();
        assert!(eig.eigenvalues.iter().all(|&l| l >= -tol), "{}", eig.eigenvalues);
    }

    #[test]
    fn halving_eps_leaves_linear_gramian_unchanged() {
        // linear in every coordinate
        let linear = |req: &ObservationRequest<'_>| -> Result<Image, AdapterError> {
            let p = req.object.position;
            let a = req.object.orientation.scaled_axis();
            Ok(Image::new(
                1,
                2,
                3,
                vec![p.x + 2.0 * a.x, p.y - a.y, 3.0 * p.z, a.z, p.x - p.y, 0.5 * a.x],
            )?)
        };
        let mut adapter = adapter_fn(linear);
        let g1 = assemble_gramian(&Pose::identity(), 1e-2, &setup(), &mut adapter).unwrap();
        let g2 = assemble_gramian(&Pose::identity(), 5e-3, &setup(), &mut adapter).unwrap();
        assert_abs_diff_eq!(g1, g2, epsilon = 1e-6 * g1.amax());
        assert!(g1[(0, 0)] > 0.0);
    }

    #[test]
    fn adapter_is_called_twelve_times_in_order() {
        let nominal = Pose::identity();
        let expected = perturb(&nominal, 0.1).unwrap();
        let mut seen = Vec::new();
        let mut adapter = adapter_fn(|req| {
            seen.push(*req.object);
            Ok(Image::filled(1, 1, 3, 0.0))
        });
        assemble_gramian(&nominal, 0.1, &setup(), &mut adapter).unwrap();
        drop(adapter);
        assert_eq!(seen.len(), 12);
        assert_eq!(seen.as_slice(), expected.poses().as_slice());
    }

    #[test]
    fn adapter_failure_carries_context() {
        let mut calls = 0;
        let mut adapter = adapter_fn(|_req| {
            calls += 1;
            if calls == 5 {
                Err("renderer crashed".into())
            } else {
                Ok(Image::filled(1, 1, 3, 0.0))
            }
        });
        let err = assemble_gramian(&Pose::identity(), 0.1, &setup(), &mut adapter).unwrap_err();
        match err {
            GramianError::Adapter { sample, dof, source } => {
                assert_eq!(sample, 0);
                assert_eq!(dof, Dof::Z);
                assert_eq!(source.to_string(), "renderer crashed");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn mismatched_pair_shapes_are_rejected() {
        let mut adapter = adapter_fn(|req| {
            let w = if req.object.position.y > 0.0 { 3 } else { 2 };
            Ok(Image::filled(1, w, 3, 0.0))
        });
        let err = assemble_gramian(&Pose::identity(), 0.1, &setup(), &mut adapter).unwrap_err();
        assert!(matches!(err, GramianError::ShapeMismatch { dof: Dof::Y, .. }));
    }

    #[test]
    fn invalid_eps_is_rejected_before_rendering() {
        let mut adapter = adapter_fn(|_req| panic!("must not render"));
        let err = assemble_gramian(&Pose::identity(), 0.0, &setup(), &mut adapter).unwrap_err();
        assert!(matches!(err, GramianError::InvalidEpsilon { .. }));
    }

    #[test]
    fn alpha_is_dropped_without_background() {
        // alpha varies with x but must not contribute
        let mut adapter = adapter_fn(|req| {
            let x = req.object.position.x;
            Image::new(1, 1, 4, vec![x, 0.0, 0.0, 0.5 + x]).map_err(|e| e.into())
        });
        let g = assemble_gramian(&Pose::identity(), 0.01, &setup(), &mut adapter).unwrap();
        assert_abs_diff_eq!(g[(0, 0)], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn background_is_composited_before_differencing() {
        // alpha = x + 0.5, fg colour 1, background 0: composited red = x + 0.5
        let mut adapter = adapter_fn(|req| {
            let x = req.object.position.x;
            Image::new(1, 1, 4, vec![1.0, 1.0, 1.0, 0.5 + x]).map_err(|e| e.into())
        });
        let mut s = setup();
        s.background = PerSample::Uniform(Image::filled(1, 1, 3, 0.0));
        let g = assemble_gramian(&Pose::identity(), 0.01, &s, &mut adapter).unwrap();
        // three channels each with derivative 1
        assert_abs_diff_eq!(g[(0, 0)], 3.0, epsilon = 1e-9);

        s.background = PerSample::Uniform(Image::filled(2, 1, 3, 0.0));
        let err = assemble_gramian(&Pose::identity(), 0.01, &s, &mut adapter).unwrap_err();
        assert!(matches!(err, GramianError::BackgroundShapeMismatch { .. }));
    }

    #[test]
    fn channelless_background_is_rejected() {
        let mut adapter = adapter_fn(|_req| Ok(Image::filled(1, 1, 4, 0.5)));
        let mut s = setup();
        s.background = PerSample::Uniform(Image::filled(1, 1, 0, 0.0));
        let err = assemble_gramian(&Pose::identity(), 0.01, &s, &mut adapter).unwrap_err();
        match err {
            GramianError::BackgroundShapeMismatch {
                background,
                observation,
                ..
            } => {
                assert_eq!(background, (1, 1, 0));
                assert_eq!(observation, (1, 1, 4));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_finite_observations_are_rejected() {
        let mut adapter = adapter_fn(|req| {
            let x = req.object.position.x;
            let red = if x > 0.0 { f64::NAN } else { x };
            Image::new(1, 1, 3, vec![red, 0.0, 0.0]).map_err(|e| e.into())
        });
        let err = assemble_gramian(&Pose::identity(), 0.01, &setup(), &mut adapter).unwrap_err();
        assert!(matches!(
            err,
            GramianError::NonFiniteObservation {
                sample: 0,
                dof: Dof::X
            }
        ));

        let mut adapter = adapter_fn(|req| {
            let z = req.object.position.z;
            let green = if z < 0.0 { f64::INFINITY } else { 0.0 };
            Image::new(1, 1, 3, vec![0.0, green, 0.0]).map_err(|e| e.into())
        });
        let err = assemble_gramian(&Pose::identity(), 0.01, &setup(), &mut adapter).unwrap_err();
        assert!(matches!(err, GramianError::NonFiniteObservation { dof: Dof::Z, .. }));
    }

    #[test]
    fn integrated_gramian_sums_frames_times_frame_dt() {
        let model = NewtonEulerModel::new(RigidBodyParams::default()).unwrap();
        let initial = InitialCondition {
            pose: Pose::identity(),
            state: RigidBodyState {
                velocity: Vector3::new(1.0, 0.0, 0.0),
                angular_velocity: Vector3::new(0.0, 0.0, 1.0),
            },
        };
        let grid = TimeGrid::new(0.0, 1.0, 101).unwrap();
        let traj = simulate(&model, &RK4, &initial, &grid).unwrap();
        let perturbed = PerturbedTrajectories::from_nominal(&traj, 0.01).unwrap();
        let sampling = FrameSampling::uniform(&grid, 10).unwrap();

        let mut adapter = adapter_fn(red_is_ten_x);
        let result =
            assemble_gramian_integrated(&traj, &perturbed, &sampling, &setup(), &mut adapter).unwrap();
        assert_eq!(result.per_sample.len(), 10);
        assert_abs_diff_eq!(result.weight, 0.1, epsilon = 1e-12);
        // each frame sees dy/dx = 10 on 20 pixels
        assert_abs_diff_eq!(result.integrated[(0, 0)], 10.0 * 2000.0 * 0.1, epsilon = 1e-6);
    }

    #[test]
    fn per_sample_backgrounds_must_cover_every_frame() {
        let cameras = vec![Pose::identity(); 3];
        let mut s = setup();
        s.background = PerSample::Varying(vec![Image::filled(4, 5, 3, 0.0); 2]);
        let mut adapter = adapter_fn(red_is_ten_x);
        let err = accumulate_along_path(&cameras, &Pose::identity(), 0.01, &s, &mut adapter, 1.0)
            .unwrap_err();
        assert!(matches!(err, GramianError::MissingSampleData { sample: 2, .. }));
    }
}
