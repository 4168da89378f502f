// gramian_sim/src/scenarios.rs

//! The research scenarios behind each `gramian-sim` subcommand.
//!
//! Every scenario renders with a [`SplatRenderer`] built from the configuration, writes its
//! results under the output directory and returns them for further use.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cli::Command;
use crate::persistence::{save_search_result, search_records};
use crate::prelude::*;

/// Runs one subcommand and records the resolved configuration next to its results.
pub fn run(command: Command, config: &SimConfig, output: &Path) -> SimResult<()> {
    info!(command = command.name(), output = %output.display(), "running scenario");
    fs::create_dir_all(output).map_err(|e| SimError::io(output, e))?;
    let config_path = output.join(format!("{}_config.toml", command.name()));
    fs::write(&config_path, toml::to_string_pretty(config)?)
        .map_err(|e| SimError::io(&config_path, e))?;

    match command {
        Command::Example => run_example(config, output).map(|_| ()),
        Command::BestViews => run_best_views(config, output).map(|_| ()),
        Command::Trajectories => run_trajectories(config, output).map(|_| ()),
        Command::Dynamic => run_dynamic(config, output).map(|_| ()),
        Command::EpsilonSweep => run_epsilon_sweep(config, output).map(|_| ()),
    }
}

/// Observation setup for `camera`, with the configured background when rendering RGBA.
pub fn observation_setup(config: &SimConfig, camera: Pose) -> ObservationSetup {
    let mut setup = ObservationSetup::new(camera);
    if let Some(rgb) = config.camera.background {
        let (h, w) = (config.camera.height, config.camera.width);
        setup.background = PerSample::Uniform(Image::from_fn(h, w, 3, |_, _, px| {
            px.copy_from_slice(&rgb);
        }));
    }
    setup
}

/// Prints a Gramian as a LaTeX `bmatrix`, scaled by a power of ten so that its largest
/// entry has `n_digits` digits before the decimal point.
pub fn format_latex(gramian: &Gramian, n_digits: usize) -> String {
    let max = gramian.max();
    let scale_pow = if max.is_finite() && max > 0.0 {
        max.log10().floor() as i32 - (n_digits as i32 - 1)
    } else {
        0
    };
    let scale = 10f64.powi(scale_pow);

    let mut out = String::new();
    let _ = writeln!(out, "10^{{{scale_pow}}} \\times");
    out.push_str("\\begin{bmatrix}\n");
    for i in 0..N_DOF {
        let row: Vec<String> = (0..N_DOF)
            .map(|j| format!("{:.0}", gramian[(i, j)] / scale))
            .collect();
        out.push_str(&row.join(" & "));
        if i < N_DOF - 1 {
            out.push_str(" \\\\");
        }
        out.push('\n');
    }
    out.push_str("\\end{bmatrix}\n");
    out
}

// --- Single pose ---

/// Gramian of the configured object pose seen from the configured camera.
pub fn run_example(config: &SimConfig, output: &Path) -> SimResult<Gramian> {
    let mut renderer = SplatRenderer::from_config(config)?;
    let setup = observation_setup(config, config.camera.pose());
    let gramian = assemble_gramian(&config.object.pose(), config.gramian.eps, &setup, &mut renderer)?;

    let latex = format_latex(&gramian, 3);
    info!("Gramian of the example pose:\n{latex}");
    save_batch(&output.join("example_gramian.json"), &GramianBatch::new(vec![gramian]))?;
    let tex_path = output.join("example_gramian.tex");
    fs::write(&tex_path, latex).map_err(|e| SimError::io(&tex_path, e))?;
    Ok(gramian)
}

/// Perturbation sizes and the Gramian of the example pose at each.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpsilonSweep {
    pub eps: Vec<f64>,
    pub gramians: GramianArray,
}

pub fn run_epsilon_sweep(config: &SimConfig, output: &Path) -> SimResult<EpsilonSweep> {
    let s = &config.epsilon_sweep;
    let eps = logspace(s.min_exponent, s.max_exponent, s.count);
    let mut renderer = SplatRenderer::from_config(config)?;
    let setup = observation_setup(config, config.camera.pose());
    let object = config.object.pose();

    let batch = eps
        .iter()
        .map(|&e| {
            let g = assemble_gramian(&object, e, &setup, &mut renderer)?;
            debug!(eps = e, trace = g.trace(), "epsilon sweep sample");
            Ok(g)
        })
        .collect::<GramianResult<GramianBatch>>()?;

    let sweep = EpsilonSweep {
        eps,
        gramians: batch.to_array(),
    };
    save_json(&output.join("epsilon_sweep.json"), &sweep)?;
    Ok(sweep)
}

// --- Searches ---

/// The searches place the object at the origin with its configured orientation.
fn search_object(config: &SimConfig) -> Pose {
    Pose::new(Vector3::zeros(), config.object.pose().orientation)
}

fn run_search<F>(config: &SimConfig, output: &Path, family: &F, prefix: &str) -> SimResult<SearchOutcome<F::Candidate>>
where
    F: CandidateFamily,
{
    let mut renderer = SplatRenderer::from_config(config)?;
    let setup = observation_setup(config, Pose::identity());
    let outcome = search(family, &search_object(config), config.gramian.eps, &setup, &mut renderer)?;

    for (key, record) in search_records(&outcome) {
        info!("{prefix} {key}: index {:?}, value {:?}", record.index, record.value);
    }
    save_batch(&output.join(format!("{prefix}_gramians.json")), &outcome.batch)?;
    save_json(&output.join(format!("{prefix}_measures.json")), &outcome.measures)?;
    save_search_result(&output.join(format!("{prefix}_result.json")), &outcome)?;
    Ok(outcome)
}

/// Single viewpoints on a sphere around the object.
pub fn run_best_views(config: &SimConfig, output: &Path) -> SimResult<SearchOutcome<ViewpointCandidate>> {
    let v = &config.viewpoints;
    let n_elevation = v.n_elevation.unwrap_or(v.n_azimuth / 2);
    let family = SphereViewpoints::with_elevations(v.radius, v.n_azimuth, n_elevation)?;
    run_search(config, output, &family, "best_views")
}

/// Semicircular camera paths over the object, one integrated Gramian per path.
pub fn run_trajectories(config: &SimConfig, output: &Path) -> SimResult<SearchOutcome<ArcCandidate>> {
    let t = &config.trajectories;
    let family = SemicircleArcs::new(t.radius, t.n_points, t.n_angle_x, t.n_angle_z, Point3::from(t.center))?;
    run_search(config, output, &family, "trajectories")
}

// --- Tumbling object ---

/// A rendered frame of the nominal trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameRecord {
    pub index: usize,
    pub time: f64,
    pub pose: Pose,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DynamicOutcome {
    pub frames: Vec<FrameRecord>,
    pub gramian: IntegratedGramian,
    /// Measures of the per-frame Gramians.
    pub frame_measures: GramianMeasures,
}

/// Integrated Gramian of a cube tumbling past the fixed camera.
pub fn run_dynamic(config: &SimConfig, output: &Path) -> SimResult<DynamicOutcome> {
    let d = &config.dynamic;
    let model = NewtonEulerModel::new(d.body).ok_or_else(|| {
        SimError::InvalidConfig("dynamic.body must have positive mass and edge length".to_string())
    })?;
    let initial = InitialCondition {
        pose: d.initial_pose(),
        state: RigidBodyState {
            velocity: Vector3::from(d.velocity),
            angular_velocity: Vector3::from(d.angular_velocity),
        },
    };
    let grid = TimeGrid::new(d.t0, d.tf, d.n_points)?;
    let trajectory = simulate(&model, &RK4, &initial, &grid)?;
    let perturbed = PerturbedTrajectories::from_nominal(&trajectory, config.gramian.eps)?;
    let sampling = FrameSampling::uniform(&grid, d.n_frames)?;
    info!(
        frames = sampling.indices().len(),
        frame_dt = sampling.frame_dt(),
        "simulated tumbling object"
    );

    let mut renderer = SplatRenderer::from_config(config)?;
    let setup = observation_setup(config, config.camera.pose());
    let gramian = assemble_gramian_integrated(&trajectory, &perturbed, &sampling, &setup, &mut renderer)?;
    let frame_measures = measures(gramian.per_sample.as_slice())?;
    info!("Integrated Gramian:\n{}", format_latex(&gramian.integrated, 3));

    let frames: Vec<FrameRecord> = sampling
        .indices()
        .iter()
        .map(|&index| {
            let sample = &trajectory.samples()[index];
            FrameRecord {
                index,
                time: sample.time,
                pose: sample.pose,
            }
        })
        .collect();

    save_json(&output.join("dynamic_frames.json"), &frames)?;
    save_batch(&output.join("dynamic_frame_gramians.json"), &gramian.per_sample)?;
    save_batch(
        &output.join("dynamic_integrated_gramian.json"),
        &GramianBatch::new(vec![gramian.integrated]),
    )?;
    save_json(&output.join("dynamic_frame_measures.json"), &frame_measures)?;
    Ok(DynamicOutcome {
        frames,
        gramian,
        frame_measures,
    })
}
