// gramian_sim/src/config.rs

//! Scenario configuration.
//!
//! Values come from, in increasing priority: the built-in defaults, a scenario TOML file,
//! and `GRAMIAN_`-prefixed environment variables where `__` separates the section from
//! the key (`GRAMIAN_GRAMIAN__EPS=1e-3`, `GRAMIAN_NOISE__SEED=7`).

use std::f64::consts::FRAC_PI_2;
use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use gramian_core::models::dynamics::RigidBodyParams;
use gramian_core::types::Pose;
use gramian_core::utils::rotations::{euler_sxyz, matrix_to_quaternion};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

pub const ENV_PREFIX: &str = "GRAMIAN_";

// =========================================================================
// == Top-Level Configuration ==
// =========================================================================

/// The root of the data parsed from a scenario file.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub gramian: GramianSection,
    pub camera: CameraSection,
    pub object: ObjectSection,
    pub noise: NoiseSection,
    pub viewpoints: ViewpointsSection,
    pub trajectories: TrajectoriesSection,
    pub dynamic: DynamicSection,
    pub epsilon_sweep: EpsilonSweepSection,
}

impl SimConfig {
    /// Loads defaults, then `path` (which must exist when given), then the environment.
    pub fn load(path: Option<&Path>) -> SimResult<Self> {
        Self::from_figment(Self::figment(path, ENV_PREFIX)?)
    }

    pub fn figment(path: Option<&Path>, env_prefix: &str) -> SimResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(SimConfig::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(SimError::ConfigNotFound(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }
        Ok(figment.merge(Env::prefixed(env_prefix).split("__")))
    }

    pub fn from_figment(figment: Figment) -> SimResult<Self> {
        let config: SimConfig = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values serde cannot.
    pub fn validate(&self) -> SimResult<()> {
        let invalid = |msg: String| Err(SimError::InvalidConfig(msg));
        if !(self.gramian.eps.is_finite() && self.gramian.eps > 0.0) {
            return invalid(format!("gramian.eps must be > 0, got {}", self.gramian.eps));
        }
        let c = &self.camera;
        if c.width == 0 || c.height == 0 {
            return invalid(format!("camera resolution must be non-zero, got {}x{}", c.width, c.height));
        }
        if !(c.lens > 0.0 && c.sensor_width > 0.0 && c.sensor_height > 0.0) {
            return invalid("camera lens and sensor sizes must be > 0".to_string());
        }
        if self.object.edge_length <= 0.0 || self.object.samples_per_edge == 0 {
            return invalid("object.edge_length and object.samples_per_edge must be > 0".to_string());
        }
        if self.noise.std_dev.is_nan() || self.noise.std_dev < 0.0 {
            return invalid(format!("noise.std_dev must be >= 0, got {}", self.noise.std_dev));
        }
        if self.dynamic.n_frames == 0 {
            return invalid("dynamic.n_frames must be > 0".to_string());
        }
        if self.epsilon_sweep.count == 0 {
            return invalid("epsilon_sweep.count must be > 0".to_string());
        }
        Ok(())
    }
}

// =========================================================================
// == Configuration Sub-Structs ==
// =========================================================================

fn pose_from(position: [f64; 3], euler: [f64; 3]) -> Pose {
    let rotation = euler_sxyz(euler[0], euler[1], euler[2]);
    Pose::new(Vector3::from(position), matrix_to_quaternion(&rotation, None))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GramianSection {
    /// Perturbation magnitude (metres and radians).
    pub eps: f64,
}

impl Default for GramianSection {
    fn default() -> Self {
        Self { eps: 1e-2 }
    }
}

/// The fixed camera and its sensor. Angles are static-axes x-y-z Euler angles in radians.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraSection {
    pub position: [f64; 3],
    pub euler: [f64; 3],
    pub width: usize,
    pub height: usize,
    /// Focal length in millimetres.
    pub lens: f64,
    /// Sensor size in millimetres.
    pub sensor_width: f64,
    pub sensor_height: f64,
    /// Render RGBA with a transparent background instead of compositing onto the world.
    pub alpha: bool,
    /// RGB the object is composited onto before differencing (RGBA renders only).
    pub background: Option<[f64; 3]>,
    /// RGB of the empty world behind the object.
    pub world_color: [f64; 3],
}

impl CameraSection {
    /// Default: at the origin, looking along world +y.
    pub fn pose(&self) -> Pose {
        pose_from(self.position, self.euler)
    }
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            euler: [FRAC_PI_2, 0.0, 0.0],
            width: 64,
            height: 48,
            lens: 9.0,
            sensor_width: 6.2,
            sensor_height: 4.6,
            alpha: false,
            background: None,
            world_color: [0.05, 0.05, 0.05],
        }
    }
}

/// The rendered object: a cube with one colour per face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ObjectSection {
    pub position: [f64; 3],
    pub euler: [f64; 3],
    pub edge_length: f64,
    /// Splat samples along each edge of each face.
    pub samples_per_edge: usize,
}

impl ObjectSection {
    pub fn pose(&self) -> Pose {
        pose_from(self.position, self.euler)
    }
}

impl Default for ObjectSection {
    fn default() -> Self {
        Self {
            position: [0.0, 5.0, -0.5],
            euler: [0.0; 3],
            edge_length: 1.0,
            samples_per_edge: 8,
        }
    }
}

/// Additive Gaussian pixel noise of the synthetic renderer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseSection {
    pub std_dev: f64,
    /// Seed of the noise generator; entropy-seeded when absent.
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewpointsSection {
    pub radius: f64,
    pub n_azimuth: usize,
    /// Defaults to `n_azimuth / 2`.
    pub n_elevation: Option<usize>,
}

impl Default for ViewpointsSection {
    fn default() -> Self {
        Self {
            radius: 2.0,
            n_azimuth: 20,
            n_elevation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrajectoriesSection {
    pub radius: f64,
    pub n_points: usize,
    pub n_angle_x: usize,
    pub n_angle_z: usize,
    pub center: [f64; 3],
}

impl Default for TrajectoriesSection {
    fn default() -> Self {
        Self {
            radius: 5.0,
            n_points: 10,
            n_angle_x: 10,
            n_angle_z: 10,
            center: [0.0; 3],
        }
    }
}

/// Initial conditions and sampling of the tumbling-cube scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DynamicSection {
    pub position: [f64; 3],
    pub euler: [f64; 3],
    /// Inertial-frame velocity.
    pub velocity: [f64; 3],
    /// Body-frame angular velocity.
    pub angular_velocity: [f64; 3],
    pub t0: f64,
    pub tf: f64,
    pub n_points: usize,
    pub n_frames: usize,
    pub body: RigidBodyParams,
}

impl DynamicSection {
    pub fn initial_pose(&self) -> Pose {
        pose_from(self.position, self.euler)
    }
}

impl Default for DynamicSection {
    fn default() -> Self {
        Self {
            position: [-1.5, 8.0, -1.5],
            euler: [0.1, 0.3, 0.1],
            velocity: [3.0, 5.0, 9.0],
            angular_velocity: [3.0, 2.0, 1.5],
            t0: 0.0,
            tf: 2.0,
            n_points: 3001,
            n_frames: 60,
            body: RigidBodyParams::default(),
        }
    }
}

/// `count` perturbation sizes from `10^min_exponent` to `10^max_exponent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EpsilonSweepSection {
    pub min_exponent: f64,
    pub max_exponent: f64,
    pub count: usize,
}

impl Default for EpsilonSweepSection {
    fn default() -> Self {
        Self {
            min_exponent: -7.0,
            max_exponent: 1.0,
            count: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn from_toml(text: &str) -> SimResult<SimConfig> {
        SimConfig::from_figment(
            Figment::from(Serialized::defaults(SimConfig::default())).merge(Toml::string(text)),
        )
    }

    #[test]
    fn defaults_match_reference_scenarios() {
        let config = SimConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dynamic.n_points, 3001);
        assert_eq!(config.dynamic.n_frames, 60);
        assert_eq!(config.epsilon_sweep.count, 30);
        // default camera looks along +y
        let cam = config.camera.pose();
        let view = cam.orientation * -Vector3::z();
        assert_abs_diff_eq!(view, Vector3::y(), epsilon = 1e-12);
    }

    #[test]
    fn partial_files_keep_other_defaults() {
        let config = from_toml(
            r#"
            [gramian]
            eps = 0.001

            [camera]
            width = 32
            background = [0.2, 0.4, 0.6]

            [dynamic.body]
            mass = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.gramian.eps, 0.001);
        assert_eq!(config.camera.width, 32);
        assert_eq!(config.camera.height, 48);
        assert_eq!(config.camera.background, Some([0.2, 0.4, 0.6]));
        assert_eq!(config.dynamic.body.mass, 2.0);
        assert_eq!(config.dynamic.body.edge_length, 1.0);
        assert_eq!(config.viewpoints, ViewpointsSection::default());
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            from_toml("[camera]\nzoom = 2.0\n"),
            Err(SimError::Config(_))
        ));
        assert!(matches!(
            from_toml("[gramian]\neps = -1.0\n"),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let prefix = "GRAMIAN_CONFIG_TEST_";
        std::env::set_var("GRAMIAN_CONFIG_TEST_NOISE__SEED", "42");
        let config = SimConfig::from_figment(SimConfig::figment(None, prefix).unwrap()).unwrap();
        std::env::remove_var("GRAMIAN_CONFIG_TEST_NOISE__SEED");
        assert_eq!(config.noise.seed, Some(42));
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = SimConfig::load(Some(Path::new("/nonexistent/scenario.toml"))).unwrap_err();
        assert!(matches!(err, SimError::ConfigNotFound(_)));
    }

    #[test]
    fn resolved_config_round_trips_through_toml() {
        let config = SimConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(from_toml(&text).unwrap(), config);
    }

    #[test]
    fn shipped_scenario_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/scenarios/default.toml");
        let figment = SimConfig::figment(Some(&path), "GRAMIAN_SHIPPED_TEST_").unwrap();
        assert_eq!(SimConfig::from_figment(figment).unwrap(), SimConfig::default());
    }
}
