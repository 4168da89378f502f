// gramian_sim/src/renderer.rs

//! A synthetic stand-in for the photorealistic renderer.
//!
//! The object is a cube whose faces are covered with coloured splats, projected through a
//! pinhole camera. Splat kernels vanish smoothly at their rim and splats fade out as their
//! face turns away from the camera, so the image changes smoothly with the pose.

use gramian_core::error::AdapterError;
use gramian_core::observation::{ObservationAdapter, ObservationRequest};
use gramian_core::types::{Image, Pose};
use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::SimConfig;

/// Points closer to the image plane than this (in metres) are not drawn.
const NEAR_PLANE: f64 = 1e-3;

/// Face colours in the order +x, -x, +y, -y, +z, -z.
const FACE_COLORS: [[f64; 3]; 6] = [
    [0.85, 0.20, 0.20],
    [0.20, 0.75, 0.30],
    [0.20, 0.35, 0.90],
    [0.90, 0.80, 0.20],
    [0.80, 0.30, 0.80],
    [0.25, 0.80, 0.85],
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid renderer settings: {0}")]
    InvalidSettings(String),
    #[error("invalid noise level: {0}")]
    Noise(#[from] rand_distr::NormalError),
}

/// Pinhole intrinsics in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinholeCamera {
    pub width: usize,
    pub height: usize,
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl PinholeCamera {
    /// Intrinsics from a focal length and sensor size in millimetres.
    pub fn from_lens(width: usize, height: usize, lens: f64, sensor_width: f64, sensor_height: f64) -> Self {
        Self {
            width,
            height,
            fx: lens / sensor_width * width as f64,
            fy: lens / sensor_height * height as f64,
            cx: (width as f64 - 1.0) / 2.0,
            cy: (height as f64 - 1.0) / 2.0,
        }
    }

    /// Pixel coordinates `(u, v)` and depth of a camera-frame point, `None` behind the
    /// near plane. The camera looks along its local -z with +y up.
    pub fn project(&self, p: &Point3<f64>) -> Option<(f64, f64, f64)> {
        let depth = -p.z;
        if depth <= NEAR_PLANE {
            return None;
        }
        let u = self.cx + self.fx * p.x / depth;
        let v = self.cy - self.fy * p.y / depth;
        Some((u, v, depth))
    }
}

#[derive(Debug, Clone, Copy)]
struct Splat {
    position: Point3<f64>,
    normal: Vector3<f64>,
    color: [f64; 3],
}

/// Gaussian pixel noise with a reproducible generator.
#[derive(Debug, Clone)]
pub struct PixelNoise {
    rng: ChaCha8Rng,
    normal: Normal<f64>,
}

impl PixelNoise {
    pub fn new(std_dev: f64, seed: Option<u64>) -> Result<Self, RenderError> {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Ok(Self {
            rng,
            normal: Normal::new(0.0, std_dev)?,
        })
    }

    fn apply(&mut self, values: &mut [f64]) {
        for v in values {
            *v += self.normal.sample(&mut self.rng);
        }
    }
}

/// Renders a face-coloured cube as seen by a pinhole camera.
#[derive(Debug, Clone)]
pub struct SplatRenderer {
    camera: PinholeCamera,
    splats: Vec<Splat>,
    /// Splat radius in metres; its pixel size shrinks with depth.
    splat_radius: f64,
    alpha: bool,
    world_color: [f64; 3],
    noise: Option<PixelNoise>,
    renders: usize,
}

impl SplatRenderer {
    pub fn new(
        camera: PinholeCamera,
        edge_length: f64,
        samples_per_edge: usize,
        alpha: bool,
        world_color: [f64; 3],
    ) -> Result<Self, RenderError> {
        if camera.width == 0 || camera.height == 0 {
            return Err(RenderError::InvalidSettings(format!(
                "image size must be non-zero, got {}x{}",
                camera.width, camera.height
            )));
        }
        if edge_length.is_nan() || edge_length <= 0.0 || samples_per_edge == 0 {
            return Err(RenderError::InvalidSettings(format!(
                "cube needs a positive edge length and samples, got {edge_length} and {samples_per_edge}"
            )));
        }
        Ok(Self {
            camera,
            splats: cube_splats(edge_length, samples_per_edge),
            splat_radius: 0.6 * edge_length / samples_per_edge as f64,
            alpha,
            world_color,
            noise: None,
            renders: 0,
        })
    }

    /// Renderer for a scenario. A configured background implies RGBA output, since the
    /// background is composited onto the transparent renders.
    pub fn from_config(config: &SimConfig) -> Result<Self, RenderError> {
        let c = &config.camera;
        let camera = PinholeCamera::from_lens(c.width, c.height, c.lens, c.sensor_width, c.sensor_height);
        let alpha = c.alpha || c.background.is_some();
        if alpha && !c.alpha {
            debug!("camera.background is set, rendering with alpha");
        }
        let renderer = Self::new(
            camera,
            config.object.edge_length,
            config.object.samples_per_edge,
            alpha,
            c.world_color,
        )?;
        if config.noise.std_dev > 0.0 {
            Ok(renderer.with_noise(PixelNoise::new(config.noise.std_dev, config.noise.seed)?))
        } else {
            Ok(renderer)
        }
    }

    pub fn with_noise(mut self, noise: PixelNoise) -> Self {
        self.noise = Some(noise);
        self
    }

    pub fn camera(&self) -> &PinholeCamera {
        &self.camera
    }

    /// Number of images rendered so far.
    pub fn renders(&self) -> usize {
        self.renders
    }

    /// Renders `object` seen from `camera`. RGBA with a transparent background when alpha
    /// is enabled, otherwise RGB over `world_color`.
    pub fn render(&mut self, camera: &Pose, object: &Pose, world_color: Option<[f64; 3]>) -> Image {
        let (w, h) = (self.camera.width, self.camera.height);
        // per pixel: weighted colour sum, then total weight
        let mut color_sum = vec![[0.0f64; 3]; w * h];
        let mut weight_sum = vec![0.0f64; w * h];

        let object_to_camera = camera.to_isometry().inverse() * object.to_isometry();
        for splat in &self.splats {
            let p = object_to_camera * splat.position;
            let Some((u, v, depth)) = self.camera.project(&p) else {
                continue;
            };
            let normal = object_to_camera * splat.normal;
            let facing = normal.dot(&(-p.coords)) / p.coords.norm();
            if facing <= 0.0 {
                continue;
            }
            // compact kernel: zero weight and slope at the rim
            let reach = (2.5 * self.splat_radius * self.camera.fx / depth).max(1.0);
            let inv_reach2 = 1.0 / (reach * reach);
            let (u0, u1) = pixel_range(u, reach, w);
            let (v0, v1) = pixel_range(v, reach, h);
            for row in v0..v1 {
                let dv = row as f64 - v;
                for col in u0..u1 {
                    let du = col as f64 - u;
                    let q = 1.0 - (du * du + dv * dv) * inv_reach2;
                    if q <= 0.0 {
                        continue;
                    }
                    let weight = facing * q * q * q;
                    let k = row * w + col;
                    for c in 0..3 {
                        color_sum[k][c] += weight * splat.color[c];
                    }
                    weight_sum[k] += weight;
                }
            }
        }

        let world = world_color.unwrap_or(self.world_color);
        let channels = if self.alpha { 4 } else { 3 };
        let mut image = Image::from_fn(h, w, channels, |row, col, px| {
            let k = row * w + col;
            let total = weight_sum[k];
            let coverage = 1.0 - (-total).exp();
            for c in 0..3 {
                let fg = if total > 0.0 { color_sum[k][c] / total } else { 0.0 };
                px[c] = if self.alpha {
                    fg
                } else {
                    coverage * fg + (1.0 - coverage) * world[c]
                };
            }
            if self.alpha {
                px[3] = coverage;
            }
        });

        if let Some(noise) = self.noise.as_mut() {
            noise.apply(image.data_mut());
        }
        let clamped = clamp_unit(image.data_mut());
        if clamped > 0 {
            warn!(clamped, render = self.renders, "pixel values clamped to [0, 1]");
        }
        self.renders += 1;
        image
    }
}

impl ObservationAdapter for SplatRenderer {
    fn observe(&mut self, request: &ObservationRequest<'_>) -> Result<Image, AdapterError> {
        let image = self.render(request.camera, request.object, request.world_color);
        if self.renders % 1000 == 0 {
            debug!(renders = self.renders, "synthetic renderer progress");
        }
        Ok(image)
    }
}

fn pixel_range(center: f64, reach: f64, len: usize) -> (usize, usize) {
    let lo = (center - reach).floor().max(0.0);
    let hi = (center + reach).ceil() + 1.0;
    let hi = hi.min(len as f64).max(0.0);
    (lo.min(len as f64) as usize, hi as usize)
}

/// Clamps every value into [0, 1] and returns how many were out of range.
fn clamp_unit(values: &mut [f64]) -> usize {
    let mut clamped = 0;
    for v in values {
        if *v < 0.0 || *v > 1.0 {
            *v = v.clamp(0.0, 1.0);
            clamped += 1;
        }
    }
    clamped
}

/// Splat grid over the six faces of a cube centred on the body origin.
fn cube_splats(edge_length: f64, samples_per_edge: usize) -> Vec<Splat> {
    let half = edge_length / 2.0;
    let step = edge_length / samples_per_edge as f64;
    let offsets: Vec<f64> = (0..samples_per_edge)
        .map(|i| -half + step * (i as f64 + 0.5))
        .collect();

    let mut splats = Vec::with_capacity(6 * samples_per_edge * samples_per_edge);
    for (face, color) in FACE_COLORS.iter().enumerate() {
        let axis = face / 2;
        let sign = if face % 2 == 0 { 1.0 } else { -1.0 };
        let mut normal = Vector3::zeros();
        normal[axis] = sign;
        let (a, b) = ((axis + 1) % 3, (axis + 2) % 3);
        for &s in &offsets {
            for &t in &offsets {
                let mut position = Point3::origin();
                position[axis] = sign * half;
                position[a] = s;
                position[b] = t;
                splats.push(Splat {
                    position,
                    normal,
                    color: *color,
                });
            }
        }
    }
    splats
}
