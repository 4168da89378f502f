// gramian_core/src/types.rs

use nalgebra::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{GramianError, GramianResult};

/// Tolerance on the norm of raw quaternions handed to the engine.
pub const QUATERNION_NORM_TOLERANCE: f64 = 1e-6;

// --- Pose ---

/// Position and orientation of a rigid body (or camera) in the world frame.
/// The orientation is stored as a `UnitQuaternion`, so it is unit-norm by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    pub fn new(position: Vector3<f64>, orientation: UnitQuaternion<f64>) -> Self {
        Self {
            position,
            orientation,
        }
    }

    pub fn identity() -> Self {
        Self::new(Vector3::zeros(), UnitQuaternion::identity())
    }

    /// Builds a pose from raw numbers, with the quaternion in scalar-first order `[w, x, y, z]`.
    /// The quaternion must already be unit-norm; it is not silently normalized.
    pub fn from_raw(position: [f64; 3], quaternion_wxyz: [f64; 4]) -> GramianResult<Self> {
        let [w, x, y, z] = quaternion_wxyz;
        let q = Quaternion::new(w, x, y, z);
        let norm = q.norm();
        if !norm.is_finite() || (norm - 1.0).abs() > QUATERNION_NORM_TOLERANCE {
            return Err(GramianError::NonUnitQuaternion { norm });
        }
        Ok(Self::new(
            Vector3::from(position),
            UnitQuaternion::new_normalize(q),
        ))
    }

    /// The orientation as scalar-first `[w, x, y, z]`.
    pub fn quaternion_wxyz(&self) -> [f64; 4] {
        let q = self.orientation.quaternion();
        [q.w, q.i, q.j, q.k]
    }

    pub fn to_isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position), self.orientation)
    }
}

// --- Image ---

/// A rendered observation: `height x width x channels` values stored row-major,
/// channel-interleaved. Channel values are nominally in [0, 1]; the engine never
/// clamps them.
#[derive(Debug, Clone, PartialEq)]
pub struct Image {
    height: usize,
    width: usize,
    channels: usize,
    data: Vec<f64>,
}

impl Image {
    pub fn new(height: usize, width: usize, channels: usize, data: Vec<f64>) -> GramianResult<Self> {
        let expected = height * width * channels;
        if data.len() != expected {
            return Err(GramianError::InvalidImageBuffer {
                height,
                width,
                channels,
                expected,
                found: data.len(),
            });
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// An image filled with a constant value in every channel.
    pub fn filled(height: usize, width: usize, channels: usize, value: f64) -> Self {
        Self {
            height,
            width,
            channels,
            data: vec![value; height * width * channels],
        }
    }

    /// Builds an image from a per-pixel closure returning the channel values of `(row, col)`.
    pub fn from_fn<F>(height: usize, width: usize, channels: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize, &mut [f64]),
    {
        let mut data = vec![0.0; height * width * channels];
        for (pixel, chunk) in data.chunks_mut(channels.max(1)).enumerate() {
            f(pixel / width.max(1), pixel % width.max(1), chunk);
        }
        Self {
            height,
            width,
            channels,
            data,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// `(height, width, channels)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.height, self.width, self.channels)
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }

    pub fn pixel(&self, row: usize, col: usize) -> &[f64] {
        let start = (row * self.width + col) * self.channels;
        &self.data[start..start + self.channels]
    }

    pub fn pixel_mut(&mut self, row: usize, col: usize) -> &mut [f64] {
        let start = (row * self.width + col) * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// The first three channels. RGB images are returned as-is, RGBA images lose alpha.
    pub fn to_rgb(&self) -> Image {
        if self.channels == 3 {
            return self.clone();
        }
        let data = self
            .data
            .chunks(self.channels)
            .flat_map(|px| px.iter().take(3).copied())
            .collect();
        Image {
            height: self.height,
            width: self.width,
            channels: 3,
            data,
        }
    }
}
