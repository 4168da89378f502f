// gramian_core/src/observation.rs

//! The boundary to the external renderer.
//!
//! The engine only needs "render this pose, give me pixels". Everything about the
//! rendering device, resolution, lens and assets belongs to the adapter implementation.

use crate::error::{AdapterError, GramianError, GramianResult};
use crate::types::{Image, Pose};

/// What the engine asks the renderer for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObservationRequest<'a> {
    pub camera: &'a Pose,
    pub object: &'a Pose,
    /// Optional world (ambient/background) colour, RGB in [0, 1].
    pub world_color: Option<[f64; 3]>,
}

/// The contract for anything that can render an object pose as seen by a camera.
///
/// Implementations return an `H x W x 3` or `H x W x 4` image with values in [0, 1].
/// An adapter is used by one computation at a time (`&mut self`); run independent
/// searches with independent adapter instances.
pub trait ObservationAdapter {
    fn observe(&mut self, request: &ObservationRequest<'_>) -> Result<Image, AdapterError>;
}

impl<F> ObservationAdapter for F
where
    F: FnMut(&ObservationRequest<'_>) -> Result<Image, AdapterError>,
{
    fn observe(&mut self, request: &ObservationRequest<'_>) -> Result<Image, AdapterError> {
        self(request)
    }
}

/// Pins a closure's signature so it is accepted as an `ObservationAdapter`.
pub fn adapter_fn<F>(f: F) -> F
where
    F: FnMut(&ObservationRequest<'_>) -> Result<Image, AdapterError>,
{
    f
}

/// A value that may be absent, shared by every sample, or given per sample.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PerSample<T> {
    #[default]
    None,
    Uniform(T),
    Varying(Vec<T>),
}

impl<T> PerSample<T> {
    /// `Ok(None)` when absent; an error when per-sample data does not cover `sample`.
    pub fn get(&self, sample: usize, what: &'static str) -> GramianResult<Option<&T>> {
        match self {
            PerSample::None => Ok(None),
            PerSample::Uniform(v) => Ok(Some(v)),
            PerSample::Varying(values) => values
                .get(sample)
                .map(Some)
                .ok_or(GramianError::MissingSampleData { sample, what }),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, PerSample::None)
    }
}

/// Everything about an observation other than the object pose.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSetup {
    pub camera: Pose,
    pub world_color: PerSample<[f64; 3]>,
    /// RGB background that RGBA observations are composited onto before differencing.
    pub background: PerSample<Image>,
}

impl ObservationSetup {
    pub fn new(camera: Pose) -> Self {
        Self {
            camera,
            world_color: PerSample::None,
            background: PerSample::None,
        }
    }

    pub fn with_camera(&self, camera: Pose) -> Self {
        Self {
            camera,
            ..self.clone()
        }
    }
}

/// Linear alpha compositing of an RGBA foreground onto an RGB background,
/// `out = a * fg + (1 - a) * bg`, in [0, 1] space. Values are not clamped.
///
/// The caller guarantees matching `height x width` and a grey (1 channel) or colour
/// background; an RGB foreground is treated as opaque.
pub fn composite(foreground: &Image, background: &Image) -> Image {
    let channels = foreground.channels();
    let bg_channels = background.channels();
    Image::from_fn(foreground.height(), foreground.width(), 3, |row, col, out| {
        let fg = foreground.pixel(row, col);
        let bg = background.pixel(row, col);
        let alpha = if channels == 4 { fg[3] } else { 1.0 };
        for c in 0..3 {
            let bg_c = if bg_channels >= 3 { bg[c] } else { bg[0] };
            out[c] = alpha * fg[c] + (1.0 - alpha) * bg_c;
        }
    })
}
