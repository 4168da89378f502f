// gramian_core/src/error.rs

//! Error types for the Gramian engine.
//!
//! Configuration errors are fatal to the single Gramian being computed. Numerical
//! degeneracy (singular or ill-conditioned Gramians) is never reported here: it is
//! a legitimate result and is represented in the measures themselves.

use crate::frames::Dof;
use thiserror::Error;

/// Boxed error returned by an `ObservationAdapter`. The engine never inspects or
/// retries it; it only attaches the sample/DOF context.
pub type AdapterError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the crate.
pub type GramianResult<T> = Result<T, GramianError>;

#[derive(Debug, Error)]
pub enum GramianError {
    #[error("perturbation magnitude must be finite and > 0, got {eps}")]
    InvalidEpsilon { eps: f64 },

    #[error("orientation quaternion must have unit norm, got norm {norm}")]
    NonUnitQuaternion { norm: f64 },

    #[error("image buffer holds {found} values but {height}x{width}x{channels} needs {expected}")]
    InvalidImageBuffer {
        height: usize,
        width: usize,
        channels: usize,
        expected: usize,
        found: usize,
    },

    #[error("sample {sample}, {dof}: observation has {channels} channels (expected 3 or 4)")]
    UnsupportedChannels {
        sample: usize,
        dof: Dof,
        channels: usize,
    },

    #[error("sample {sample}, {dof}: negative observation is {minus:?} but positive is {plus:?}")]
    ShapeMismatch {
        sample: usize,
        dof: Dof,
        minus: (usize, usize, usize),
        plus: (usize, usize, usize),
    },

    #[error("sample {sample}, {dof}: difference column has {found} elements, earlier columns had {expected}")]
    ObservationSizeChanged {
        sample: usize,
        dof: Dof,
        expected: usize,
        found: usize,
    },

    #[error("sample {sample}, {dof}: background is {background:?} but observation is {observation:?}")]
    BackgroundShapeMismatch {
        sample: usize,
        dof: Dof,
        background: (usize, usize, usize),
        observation: (usize, usize, usize),
    },

    #[error("sample {sample}: no {what} configured for this sample")]
    MissingSampleData { sample: usize, what: &'static str },

    #[error("sample {sample}, {dof}: observation adapter failed: {source}")]
    Adapter {
        sample: usize,
        dof: Dof,
        #[source]
        source: AdapterError,
    },

    #[error("gramian {index} has non-finite entries")]
    NonFiniteGramian { index: usize },

    #[error("gramian {index} is not symmetric (max deviation {deviation:e})")]
    Asymmetric { index: usize, deviation: f64 },

    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),

    #[error("dynamics state has {found} variables, the rigid-body trajectory needs the {expected}-variable velocity layout")]
    StateLayoutMismatch { expected: usize, found: usize },

    #[error("invalid frame sampling: {0}")]
    InvalidSampling(String),

    #[error("trajectory length mismatch: nominal has {nominal} samples, perturbed trajectory {index} has {found}")]
    TrajectoryLengthMismatch {
        nominal: usize,
        index: usize,
        found: usize,
    },

    #[error("candidate {index}: {source}")]
    Candidate {
        index: usize,
        #[source]
        source: Box<GramianError>,
    },

    #[error("sample {sample}, {dof}: observation contains non-finite values")]
    NonFiniteObservation { sample: usize, dof: Dof },

    #[error("invalid candidate family: {0}")]
    InvalidFamily(String),

    #[error("gramian array has shape {found:?}, expected [6, 6, n] with {expected_len} values")]
    InvalidBatchShape {
        found: Vec<usize>,
        expected_len: usize,
    },
}
