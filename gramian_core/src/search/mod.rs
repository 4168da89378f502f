// gramian_core/src/search/mod.rs

//! Search over parametrised camera viewpoints and paths.
//!
//! Every candidate of a family is evaluated with the full Gramian pipeline, then the
//! candidates with the smallest and largest value of each measure are reported by index.

use std::fmt::Debug;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{GramianError, GramianResult};
use crate::gramian::{accumulate_along_path, measures, GramianBatch, GramianMeasures};
use crate::observation::{ObservationAdapter, ObservationSetup};
use crate::types::Pose;

pub mod families;

pub use families::{ArcCandidate, SemicircleArcs, SphereViewpoints, ViewpointCandidate};

/// A family of candidate camera configurations.
pub trait CandidateFamily {
    type Candidate: Clone + Debug + Serialize;

    /// Every candidate, in grid index order.
    fn candidates(&self) -> Vec<Self::Candidate>;

    /// The camera poses one candidate observes the object from.
    fn camera_path(&self, candidate: &Self::Candidate) -> Vec<Pose>;

    /// Factor applied to the summed per-pose Gramians of a path.
    fn path_weight(&self) -> f64 {
        1.0
    }
}

/// Grid index and value of an extremum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extremum {
    pub index: usize,
    #[serde(with = "crate::utils::serde_helpers::non_finite_f64")]
    pub value: f64,
}

/// Smallest and largest value of one measure; `None` when no value is comparable.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Extrema {
    pub min: Option<Extremum>,
    pub max: Option<Extremum>,
}

impl Extrema {
    /// NaN values are skipped and the first index wins ties. Infinite values take part,
    /// so a singular Gramian's infinite condition number is a valid maximum.
    pub fn of(values: &[f64]) -> Self {
        let mut extrema = Self::default();
        for (index, &value) in values.iter().enumerate() {
            if value.is_nan() {
                continue;
            }
            if extrema.min.map_or(true, |m| value < m.value) {
                extrema.min = Some(Extremum { index, value });
            }
            if extrema.max.map_or(true, |m| value > m.value) {
                extrema.max = Some(Extremum { index, value });
            }
        }
        extrema
    }
}

/// Extremal candidates for each observability measure.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub trace: Extrema,
    pub determinant: Extrema,
    pub min_eigenvalue: Extrema,
    pub condition_number: Extrema,
}

impl SearchResult {
    pub fn from_measures(measures: &GramianMeasures) -> Self {
        let direct = &measures.direct;
        Self {
            trace: Extrema::of(&direct.trace),
            determinant: Extrema::of(&direct.determinant),
            min_eigenvalue: Extrema::of(&direct.min_eigenvalue),
            condition_number: Extrema::of(&direct.condition_number),
        }
    }

    /// `(measure name, extrema)` pairs in a fixed order.
    pub fn entries(&self) -> [(&'static str, &Extrema); 4] {
        [
            ("trace", &self.trace),
            ("determinant", &self.determinant),
            ("min_eigenvalue", &self.min_eigenvalue),
            ("condition_number", &self.condition_number),
        ]
    }
}

/// Everything a search produced. `batch`, the measure arrays and `candidates` share one
/// index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome<C> {
    pub candidates: Vec<C>,
    pub batch: GramianBatch,
    pub measures: GramianMeasures,
    pub result: SearchResult,
}

impl<C> SearchOutcome<C> {
    pub fn candidate(&self, extremum: &Extremum) -> Option<&C> {
        self.candidates.get(extremum.index)
    }
}

/// Evaluates every candidate of `family` for an object at `object`.
///
/// A candidate's Gramian is the weighted sum over its camera path; for single-pose
/// families that is just the Gramian at that viewpoint. Candidates run one after another
/// on the same adapter.
pub fn search<F, A>(
    family: &F,
    object: &Pose,
    eps: f64,
    setup: &ObservationSetup,
    adapter: &mut A,
) -> GramianResult<SearchOutcome<F::Candidate>>
where
    F: CandidateFamily + ?Sized,
    A: ObservationAdapter + ?Sized,
{
    let candidates = family.candidates();
    info!(candidates = candidates.len(), eps, "starting gramian search");

    let mut batch = GramianBatch::default();
    for (index, candidate) in candidates.iter().enumerate() {
        let path = family.camera_path(candidate);
        let gramian =
            accumulate_along_path(&path, object, eps, setup, adapter, family.path_weight())
                .map_err(|source| GramianError::Candidate {
                    index,
                    source: Box::new(source),
                })?;
        debug!(index, ?candidate, trace = gramian.integrated.trace(), "candidate evaluated");
        batch.push(gramian.integrated);
    }

    let measures = measures(batch.as_slice())?;
    let result = SearchResult::from_measures(&measures);
    info!(
        best_trace = ?result.trace.max.map(|e| e.index),
        best_min_eigenvalue = ?result.min_eigenvalue.max.map(|e| e.index),
        "gramian search finished"
    );
    Ok(SearchOutcome {
        candidates,
        batch,
        measures,
        result,
    })
}
