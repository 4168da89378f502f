// gramian_core/src/gramian/measures.rs

use nalgebra::SymmetricEigen;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{GramianError, GramianResult};
use crate::gramian::Gramian;
use crate::utils::serde_helpers;

/// Relative tolerance on `max |W - W^T|` before a Gramian is rejected as asymmetric.
pub const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// One value per Gramian for each scalar measure, in batch order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MeasureSet {
    #[serde(with = "serde_helpers::non_finite_vec")]
    pub trace: Vec<f64>,
    #[serde(with = "serde_helpers::non_finite_vec")]
    pub determinant: Vec<f64>,
    #[serde(with = "serde_helpers::non_finite_vec")]
    pub min_eigenvalue: Vec<f64>,
    #[serde(with = "serde_helpers::non_finite_vec")]
    pub condition_number: Vec<f64>,
}

impl MeasureSet {
    fn with_capacity(n: usize) -> Self {
        Self {
            trace: Vec::with_capacity(n),
            determinant: Vec::with_capacity(n),
            min_eigenvalue: Vec::with_capacity(n),
            condition_number: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.trace.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trace.is_empty()
    }

    /// `(name, values)` pairs in a fixed order.
    pub fn arrays(&self) -> [(&'static str, &[f64]); 4] {
        [
            ("trace", self.trace.as_slice()),
            ("determinant", self.determinant.as_slice()),
            ("min_eigenvalue", self.min_eigenvalue.as_slice()),
            ("condition_number", self.condition_number.as_slice()),
        ]
    }

    /// Every array divided by its own largest finite value.
    pub fn normalized(&self) -> Self {
        Self {
            trace: normalize(&self.trace),
            determinant: normalize(&self.determinant),
            min_eigenvalue: normalize(&self.min_eigenvalue),
            condition_number: normalize(&self.condition_number),
        }
    }
}

/// Observability (`direct`) and unobservability (`inverse`) measures of a batch.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GramianMeasures {
    pub direct: MeasureSet,
    pub inverse: MeasureSet,
    pub direct_normalized: MeasureSet,
    pub inverse_normalized: MeasureSet,
}

/// Scalar measures of every Gramian in `gramians`.
///
/// Eigenvalues at or below `6 * f64::EPSILON * lambda_max` count as zero. A singular
/// Gramian has an infinite condition number, and an infinite inverse trace and
/// determinant. Singular Gramians are results, not errors.
pub fn measures(gramians: &[Gramian]) -> GramianResult<GramianMeasures> {
    let n = gramians.len();
    let mut direct = MeasureSet::with_capacity(n);
    let mut inverse = MeasureSet::with_capacity(n);

    for (index, g) in gramians.iter().enumerate() {
        check_symmetric(index, g)?;

        let eigenvalues = SymmetricEigen::new(*g).eigenvalues;
        let lambda_min = eigenvalues.min();
        let lambda_max = eigenvalues.max();
        let tol = 6.0 * f64::EPSILON * lambda_max;
        let singular = lambda_min <= tol;
        if singular {
            debug!(index, lambda_min, lambda_max, "degenerate gramian");
        }

        let condition = if singular {
            f64::INFINITY
        } else {
            lambda_max / lambda_min
        };

        direct.trace.push(g.trace());
        direct.determinant.push(g.determinant());
        direct.min_eigenvalue.push(lambda_min);
        direct.condition_number.push(condition);

        if singular {
            inverse.trace.push(f64::INFINITY);
            inverse.determinant.push(f64::INFINITY);
        } else {
            inverse.trace.push(eigenvalues.iter().map(|l| 1.0 / l).sum());
            inverse.determinant.push(eigenvalues.iter().map(|l| 1.0 / l).product());
        }
        inverse.min_eigenvalue.push(if lambda_max > 0.0 {
            1.0 / lambda_max
        } else {
            f64::INFINITY
        });
        inverse.condition_number.push(condition);
    }

    Ok(GramianMeasures {
        direct_normalized: direct.normalized(),
        inverse_normalized: inverse.normalized(),
        direct,
        inverse,
    })
}

fn check_symmetric(index: usize, g: &Gramian) -> GramianResult<()> {
    if g.iter().any(|v| !v.is_finite()) {
        return Err(GramianError::NonFiniteGramian { index });
    }
    let deviation = (g - g.transpose()).amax();
    let scale = g.amax();
    if deviation.is_nan() || deviation > SYMMETRY_TOLERANCE * scale {
        return Err(GramianError::Asymmetric { index, deviation });
    }
    Ok(())
}

/// Divides by the largest finite value. Infinite entries stay infinite; when the largest
/// finite value is not positive (or there is none) the values are returned unscaled.
pub fn normalize(values: &[f64]) -> Vec<f64> {
    let max = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        values.iter().map(|v| v / max).collect()
    } else {
        values.to_vec()
    }
}
