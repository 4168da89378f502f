// gramian_core/src/gramian/mod.rs

//! Empirical observability Gramians.
//!
//! A Gramian is indexed by `(x, y, z, rot-x, rot-y, rot-z)` (see [`Dof`](crate::frames::Dof)).
//! Batches keep the order of the poses, frames or grid cells that produced them, since
//! measures and searches refer back to entries by position.

use nalgebra::Matrix6;
use serde::{Deserialize, Serialize};

use crate::error::{GramianError, GramianResult};

pub mod assembly;
pub mod measures;

pub use assembly::{
    accumulate_along_path, assemble_gramian, assemble_gramian_integrated,
    gramian_from_perturbations, IntegratedGramian,
};
pub use measures::{measures, GramianMeasures, MeasureSet};

/// A symmetric positive semi-definite 6x6 matrix.
pub type Gramian = Matrix6<f64>;

/// Number of pose degrees of freedom.
pub const N_DOF: usize = 6;

/// An ordered collection of Gramians.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GramianBatch {
    gramians: Vec<Gramian>,
}

/// The `(6, 6, n)` array form of a batch, C order: element `(i, j, k)` is stored at
/// `(i * 6 + j) * n + k`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GramianArray {
    pub shape: Vec<usize>,
    pub data: Vec<f64>,
}

impl GramianBatch {
    pub fn new(gramians: Vec<Gramian>) -> Self {
        Self { gramians }
    }

    pub fn push(&mut self, gramian: Gramian) {
        self.gramians.push(gramian);
    }

    pub fn len(&self) -> usize {
        self.gramians.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gramians.is_empty()
    }

    pub fn get(&self, k: usize) -> Option<&Gramian> {
        self.gramians.get(k)
    }

    pub fn as_slice(&self) -> &[Gramian] {
        &self.gramians
    }

    /// Element-wise sum of every Gramian in the batch.
    pub fn sum(&self) -> Gramian {
        self.gramians.iter().fold(Gramian::zeros(), |acc, g| acc + g)
    }

    pub fn to_array(&self) -> GramianArray {
        let n = self.gramians.len();
        let mut data = vec![0.0; N_DOF * N_DOF * n];
        for (k, g) in self.gramians.iter().enumerate() {
            for i in 0..N_DOF {
                for j in 0..N_DOF {
                    data[(i * N_DOF + j) * n + k] = g[(i, j)];
                }
            }
        }
        GramianArray {
            shape: vec![N_DOF, N_DOF, n],
            data,
        }
    }

    pub fn from_array(array: &GramianArray) -> GramianResult<Self> {
        let n = match array.shape.as_slice() {
            [N_DOF, N_DOF, n] => *n,
            _ => {
                return Err(GramianError::InvalidBatchShape {
                    found: array.shape.clone(),
                    expected_len: array.data.len(),
                })
            }
        };
        if array.data.len() != N_DOF * N_DOF * n {
            return Err(GramianError::InvalidBatchShape {
                found: array.shape.clone(),
                expected_len: N_DOF * N_DOF * n,
            });
        }
        let gramians = (0..n)
            .map(|k| Gramian::from_fn(|i, j| array.data[(i * N_DOF + j) * n + k]))
            .collect();
        Ok(Self { gramians })
    }
}

impl FromIterator<Gramian> for GramianBatch {
    fn from_iter<I: IntoIterator<Item = Gramian>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_layout_is_six_by_six_by_n() {
        let a = Gramian::from_fn(|i, j| (i * 10 + j) as f64);
        let b = Gramian::identity() * 2.0;
        let batch: GramianBatch = vec![a, b].into_iter().collect();
        let array = batch.to_array();
        assert_eq!(array.shape, vec![6, 6, 2]);
        // element (1, 2) of the first gramian, then of the second
        assert_eq!(array.data[(6 + 2) * 2], 12.0);
        assert_eq!(array.data[(6 + 2) * 2 + 1], 0.0);
        assert_eq!(GramianBatch::from_array(&array).unwrap(), batch);
    }

    #[test]
    fn from_array_rejects_bad_shapes() {
        let bad = GramianArray {
            shape: vec![6, 5, 1],
            data: vec![0.0; 30],
        };
        assert!(GramianBatch::from_array(&bad).is_err());
        let short = GramianArray {
            shape: vec![6, 6, 2],
            data: vec![0.0; 36],
        };
        assert!(GramianBatch::from_array(&short).is_err());
    }

    #[test]
    fn sum_adds_elementwise() {
        let batch = GramianBatch::new(vec![Gramian::identity(); 3]);
        assert_eq!(batch.sum(), Gramian::identity() * 3.0);
        assert_eq!(GramianBatch::default().sum(), Gramian::zeros());
    }
}
