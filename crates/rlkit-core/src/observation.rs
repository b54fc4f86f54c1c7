//! Observation representations

use ndarray::{s, Array1};
use serde::{Deserialize, Serialize};

use crate::{RLError, Result};

/// Vector observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorObservation {
    /// The observation data
    pub data: Array1<f32>,
}

impl VectorObservation {
    /// Create an observation from raw values
    #[must_use]
    pub fn new(data: Vec<f32>) -> Self {
        Self {
            data: Array1::from_vec(data),
        }
    }

    /// Number of features
    #[must_use]
    pub fn dim(&self) -> usize {
        self.data.len()
    }

    /// Copy out the contiguous range `[offset, offset + len)`
    pub fn slice(&self, offset: usize, len: usize) -> Result<Self> {
        let end = offset + len;
        if end > self.data.len() {
            return Err(RLError::DimensionMismatch {
                expected: end,
                actual: self.data.len(),
            });
        }
        Ok(Self {
            data: self.data.slice(s![offset..end]).to_owned(),
        })
    }
}

impl From<Array1<f32>> for VectorObservation {
    fn from(data: Array1<f32>) -> Self {
        Self { data }
    }
}

impl From<Vec<f64>> for VectorObservation {
    fn from(data: Vec<f64>) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self::new(data.into_iter().map(|v| v as f32).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slice_in_bounds() {
        let obs = VectorObservation::new(vec![0.0, 1.0, 2.0, 3.0]);
        let part = obs.slice(1, 2).unwrap();
        assert_eq!(part.data.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let obs = VectorObservation::new(vec![0.0; 4]);
        assert!(matches!(
            obs.slice(2, 3),
            Err(RLError::DimensionMismatch { expected: 5, actual: 4 })
        ));
    }
}
