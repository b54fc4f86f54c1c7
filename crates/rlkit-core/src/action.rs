//! Continuous actions and bounded box spaces

use ndarray::Array1;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{RLError, Result};

/// Continuous action vector (e.g., joint torques)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuousAction(pub Array1<f32>);

impl ContinuousAction {
    /// Create an action from raw values
    #[must_use]
    pub fn new(values: Vec<f32>) -> Self {
        Self(Array1::from_vec(values))
    }

    /// All-zero action of the given dimension
    #[must_use]
    pub fn zeros(dim: usize) -> Self {
        Self(Array1::zeros(dim))
    }

    /// Number of action dimensions
    #[must_use]
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    /// Raw values as a vector
    #[must_use]
    pub fn to_vec(&self) -> Vec<f32> {
        self.0.to_vec()
    }

    /// Clamp every element into `[low, high]`.
    ///
    /// NaN elements are mapped to `low` so the result always lies in range.
    #[must_use]
    pub fn clamped(&self, low: f32, high: f32) -> Self {
        Self(self.0.mapv(|v| if v.is_nan() { low } else { v.clamp(low, high) }))
    }

    /// Smallest element, `0.0` for an empty action
    #[must_use]
    pub fn min(&self) -> f32 {
        self.0.iter().copied().reduce(f32::min).unwrap_or(0.0)
    }

    /// Largest element, `0.0` for an empty action
    #[must_use]
    pub fn max(&self) -> f32 {
        self.0.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }

    /// Mean of all elements, `0.0` for an empty action
    #[must_use]
    pub fn mean(&self) -> f32 {
        self.0.mean().unwrap_or(0.0)
    }
}

impl From<Vec<f32>> for ContinuousAction {
    fn from(values: Vec<f32>) -> Self {
        Self::new(values)
    }
}

/// Continuous bounded space (box)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxSpace {
    /// Lower bounds for each dimension
    pub low: Vec<f32>,
    /// Upper bounds for each dimension
    pub high: Vec<f32>,
}

impl BoxSpace {
    /// Create a new box space
    pub fn new(low: Vec<f32>, high: Vec<f32>) -> Result<Self> {
        if low.len() != high.len() {
            return Err(RLError::DimensionMismatch {
                expected: low.len(),
                actual: high.len(),
            });
        }
        Ok(Self { low, high })
    }

    /// Box with identical bounds in every dimension
    #[must_use]
    pub fn uniform(dim: usize, low: f32, high: f32) -> Self {
        Self {
            low: vec![low; dim],
            high: vec![high; dim],
        }
    }

    /// Dimensionality of the space
    #[must_use]
    pub fn dim(&self) -> usize {
        self.low.len()
    }

    /// Sample a uniformly random point
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Array1<f32> {
        self.low
            .iter()
            .zip(&self.high)
            .map(|(&l, &h)| if l < h && l.is_finite() && h.is_finite() { rng.gen_range(l..h) } else { 0.0 })
            .collect()
    }

    /// Check if a vector lies inside the space
    #[must_use]
    pub fn contains(&self, values: &Array1<f32>) -> bool {
        values.len() == self.low.len()
            && values
                .iter()
                .zip(&self.low)
                .zip(&self.high)
                .all(|((x, l), h)| x >= l && x <= h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_action_statistics() {
        let action = ContinuousAction::new(vec![-0.5, 0.25, 1.0, 0.25]);
        assert_eq!(action.min(), -0.5);
        assert_eq!(action.max(), 1.0);
        approx::assert_relative_eq!(action.mean(), 0.25);
    }

    #[test]
    fn test_box_space_rejects_mismatched_bounds() {
        let err = BoxSpace::new(vec![0.0; 3], vec![1.0; 2]).unwrap_err();
        assert!(matches!(err, RLError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[test]
    fn test_box_sample_is_contained() {
        let space = BoxSpace::uniform(4, -1.0, 1.0);
        let mut rng = rand::thread_rng();
        for _ in 0..100 {
            assert!(space.contains(&space.sample(&mut rng)));
        }
    }

    proptest! {
        #[test]
        fn clamped_actions_stay_in_unit_box(values in prop::collection::vec(prop::num::f32::ANY, 0..16)) {
            let action = ContinuousAction::new(values).clamped(-1.0, 1.0);
            prop_assert!(action.0.iter().all(|v| (-1.0..=1.0).contains(v)));
        }
    }
}
