use crate::activations::sigmoid;
use crate::unit::{Unit, UnitId, UnitLookup};
use crate::weights::{
    uniform_draw, WeightInit, WeightInitError, MAX_INITIAL_WEIGHT, MIN_INITIAL_WEIGHT,
};
use rand::Rng;
use std::fmt;
use thiserror::Error;
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum UnitError {
    #[error("Weight count ({actual}) does not match the number of input units ({expected})")]
    WeightCountMismatch { expected: usize, actual: usize },
    #[error("Weight {index} is not finite: {value}")]
    NonFiniteWeight { index: usize, value: f64 },
    #[error("Upstream {0} does not exist")]
    UnknownUnit(UnitId),
    #[error(transparent)]
    WeightInit(#[from] WeightInitError),
}

/// Sums weighted upstream values and squashes them through a sigmoid.
///
/// Holds one weight per upstream id at all times. Upstream units are looked
/// up by id on every [`recompute`](HiddenUnit::recompute); the unit never
/// owns them and never asks them to recompute.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenUnit {
    inputs: Vec<UnitId>,
    weights: Vec<f64>,
    value: f64, // cached output, 0 until the first recompute
}

impl fmt::Display for HiddenUnit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "HiddenUnit {{ inputs: {}, value: {:.5} }}",
            self.inputs.len(),
            self.value
        )
    }
}

impl HiddenUnit {
    /// Weights drawn uniformly from [`MIN_INITIAL_WEIGHT`, `MAX_INITIAL_WEIGHT`).
    pub fn new<R: Rng + ?Sized>(inputs: Vec<UnitId>, rng: &mut R) -> Self {
        let mut unit = HiddenUnit {
            weights: vec![0.0; inputs.len()],
            inputs,
            value: 0.0,
        };
        unit.randomize_weights(rng);
        unit
    }

    /// Copies `weights`; later changes to the caller's slice are not seen.
    pub fn with_weights(inputs: Vec<UnitId>, weights: &[f64]) -> Result<Self, UnitError> {
        check_weights(inputs.len(), weights)?;
        Ok(HiddenUnit {
            inputs,
            weights: weights.to_vec(),
            value: 0.0,
        })
    }

    /// Replaces the weights with a copy of `weights`, checked the same way
    /// as [`with_weights`](HiddenUnit::with_weights). Upstream ids never change.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<(), UnitError> {
        check_weights(self.inputs.len(), weights)?;
        self.weights.copy_from_slice(weights);
        Ok(())
    }

    pub fn randomize_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for w in self.weights.iter_mut() {
            *w = uniform_draw(MIN_INITIAL_WEIGHT, MAX_INITIAL_WEIGHT, rng);
        }
        debug!(n_weights = self.weights.len(), "randomized hidden unit weights");
    }

    /// Like [`randomize_weights`](HiddenUnit::randomize_weights) but with a
    /// caller-chosen scheme. Weights are untouched if `init` is invalid.
    pub fn randomize_weights_with<R: Rng + ?Sized>(
        &mut self,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<(), UnitError> {
        init.fill(&mut self.weights, rng)?;
        debug!(n_weights = self.weights.len(), scheme = ?init, "randomized hidden unit weights");
        Ok(())
    }

    /// `Σ weight[i] * upstream[i].value()` over the cached upstream values.
    pub fn weighted_sum<L: UnitLookup + ?Sized>(&self, upstream: &L) -> Result<f64, UnitError> {
        let mut total = 0.0;
        for (&id, &weight) in self.inputs.iter().zip(&self.weights) {
            let unit = upstream.unit(id).ok_or(UnitError::UnknownUnit(id))?;
            total += weight * unit.value();
        }
        Ok(total)
    }

    /// Refreshes the cached value. On error the previous value is kept.
    pub fn recompute<L: UnitLookup + ?Sized>(&mut self, upstream: &L) -> Result<(), UnitError> {
        let sum = self.weighted_sum(upstream)?;
        if !sum.is_finite() {
            warn!(sum, "non-finite weighted sum in hidden unit");
        }
        self.value = sigmoid(sum);
        trace!(sum, value = self.value, "recomputed hidden unit");
        Ok(())
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn inputs(&self) -> &[UnitId] {
        &self.inputs
    }

    pub fn input_count(&self) -> usize {
        self.inputs.len()
    }
}

fn check_weights(expected: usize, weights: &[f64]) -> Result<(), UnitError> {
    if weights.len() != expected {
        return Err(UnitError::WeightCountMismatch {
            expected,
            actual: weights.len(),
        });
    }
    if let Some((index, &value)) = weights.iter().enumerate().find(|(_, w)| !w.is_finite()) {
        return Err(UnitError::NonFiniteWeight { index, value });
    }
    Ok(())
}

impl Unit for HiddenUnit {
    fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::InputUnit;
    use crate::weights::seeded_rng;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use std::error::Error;

    fn ids(n: usize) -> Vec<UnitId> {
        (0..n).map(UnitId::new).collect()
    }

    fn inputs(values: &[f64]) -> Vec<InputUnit> {
        values.iter().map(|&v| InputUnit::new(v)).collect()
    }

    #[test]
    fn test_single_input() -> Result<(), Box<dyn Error>> {
        let upstream = inputs(&[1.0]);
        let mut unit = HiddenUnit::with_weights(ids(1), &[2.0])?;
        assert_eq!(unit.value(), 0.0);
        unit.recompute(&upstream)?;
        assert_relative_eq!(unit.value(), 0.880_797, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_cancelling_inputs() -> Result<(), Box<dyn Error>> {
        let upstream = inputs(&[1.0, -1.0]);
        let mut unit = HiddenUnit::with_weights(ids(2), &[1.0, 1.0])?;
        assert_eq!(unit.weighted_sum(&upstream)?, 0.0);
        unit.recompute(&upstream)?;
        assert_eq!(unit.value(), 0.5);
        Ok(())
    }

    #[test]
    fn test_weights_are_copied() -> Result<(), Box<dyn Error>> {
        let mut caller_weights = vec![0.5, -0.25];
        let unit = HiddenUnit::with_weights(ids(2), &caller_weights)?;
        caller_weights[0] = 99.0;
        caller_weights[1] = -99.0;
        assert_eq!(unit.weights(), &[0.5, -0.25]);
        Ok(())
    }

    #[test]
    fn test_weight_count_mismatch() {
        assert_eq!(
            HiddenUnit::with_weights(ids(3), &[1.0, 2.0]),
            Err(UnitError::WeightCountMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert!(HiddenUnit::with_weights(ids(0), &[1.0]).is_err());
    }

    #[test]
    fn test_non_finite_weight() {
        let err = HiddenUnit::with_weights(ids(2), &[0.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, UnitError::NonFiniteWeight { index: 1, .. }));
    }

    #[test]
    fn test_recompute_does_not_touch_upstream() -> Result<(), Box<dyn Error>> {
        // upstream hidden units are read as cached, not recomputed
        let first = HiddenUnit::with_weights(vec![], &[])?;
        let mut second = HiddenUnit::with_weights(ids(1), &[3.0])?;
        let upstream = vec![first];
        second.recompute(&upstream)?;
        assert_eq!(upstream[0].value(), 0.0);
        assert_eq!(second.value(), 0.5);
        Ok(())
    }

    #[test]
    fn test_unknown_upstream_keeps_value() -> Result<(), Box<dyn Error>> {
        let upstream = inputs(&[1.0]);
        let mut unit = HiddenUnit::with_weights(ids(1), &[2.0])?;
        unit.recompute(&upstream)?;
        let before = unit.value();
        let mut dangling = HiddenUnit::with_weights(vec![UnitId::new(5)], &[1.0])?;
        assert_eq!(
            dangling.recompute(&upstream),
            Err(UnitError::UnknownUnit(UnitId::new(5)))
        );
        assert_eq!(dangling.value(), 0.0);
        assert_eq!(unit.value(), before);
        Ok(())
    }

    #[test]
    fn test_no_inputs() -> Result<(), Box<dyn Error>> {
        let mut unit = HiddenUnit::with_weights(vec![], &[])?;
        unit.recompute(&Vec::<InputUnit>::new())?;
        assert_eq!(unit.value(), 0.5);
        Ok(())
    }

    #[test]
    fn test_randomize_weights() {
        let mut rng = seeded_rng(42);
        let mut unit = HiddenUnit::new(ids(64), &mut rng);
        assert_eq!(unit.weights().len(), unit.input_count());
        let before = unit.weights().to_vec();
        unit.randomize_weights(&mut rng);
        assert_ne!(unit.weights(), before.as_slice());
        assert!(unit
            .weights()
            .iter()
            .all(|&w| (MIN_INITIAL_WEIGHT..MAX_INITIAL_WEIGHT).contains(&w)));
    }

    #[test]
    fn test_randomize_weights_with() -> Result<(), Box<dyn Error>> {
        let mut rng = seeded_rng(3);
        let mut unit = HiddenUnit::with_weights(ids(4), &[0.1, 0.2, 0.3, 0.4])?;
        let narrow = WeightInit::Uniform { min: 5.0, max: 6.0 };
        unit.randomize_weights_with(&narrow, &mut rng)?;
        assert!(unit.weights().iter().all(|&w| (5.0..6.0).contains(&w)));
        let bad = WeightInit::Uniform { min: 6.0, max: 5.0 };
        let kept = unit.weights().to_vec();
        assert!(unit.randomize_weights_with(&bad, &mut rng).is_err());
        assert_eq!(unit.weights(), kept.as_slice());
        Ok(())
    }

    #[test]
    fn test_overflowing_range_keeps_weights() -> Result<(), Box<dyn Error>> {
        let mut unit = HiddenUnit::with_weights(ids(2), &[0.25, -0.75])?;
        let huge = WeightInit::Uniform {
            min: -1e308,
            max: 1e308,
        };
        assert!(matches!(
            unit.randomize_weights_with(&huge, &mut seeded_rng(1)),
            Err(UnitError::WeightInit(WeightInitError::InvalidRange { .. }))
        ));
        assert_eq!(unit.weights(), &[0.25, -0.75]);
        assert!(unit.weights().iter().all(|w| w.is_finite()));
        Ok(())
    }

    #[test]
    fn test_set_weights() -> Result<(), Box<dyn Error>> {
        let upstream = inputs(&[1.0, 1.0]);
        let mut unit = HiddenUnit::with_weights(ids(2), &[0.0, 0.0])?;
        unit.set_weights(&[1.0, 1.0])?;
        unit.recompute(&upstream)?;
        assert_relative_eq!(unit.value(), sigmoid(2.0), epsilon = 1e-12);
        assert_eq!(
            unit.set_weights(&[1.0]),
            Err(UnitError::WeightCountMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!(unit.set_weights(&[1.0, f64::INFINITY]).is_err());
        assert_eq!(unit.weights(), &[1.0, 1.0]);
        assert_eq!(unit.inputs(), ids(2).as_slice());
        Ok(())
    }

    #[test]
    fn test_display() -> Result<(), Box<dyn Error>> {
        let unit = HiddenUnit::with_weights(ids(2), &[0.0, 0.0])?;
        assert_eq!(unit.to_string(), "HiddenUnit { inputs: 2, value: 0.00000 }");
        Ok(())
    }

    proptest! {
        #[test]
        fn proptest_zero_weights_give_one_half(
            values in proptest::collection::vec(-1.0e6f64..1.0e6, 0..32),
        ) {
            let upstream = inputs(&values);
            let mut unit = HiddenUnit::with_weights(ids(values.len()), &vec![0.0; values.len()])
                .expect("lengths match");
            unit.recompute(&upstream).expect("all upstream ids exist");
            prop_assert_eq!(unit.value(), 0.5);
        }

        #[test]
        fn proptest_recompute_is_sigmoid_of_sum(
            pairs in proptest::collection::vec((-2.0f64..2.0, -2.0f64..2.0), 1..8),
        ) {
            let (weights, values): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
            let upstream = inputs(&values);
            let mut unit = HiddenUnit::with_weights(ids(values.len()), &weights)
                .expect("lengths match");
            unit.recompute(&upstream).expect("all upstream ids exist");
            let sum: f64 = weights.iter().zip(&values).map(|(w, x)| w * x).sum();
            prop_assert!((unit.value() - sigmoid(sum)).abs() < 1e-12);
            prop_assert!(unit.value() > 0.0 && unit.value() < 1.0);
        }

        #[test]
        fn proptest_random_weights_in_range(seed in any::<u64>(), n in 0usize..64) {
            let unit = HiddenUnit::new(ids(n), &mut seeded_rng(seed));
            prop_assert_eq!(unit.weights().len(), n);
            prop_assert!(unit.weights().iter().all(|&w| (-1.0..1.0).contains(&w)));
        }
    }
}
