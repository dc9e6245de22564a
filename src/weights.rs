use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound of the default initial weight range.
pub const MIN_INITIAL_WEIGHT: f64 = -1.0;
/// Upper bound (exclusive) of the default initial weight range.
pub const MAX_INITIAL_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightInitError {
    #[error("Uniform weight range must be finite and non-empty, got [{min}, {max})")]
    InvalidRange { min: f64, max: f64 },
    #[error("Normal weight scheme needs a finite mean and a positive finite standard deviation, got mean={mean}, std_dev={std_dev}")]
    InvalidNormal { mean: f64, std_dev: f64 },
}

/// How fresh weights are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WeightInit {
    /// `min + r * (max - min)` with `r` uniform in [0, 1). A draw that rounds
    /// up to `max` is pulled back to the largest float below it.
    Uniform { min: f64, max: f64 },
    Normal { mean: f64, std_dev: f64 },
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Uniform {
            min: MIN_INITIAL_WEIGHT,
            max: MAX_INITIAL_WEIGHT,
        }
    }
}

impl WeightInit {
    pub fn validate(&self) -> Result<(), WeightInitError> {
        match *self {
            WeightInit::Uniform { min, max } => {
                if !min.is_finite() || !max.is_finite() || min >= max || !(max - min).is_finite()
                {
                    return Err(WeightInitError::InvalidRange { min, max });
                }
            }
            WeightInit::Normal { mean, std_dev } => {
                if !mean.is_finite() || !std_dev.is_finite() || std_dev <= 0.0 {
                    return Err(WeightInitError::InvalidNormal { mean, std_dev });
                }
            }
        }
        Ok(())
    }

    /// Overwrites every element of `weights`. Nothing is written if the
    /// scheme is invalid.
    pub fn fill<R: Rng + ?Sized>(
        &self,
        weights: &mut [f64],
        rng: &mut R,
    ) -> Result<(), WeightInitError> {
        self.validate()?;
        match *self {
            WeightInit::Uniform { min, max } => {
                for w in weights.iter_mut() {
                    *w = uniform_draw(min, max, rng);
                }
            }
            WeightInit::Normal { mean, std_dev } => {
                let normal = Normal::new(mean, std_dev)
                    .map_err(|_| WeightInitError::InvalidNormal { mean, std_dev })?;
                for w in weights.iter_mut() {
                    *w = normal.sample(rng);
                }
            }
        }
        Ok(())
    }

    pub fn sample_vec<R: Rng + ?Sized>(
        &self,
        n: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>, WeightInitError> {
        let mut weights = vec![0.0; n];
        self.fill(&mut weights, rng)?;
        Ok(weights)
    }
}

/// One draw of `lo + r * (hi - lo)`, `r` uniform in [0, 1). Always below `hi`
/// for finite `lo < hi`.
pub fn uniform_draw<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    let w = lo + rng.random::<f64>() * (hi - lo);
    if w < hi {
        w
    } else {
        float_below(hi).max(lo)
    }
}

/// Largest finite `f64` strictly below `x`.
fn float_below(x: f64) -> f64 {
    if x > 0.0 {
        f64::from_bits(x.to_bits() - 1)
    } else if x == 0.0 {
        -f64::from_bits(1)
    } else {
        f64::from_bits(x.to_bits() + 1)
    }
}

/// Reproducible generator for a given seed.
pub fn seeded_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}
