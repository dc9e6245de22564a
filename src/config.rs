use crate::weights::{seeded_rng, WeightInit, WeightInitError};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Config JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid weight initialisation: {0}")]
    WeightInit(#[from] WeightInitError),
}

/// How a network's weights are initialised.
///
/// ```json
/// { "weight_init": { "kind": "uniform", "min": -1.0, "max": 1.0 }, "seed": 42 }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InitConfig {
    pub weight_init: WeightInit,
    /// `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl InitConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weight_init.validate()?;
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: InitConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref())?;
        let config: InitConfig = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        info!(path = %path.as_ref().display(), "loaded init config");
        Ok(config)
    }

    /// Fails if `path` already exists.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        let file = File::create_new(path.as_ref())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        debug!(path = %path.as_ref().display(), "wrote init config");
        Ok(())
    }

    pub fn rng(&self) -> ChaCha12Rng {
        match self.seed {
            Some(seed) => seeded_rng(seed),
            None => ChaCha12Rng::from_rng(&mut rand::rng()),
        }
    }
}
