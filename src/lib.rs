//! Sigmoid hidden units for small feed-forward networks.
//!
//! A [`HiddenUnit`] sums weighted values from upstream units and caches
//! `sigmoid(sum)`. Units live in a [`Network`] arena and refer to each other
//! by [`UnitId`].

pub mod activations;
pub mod config;
pub mod hidden_unit;
pub mod network;
pub mod unit;
pub mod weights;

pub use activations::sigmoid;
pub use config::{ConfigError, InitConfig};
pub use hidden_unit::{HiddenUnit, UnitError};
pub use network::{Network, NetworkError, Node};
pub use unit::{InputUnit, Unit, UnitId, UnitLookup};
pub use weights::{
    seeded_rng, WeightInit, WeightInitError, MAX_INITIAL_WEIGHT, MIN_INITIAL_WEIGHT,
};
