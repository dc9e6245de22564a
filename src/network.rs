use crate::hidden_unit::{HiddenUnit, UnitError};
use crate::unit::{InputUnit, Unit, UnitId};
use crate::weights::WeightInit;
use rand::Rng;
use rayon::prelude::*;
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkError {
    #[error("{id} does not exist in a network of {len} units")]
    UnknownUnit { id: UnitId, len: usize },
    #[error("{0} is not an input unit")]
    NotAnInput(UnitId),
    #[error("{0} is not a hidden unit")]
    NotHidden(UnitId),
    #[error("{upstream} is not yet in the network and cannot feed {unit}")]
    ForwardReference { unit: UnitId, upstream: UnitId },
    #[error("Expected {expected} input values, got {actual}")]
    InputLengthMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Unit(#[from] UnitError),
}

/// A unit owned by a [`Network`].
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Input(InputUnit),
    Hidden(HiddenUnit),
}

impl Unit for Node {
    fn value(&self) -> f64 {
        match self {
            Node::Input(unit) => unit.value(),
            Node::Hidden(unit) => unit.value(),
        }
    }
}

/// Append-only arena of units.
///
/// A unit's id is its position. Hidden units may only read units that were
/// added before them, so insertion order is always a valid recompute order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    units: Vec<Node>,
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let n_inputs = self.input_ids().count();
        write!(
            f,
            "Network {{ units: {}, inputs: {}, hidden: {} }}",
            self.units.len(),
            n_inputs,
            self.units.len() - n_inputs
        )
    }
}

impl Network {
    pub fn new() -> Self {
        Network::default()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn add_input(&mut self, value: f64) -> UnitId {
        self.push(Node::Input(InputUnit::new(value)))
    }

    /// Hidden unit with weights uniform in the default range.
    pub fn add_hidden<R: Rng + ?Sized>(
        &mut self,
        inputs: Vec<UnitId>,
        rng: &mut R,
    ) -> Result<UnitId, NetworkError> {
        self.check_upstream(&inputs)?;
        Ok(self.push(Node::Hidden(HiddenUnit::new(inputs, rng))))
    }

    pub fn add_hidden_with_weights(
        &mut self,
        inputs: Vec<UnitId>,
        weights: &[f64],
    ) -> Result<UnitId, NetworkError> {
        self.check_upstream(&inputs)?;
        let unit = HiddenUnit::with_weights(inputs, weights)?;
        Ok(self.push(Node::Hidden(unit)))
    }

    pub fn add_hidden_with_init<R: Rng + ?Sized>(
        &mut self,
        inputs: Vec<UnitId>,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<UnitId, NetworkError> {
        self.check_upstream(&inputs)?;
        let weights = init.sample_vec(inputs.len(), rng).map_err(UnitError::from)?;
        let unit = HiddenUnit::with_weights(inputs, &weights)?;
        Ok(self.push(Node::Hidden(unit)))
    }

    fn push(&mut self, node: Node) -> UnitId {
        let id = UnitId::new(self.units.len());
        if let Node::Hidden(unit) = &node {
            debug!(%id, n_inputs = unit.input_count(), "added hidden unit");
        }
        self.units.push(node);
        id
    }

    fn check_upstream(&self, inputs: &[UnitId]) -> Result<(), NetworkError> {
        let next = UnitId::new(self.units.len());
        match inputs.iter().find(|id| id.index() >= self.units.len()) {
            Some(&upstream) => Err(NetworkError::ForwardReference {
                unit: next,
                upstream,
            }),
            None => Ok(()),
        }
    }

    pub fn node(&self, id: UnitId) -> Result<&Node, NetworkError> {
        self.units.get(id.index()).ok_or(NetworkError::UnknownUnit {
            id,
            len: self.units.len(),
        })
    }

    fn node_mut(&mut self, id: UnitId) -> Result<&mut Node, NetworkError> {
        let len = self.units.len();
        self.units
            .get_mut(id.index())
            .ok_or(NetworkError::UnknownUnit { id, len })
    }

    /// Cached value of any unit.
    pub fn value(&self, id: UnitId) -> Result<f64, NetworkError> {
        Ok(self.node(id)?.value())
    }

    pub fn set_input(&mut self, id: UnitId, value: f64) -> Result<(), NetworkError> {
        match self.node_mut(id)? {
            Node::Input(unit) => {
                unit.set(value);
                Ok(())
            }
            Node::Hidden(_) => Err(NetworkError::NotAnInput(id)),
        }
    }

    pub fn hidden(&self, id: UnitId) -> Result<&HiddenUnit, NetworkError> {
        match self.node(id)? {
            Node::Hidden(unit) => Ok(unit),
            Node::Input(_) => Err(NetworkError::NotHidden(id)),
        }
    }

    /// Replaces one hidden unit's weights. Its upstream ids stay as they
    /// were added, so insertion order remains a valid recompute order.
    pub fn set_weights(&mut self, id: UnitId, weights: &[f64]) -> Result<(), NetworkError> {
        Ok(self.hidden_mut(id)?.set_weights(weights)?)
    }

    /// Draws fresh weights in the default range for one hidden unit.
    pub fn randomize_unit_weights<R: Rng + ?Sized>(
        &mut self,
        id: UnitId,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        self.hidden_mut(id)?.randomize_weights(rng);
        Ok(())
    }

    fn hidden_mut(&mut self, id: UnitId) -> Result<&mut HiddenUnit, NetworkError> {
        match self.node_mut(id)? {
            Node::Hidden(unit) => Ok(unit),
            Node::Input(_) => Err(NetworkError::NotHidden(id)),
        }
    }

    pub fn input_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Input(_)))
            .map(|(i, _)| UnitId::new(i))
    }

    pub fn hidden_ids(&self) -> impl Iterator<Item = UnitId> + '_ {
        self.units
            .iter()
            .enumerate()
            .filter(|(_, node)| matches!(node, Node::Hidden(_)))
            .map(|(i, _)| UnitId::new(i))
    }

    /// Recomputes one hidden unit from the cached values of its upstream
    /// units. Upstream units are not recomputed.
    pub fn recompute(&mut self, id: UnitId) -> Result<(), NetworkError> {
        let len = self.units.len();
        if id.index() >= len {
            return Err(NetworkError::UnknownUnit { id, len });
        }
        // upstream ids are always below the unit's own id
        let (upstream, rest) = self.units.split_at_mut(id.index());
        match &mut rest[0] {
            Node::Hidden(unit) => Ok(unit.recompute(&*upstream)?),
            Node::Input(_) => Err(NetworkError::NotHidden(id)),
        }
    }

    /// Recomputes every hidden unit in insertion order.
    pub fn recompute_all(&mut self) -> Result<(), NetworkError> {
        for index in 0..self.units.len() {
            if matches!(self.units[index], Node::Hidden(_)) {
                self.recompute(UnitId::new(index))?;
            }
        }
        Ok(())
    }

    /// Draws fresh weights in the default range for every hidden unit.
    pub fn randomize_weights<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for node in self.units.iter_mut() {
            if let Node::Hidden(unit) = node {
                unit.randomize_weights(rng);
            }
        }
    }

    /// All-or-nothing: an invalid `init` leaves every unit untouched.
    pub fn randomize_weights_with<R: Rng + ?Sized>(
        &mut self,
        init: &WeightInit,
        rng: &mut R,
    ) -> Result<(), NetworkError> {
        init.validate().map_err(UnitError::from)?;
        for node in self.units.iter_mut() {
            if let Node::Hidden(unit) = node {
                unit.randomize_weights_with(init, rng)?;
            }
        }
        Ok(())
    }

    /// Writes `values` into `input_ids`, recomputes everything and reads
    /// `output_ids`. Every input id is checked before any value is written.
    pub fn evaluate(
        &mut self,
        input_ids: &[UnitId],
        values: &[f64],
        output_ids: &[UnitId],
    ) -> Result<Vec<f64>, NetworkError> {
        if input_ids.len() != values.len() {
            return Err(NetworkError::InputLengthMismatch {
                expected: input_ids.len(),
                actual: values.len(),
            });
        }
        for &id in input_ids {
            if let Node::Hidden(_) = self.node(id)? {
                return Err(NetworkError::NotAnInput(id));
            }
        }
        for (&id, &value) in input_ids.iter().zip(values) {
            self.set_input(id, value)?;
        }
        self.recompute_all()?;
        output_ids.iter().map(|&id| self.value(id)).collect()
    }

    /// [`evaluate`](Network::evaluate) for many rows in parallel. Each worker
    /// evaluates on its own clone, so `self` is left as it was.
    pub fn evaluate_batch(
        &self,
        input_ids: &[UnitId],
        rows: &[Vec<f64>],
        output_ids: &[UnitId],
    ) -> Result<Vec<Vec<f64>>, NetworkError> {
        debug!(n_rows = rows.len(), n_units = self.units.len(), "evaluating batch");
        rows.par_iter()
            .map_init(
                || self.clone(),
                |network, row| network.evaluate(input_ids, row, output_ids),
            )
            .collect()
    }
}
