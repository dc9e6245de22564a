use std::fmt;

/// Index of a unit inside whatever owns it (usually a [`Network`](crate::network::Network)).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(usize);

impl UnitId {
    pub fn new(index: usize) -> Self {
        UnitId(index)
    }
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for UnitId {
    fn from(index: usize) -> Self {
        UnitId(index)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// Anything that produces a scalar value for downstream units.
pub trait Unit {
    /// The cached value. Never triggers a recompute.
    fn value(&self) -> f64;
}

/// Resolves upstream ids to units.
pub trait UnitLookup {
    fn unit(&self, id: UnitId) -> Option<&dyn Unit>;
}

impl<U: Unit> UnitLookup for [U] {
    fn unit(&self, id: UnitId) -> Option<&dyn Unit> {
        self.get(id.index()).map(|u| u as &dyn Unit)
    }
}

impl<U: Unit> UnitLookup for Vec<U> {
    fn unit(&self, id: UnitId) -> Option<&dyn Unit> {
        self.as_slice().unit(id)
    }
}

/// A unit whose value is written by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct InputUnit {
    value: f64,
}

impl InputUnit {
    pub fn new(value: f64) -> Self {
        InputUnit { value }
    }
    pub fn set(&mut self, value: f64) {
        self.value = value;
    }
}

impl Unit for InputUnit {
    fn value(&self) -> f64 {
        self.value
    }
}
