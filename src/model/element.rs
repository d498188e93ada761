//! Elements and per-kind operation counters.

use serde::{Deserialize, Serialize};

/// Position of an element within its owning structure: `[]` for a scalar,
/// `[i]` for an array index, `[i, j, ...]` for a tree path. Fixed for the
/// lifetime of one element.
pub type Address = Vec<i32>;

/// Which counter an applied operation bumps. A `readWrite` counts its source
/// side as a read and its target side as a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    Read,
    Write,
    Swap,
}

/// Tally of operations applied, kept per element and aggregated per
/// structure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationCounter {
    pub reads: u64,
    pub writes: u64,
    pub swaps: u64,
}

impl OperationCounter {
    pub fn count(&mut self, kind: OpKind) {
        match kind {
            OpKind::Read => self.reads += 1,
            OpKind::Write => self.writes += 1,
            OpKind::Swap => self.swaps += 1,
        }
    }

    pub fn get(&self, kind: OpKind) -> u64 {
        match kind {
            OpKind::Read => self.reads,
            OpKind::Write => self.writes,
            OpKind::Swap => self.swaps,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// One addressable numeric value plus its lifetime counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    value: f64,
    address: Address,
    counter: OperationCounter,
}

impl Element {
    pub fn new(value: f64, address: Address) -> Self {
        Self {
            value,
            address,
            counter: OperationCounter::default(),
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn address(&self) -> &[i32] {
        &self.address
    }

    pub fn counter(&self) -> &OperationCounter {
        &self.counter
    }

    pub fn count(&mut self, kind: OpKind) {
        self.counter.count(kind);
    }
}
