//! # Operation Catalog
//!
//! The closed set of workload action kinds a benchmark client can execute,
//! plus [`OperationMap`], a dense fixed-size map with one slot per catalog
//! entry.
//!
//! Every slot of an `OperationMap` exists from construction onwards, so an
//! operation kind that never ran still has an (empty or zero) entry. Lookups
//! index a plain array by the operation's tag, which keeps the recording
//! path free of hashing.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Workload action kinds
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    /// Batch write of data points
    Ingestion,

    /// Exact timestamp lookup
    PreciseQuery,

    /// Time range scan
    RangeQuery,

    /// Time range scan filtered by value
    ValueRangeQuery,

    /// Aggregation over a time range
    AggRangeQuery,

    /// Aggregation filtered by value
    AggValueQuery,

    /// Aggregation over a time range filtered by value
    AggRangeValueQuery,

    /// Down-sampling aggregation
    GroupByQuery,

    /// Most recent point per series
    LatestPointQuery,
}

impl Operation {
    /// Number of operation kinds in the catalog
    pub const COUNT: usize = 9;

    /// All operation kinds in catalog order
    pub const ALL: [Operation; Operation::COUNT] = [
        Operation::Ingestion,
        Operation::PreciseQuery,
        Operation::RangeQuery,
        Operation::ValueRangeQuery,
        Operation::AggRangeQuery,
        Operation::AggValueQuery,
        Operation::AggRangeValueQuery,
        Operation::GroupByQuery,
        Operation::LatestPointQuery,
    ];

    /// Dense tag used to index an [`OperationMap`]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stable name used as the persistence category and table row label
    pub const fn as_str(self) -> &'static str {
        match self {
            Operation::Ingestion => "INGESTION",
            Operation::PreciseQuery => "PRECISE_POINT",
            Operation::RangeQuery => "TIME_RANGE",
            Operation::ValueRangeQuery => "VALUE_RANGE",
            Operation::AggRangeQuery => "AGG_RANGE",
            Operation::AggValueQuery => "AGG_VALUE",
            Operation::AggRangeValueQuery => "AGG_RANGE_VALUE",
            Operation::GroupByQuery => "GROUP_BY",
            Operation::LatestPointQuery => "LATEST_POINT",
        }
    }

    /// Iterate over the catalog in order
    pub fn iter() -> impl Iterator<Item = Operation> {
        Operation::ALL.into_iter()
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed-size map holding one `T` for every [`Operation`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationMap<T> {
    slots: [T; Operation::COUNT],
}

impl<T> OperationMap<T> {
    /// Build a map by evaluating `f` for every operation kind
    pub fn from_fn(mut f: impl FnMut(Operation) -> T) -> Self {
        Self {
            slots: std::array::from_fn(|i| f(Operation::ALL[i])),
        }
    }

    /// Iterate over `(operation, value)` pairs in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (Operation, &T)> {
        Operation::ALL.into_iter().zip(self.slots.iter())
    }

    /// Mutable variant of [`OperationMap::iter`]
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Operation, &mut T)> {
        Operation::ALL.into_iter().zip(self.slots.iter_mut())
    }
}

impl<T: Default> Default for OperationMap<T> {
    fn default() -> Self {
        Self::from_fn(|_| T::default())
    }
}

impl<T> Index<Operation> for OperationMap<T> {
    type Output = T;

    fn index(&self, op: Operation) -> &T {
        &self.slots[op.index()]
    }
}

impl<T> IndexMut<Operation> for OperationMap<T> {
    fn index_mut(&mut self, op: Operation) -> &mut T {
        &mut self.slots[op.index()]
    }
}
