//! # Cost Model
//!
//! Candidate plans are compared by a single `Cost` value derived from the estimated
//! output of their root. The default model is the estimated output tuple count:
//! smaller intermediate and final results mean less work for every operator above.
//!
//! The `CostModel` trait lets the search be driven by a different measure (for
//! example one that also weighs schema width) without touching the search itself.

use crate::stats::Relation;
use serde::{Deserialize, Serialize};

/// Estimated expense of a plan. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cost(pub u64);

/// Trait for pluggable cost models.
pub trait CostModel: Send + Sync {
    fn compute_cost(&self, output: &Relation) -> Cost;
}

/// Costs a plan by the tuple count of its output.
#[derive(Debug, Clone, Copy, Default)]
pub struct TupleCountCostModel;

impl CostModel for TupleCountCostModel {
    fn compute_cost(&self, output: &Relation) -> Cost {
        Cost(output.tuple_count)
    }
}
