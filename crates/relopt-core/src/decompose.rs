//! # Plan Decomposition
//!
//! The first optimisation phase. A canonical plan is taken apart into the pieces
//! the later phases reassemble:
//!
//! - the distinct base relations it scans, in first-encounter (pre-order) order;
//! - every predicate it applies, from Selects and from any Joins already present;
//! - the attribute list of its outermost Project, which fixes the output schema.
//!
//! Decomposition only reads the plan; nothing is estimated or rewritten here.

use crate::expr::{LogicalPlan, Predicate};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decomposition {
    /// Distinct base relation names.
    pub scans: Vec<String>,
    /// All predicates, ordered structurally so iteration is deterministic.
    pub predicates: BTreeSet<Predicate>,
    /// Attributes of the outermost Project. `None` means the plan's full schema is
    /// its output.
    pub final_schema: Option<Vec<String>>,
}

pub fn decompose(plan: &LogicalPlan) -> Decomposition {
    let mut out = Decomposition::default();
    collect(plan, &mut out);
    out
}

fn collect(plan: &LogicalPlan, out: &mut Decomposition) {
    match plan {
        LogicalPlan::Scan { relation } => {
            if !out.scans.contains(relation) {
                out.scans.push(relation.clone());
            }
        }
        LogicalPlan::Select { input, predicate } => {
            out.predicates.insert(predicate.clone());
            collect(input, out);
        }
        LogicalPlan::Project { input, attributes } => {
            // Pre-order: the first Project reached is the outermost one.
            if out.final_schema.is_none() {
                out.final_schema = Some(attributes.clone());
            }
            collect(input, out);
        }
        LogicalPlan::Product { left, right } => {
            collect(left, out);
            collect(right, out);
        }
        LogicalPlan::Join {
            left,
            right,
            predicate,
        } => {
            out.predicates.insert(predicate.clone());
            collect(left, out);
            collect(right, out);
        }
    }
}
