//! # Projection Pushdown
//!
//! Narrows join operands to the attributes the rest of the plan still needs.
//! Estimated tuple counts do not depend on width, but dropping attributes early keeps
//! intermediate schemas small and means the final plan only carries the attributes
//! its consumers asked for.
//!
//! ## Needed Attributes
//!
//! At any point in the join-order search an attribute is needed if a predicate that
//! has not been applied yet references it, or if it belongs to the final schema.
//! When the canonical plan had no top-level Project there is no final schema: every
//! attribute is part of the output and nothing may be pruned.

use crate::estimator::{EstimateError, Estimator};
use crate::expr::{Operator, Predicate};
use crate::memo::{Memo, NodeId};
use std::collections::BTreeSet;

/// Attributes still needed above the current point of the plan, or `None` when the
/// output schema is unrestricted.
pub fn needed_attributes<'p>(
    predicates: impl IntoIterator<Item = &'p Predicate>,
    final_schema: Option<&[String]>,
) -> Option<BTreeSet<String>> {
    let final_schema = final_schema?;
    let mut needed: BTreeSet<String> = final_schema.iter().cloned().collect();
    for predicate in predicates {
        needed.extend(predicate.referenced_attributes().into_iter().map(str::to_string));
    }
    Some(needed)
}

/// Put a Project over `input` keeping only the needed attributes, in schema order.
///
/// Returns `input` unchanged when nothing can be pruned or when no attribute of
/// `input` is needed at all. A Project directly above another Project replaces it
/// instead of stacking.
pub fn push_down_project(
    memo: &mut Memo,
    estimator: &Estimator<'_>,
    input: NodeId,
    needed: Option<&BTreeSet<String>>,
) -> Result<NodeId, EstimateError> {
    let Some(needed) = needed else {
        return Ok(input);
    };

    let schema = estimator.estimate(memo, input)?;
    let kept: Vec<String> = schema
        .attributes
        .iter()
        .filter(|a| needed.contains(&a.name))
        .map(|a| a.name.clone())
        .collect();

    if kept.is_empty() || kept.len() == schema.width() {
        return Ok(input);
    }

    let base = match memo.op(input) {
        Operator::Project { input: inner, .. } => *inner,
        _ => input,
    };
    let project = memo.project(base, kept);
    estimator.estimate(memo, project)?;
    Ok(project)
}
