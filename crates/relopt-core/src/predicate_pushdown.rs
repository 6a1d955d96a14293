//! # Predicate Pushdown
//!
//! Selections are cheapest when they run directly above the scan they filter: every
//! operator above them then sees fewer tuples. This phase builds one chain per base
//! relation and wraps it in a Select for every pending predicate the chain can
//! evaluate on its own.
//!
//! ## Scope Rule
//!
//! - `A = c` attaches to a chain whose schema contains `A`.
//! - `A = B` attaches only when the chain's schema contains both `A` and `B`.
//!
//! Each predicate is consumed by the first chain (in scan order) that can evaluate
//! it and is then removed from the pending set. Whatever remains afterwards spans
//! more than one relation (or names an attribute nothing produces) and is left for
//! the join-order search.
//!
//! The same attach step is reused by the search after every join, so a predicate
//! becomes a Select as soon as one subtree can evaluate it.

use crate::estimator::{EstimateError, Estimator};
use crate::expr::Predicate;
use crate::memo::{Memo, NodeId};
use crate::stats::Relation;
use std::collections::BTreeSet;
use tracing::trace;

/// Output of predicate pushdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushdownResult {
    /// One estimated operator chain per base relation, in scan order.
    pub chains: Vec<NodeId>,
    /// Predicates no single chain could evaluate.
    pub residual: BTreeSet<Predicate>,
}

/// Build a chain for each scan and push every single-relation predicate onto it.
pub fn push_down_predicates(
    memo: &mut Memo,
    estimator: &Estimator<'_>,
    scans: &[String],
    predicates: BTreeSet<Predicate>,
) -> Result<PushdownResult, EstimateError> {
    let mut pending = predicates;
    let mut chains = Vec::with_capacity(scans.len());

    for relation in scans {
        let scan = memo.scan(relation.clone());
        let chain = attach_selects(memo, estimator, scan, &mut pending)?;
        chains.push(chain);
    }

    Ok(PushdownResult {
        chains,
        residual: pending,
    })
}

/// Wrap `node` in a Select for every pending predicate its schema can evaluate,
/// repeating until no further predicate applies. Consumed predicates are removed
/// from `pending`.
pub fn attach_selects(
    memo: &mut Memo,
    estimator: &Estimator<'_>,
    mut node: NodeId,
    pending: &mut BTreeSet<Predicate>,
) -> Result<NodeId, EstimateError> {
    loop {
        let schema = estimator.estimate(memo, node)?;
        let applicable: Vec<Predicate> = pending
            .iter()
            .filter(|p| in_scope(p, schema))
            .cloned()
            .collect();

        if applicable.is_empty() {
            return Ok(node);
        }

        for predicate in applicable {
            pending.remove(&predicate);
            trace!("Attaching select [{}] above node {}", predicate, node);
            node = memo.select(node, predicate);
            estimator.estimate(memo, node)?;
        }
    }
}

/// Whether every attribute `predicate` references is produced by `relation`.
pub fn in_scope(predicate: &Predicate, relation: &Relation) -> bool {
    predicate
        .referenced_attributes()
        .into_iter()
        .all(|name| relation.contains(name))
}
