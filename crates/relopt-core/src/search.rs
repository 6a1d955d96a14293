//! # Join-Order Search
//!
//! Breadth-first enumeration of left-deep join orders over the per-relation chains
//! produced by predicate pushdown, with projection pushdown interleaved at every
//! step.
//!
//! ## Search State
//!
//! A state is the plan built so far (`left`, absent at the start), the chains not yet
//! combined into it, and the predicates not yet applied. Expanding a state picks each
//! remaining chain in turn:
//!
//! 1. **No left yet**: the chain, narrowed to the needed attributes, becomes the left.
//! 2. **Otherwise**: both operands are narrowed, and the first remaining predicate
//!    with one attribute on each side turns them into a Join. The operands are
//!    swapped if needed so that the Join's left child holds the predicate's left
//!    attribute. With no such predicate the operands form a Product. Any remaining
//!    predicate the combined schema can now evaluate on its own is attached as a
//!    Select above it.
//!
//! A state with no remaining chains is a complete candidate. The cheapest candidate
//! wins; among equal costs the first one found is kept.
//!
//! ## Complexity
//!
//! The search visits every permutation of the chains, so it is factorial in the
//! number of base relations. The memo deduplicates operators, so identical
//! projections and joins reached from different states are built and estimated once.

use crate::cost::{Cost, CostModel};
use crate::estimator::{EstimateError, Estimator};
use crate::expr::Predicate;
use crate::memo::{Memo, NodeId};
use crate::predicate_pushdown::attach_selects;
use crate::projection_pushdown::{needed_attributes, push_down_project};
use crate::stats::Relation;
use std::collections::{BTreeSet, VecDeque};
use tracing::{debug, trace};

#[derive(Debug, Clone)]
struct SearchState {
    left: Option<NodeId>,
    remaining: Vec<NodeId>,
    predicates: BTreeSet<Predicate>,
}

/// The cheapest complete plan found by the search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    pub root: NodeId,
    pub cost: Cost,
    /// Predicates the winning plan never applied.
    pub unapplied: BTreeSet<Predicate>,
    /// Number of complete plans compared.
    pub candidates: usize,
}

pub struct JoinOrderSearch<'a> {
    estimator: &'a Estimator<'a>,
    cost_model: &'a dyn CostModel,
    final_schema: Option<&'a [String]>,
}

impl<'a> JoinOrderSearch<'a> {
    pub fn new(
        estimator: &'a Estimator<'a>,
        cost_model: &'a dyn CostModel,
        final_schema: Option<&'a [String]>,
    ) -> Self {
        Self {
            estimator,
            cost_model,
            final_schema,
        }
    }

    /// Search all left-deep orders of `chains`. Returns `None` only when `chains`
    /// is empty.
    pub fn run(
        &self,
        memo: &mut Memo,
        chains: Vec<NodeId>,
        predicates: BTreeSet<Predicate>,
    ) -> Result<Option<SearchOutcome>, EstimateError> {
        debug!(
            "Starting join-order search: chains={}, predicates={}",
            chains.len(),
            predicates.len()
        );

        let mut queue = VecDeque::new();
        queue.push_back(SearchState {
            left: None,
            remaining: chains,
            predicates,
        });

        let mut best: Option<SearchOutcome> = None;
        let mut candidates = 0;
        let mut expanded = 0usize;

        while let Some(state) = queue.pop_front() {
            if state.remaining.is_empty() {
                let Some(root) = state.left else {
                    continue;
                };
                candidates += 1;
                let cost = self.cost_of(memo, root)?;
                trace!("Candidate plan {} with cost {:?}", root, cost);
                if best.as_ref().map_or(true, |b| cost < b.cost) {
                    best = Some(SearchOutcome {
                        root,
                        cost,
                        unapplied: state.predicates,
                        candidates: 0,
                    });
                }
                continue;
            }

            expanded += 1;
            let needed = needed_attributes(&state.predicates, self.final_schema);

            for (i, &chain) in state.remaining.iter().enumerate() {
                let mut remaining = state.remaining.clone();
                remaining.remove(i);

                let next = match state.left {
                    None => {
                        let left = push_down_project(memo, self.estimator, chain, needed.as_ref())?;
                        SearchState {
                            left: Some(left),
                            remaining,
                            predicates: state.predicates.clone(),
                        }
                    }
                    Some(left) => {
                        let (node, predicates) =
                            self.combine(memo, left, chain, &state.predicates, needed.as_ref())?;
                        SearchState {
                            left: Some(node),
                            remaining,
                            predicates,
                        }
                    }
                };
                trace!(
                    "Enqueued state: left={:?}, remaining={}, predicates={}",
                    next.left,
                    next.remaining.len(),
                    next.predicates.len()
                );
                queue.push_back(next);
            }
        }

        if let Some(ref mut outcome) = best {
            outcome.candidates = candidates;
            debug!(
                "Join-order search complete: cost={:?}, candidates={}, expanded states={}",
                outcome.cost, candidates, expanded
            );
        }
        Ok(best)
    }

    /// Combine the plan built so far with one more chain.
    fn combine(
        &self,
        memo: &mut Memo,
        left: NodeId,
        right: NodeId,
        predicates: &BTreeSet<Predicate>,
        needed: Option<&BTreeSet<String>>,
    ) -> Result<(NodeId, BTreeSet<Predicate>), EstimateError> {
        let left = push_down_project(memo, self.estimator, left, needed)?;
        let right = push_down_project(memo, self.estimator, right, needed)?;

        let left_schema = self.estimator.estimate(memo, left)?.clone();
        let right_schema = self.estimator.estimate(memo, right)?.clone();

        let mut remaining = predicates.clone();
        let join_predicate = predicates
            .iter()
            .find(|p| spans(p, &left_schema, &right_schema))
            .cloned();

        let node = match join_predicate {
            Some(predicate) => {
                remaining.remove(&predicate);
                if left_schema.contains(predicate.left_attribute()) {
                    memo.join(left, right, predicate)
                } else {
                    memo.join(right, left, predicate)
                }
            }
            None => memo.product(left, right),
        };
        self.estimator.estimate(memo, node)?;

        let node = attach_selects(memo, self.estimator, node, &mut remaining)?;
        Ok((node, remaining))
    }

    fn cost_of(&self, memo: &mut Memo, root: NodeId) -> Result<Cost, EstimateError> {
        let output = self.estimator.estimate(memo, root)?;
        Ok(self.cost_model.compute_cost(output))
    }
}

/// Whether `predicate` compares an attribute of `left` with an attribute of `right`,
/// in either orientation.
fn spans(predicate: &Predicate, left: &Relation, right: &Relation) -> bool {
    let Predicate::Attributes { left: a, right: b } = predicate else {
        return false;
    };
    (left.contains(a) && right.contains(b)) || (left.contains(b) && right.contains(a))
}
