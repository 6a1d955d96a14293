//! # Estimator
//!
//! Computes the output statistics of plan nodes bottom-up. Each node's output is a
//! pure function of its operator and its children's outputs; the estimator only
//! dispatches on the operator kind and delegates the arithmetic to `stats`.
//!
//! Estimating a node first estimates any child that has no output yet, so callers
//! may hand it an arbitrary unestimated subtree. Results are cached in the memo's
//! output table and never recomputed once present.

use crate::catalog::{Catalog, CatalogError};
use crate::expr::{OpKind, Operator, Predicate};
use crate::memo::{Memo, NodeId};
use crate::stats::{self, Relation};

pub struct Estimator<'a> {
    catalog: &'a dyn Catalog,
}

impl<'a> Estimator<'a> {
    pub fn new(catalog: &'a dyn Catalog) -> Self {
        Self { catalog }
    }

    /// Estimate `id` (and any unestimated descendants) and return its output.
    pub fn estimate<'m>(&self, memo: &'m mut Memo, id: NodeId) -> Result<&'m Relation, EstimateError> {
        if memo.output(id).is_none() {
            for child in memo.op(id).children() {
                self.estimate(memo, child)?;
            }
            let output = self.derive_output(memo, id)?;
            memo.set_output(id, output);
        }
        memo.output(id).ok_or(EstimateError::MissingOutput(id))
    }

    /// Compute the output of `id` from its children's stored outputs without
    /// caching it. Children must already be estimated.
    pub fn derive_output(&self, memo: &Memo, id: NodeId) -> Result<Relation, EstimateError> {
        let input = |child: NodeId| memo.output(child).ok_or(EstimateError::MissingOutput(child));

        match memo.op(id) {
            Operator::Scan { relation } => Ok(self.catalog.lookup(relation)?),
            Operator::Select { input: child, predicate } => {
                stats::derive_select_stats(input(*child)?, predicate)
            }
            Operator::Project { input: child, attributes } => {
                stats::derive_project_stats(input(*child)?, attributes)
            }
            Operator::Product { left, right } => {
                Ok(stats::derive_product_stats(input(*left)?, input(*right)?))
            }
            Operator::Join {
                left,
                right,
                predicate,
            } => stats::derive_join_stats(input(*left)?, input(*right)?, predicate),
        }
    }
}

/// Errors raised while estimating a plan.
///
/// Every variant means the plan handed to the estimator is inconsistent with the
/// catalog or with itself; none of them is recoverable by retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EstimateError {
    /// An operator references an attribute its input does not produce.
    #[error("attribute {attribute} is not in the input schema of {operator}")]
    UnknownAttribute { attribute: String, operator: OpKind },
    /// A join was given an `attribute = value` predicate.
    #[error("join predicate {0} does not compare two attributes")]
    NonEquiJoin(Predicate),
    /// A child was read before it was estimated.
    #[error("node {0} has not been estimated")]
    MissingOutput(NodeId),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
