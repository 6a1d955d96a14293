//! # Optimiser
//!
//! Entry points that run the rewrite phases in order over a fresh memo:
//!
//! 1. `decompose` the canonical plan into scans, predicates and final schema.
//! 2. Push single-relation predicates onto their scans.
//! 3. Search left-deep join orders with projection pushdown interleaved.
//! 4. Restore the final schema above the winner unless it already matches.
//!
//! Each phase takes its inputs and returns its outputs; the `Optimiser` itself holds
//! only read-only configuration.

use crate::catalog::Catalog;
use crate::cost::{Cost, CostModel, TupleCountCostModel};
use crate::decompose::decompose;
use crate::estimator::{EstimateError, Estimator};
use crate::expr::{LogicalPlan, Operator, Predicate};
use crate::memo::{Memo, NodeId};
use crate::predicate_pushdown::push_down_predicates;
use crate::search::JoinOrderSearch;
use crate::stats::Relation;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Limits applied before the search starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OptimiserConfig {
    /// Largest number of distinct base relations a plan may scan. The search visits
    /// every permutation of them.
    pub max_relations: usize,
}

impl Default for OptimiserConfig {
    fn default() -> Self {
        Self { max_relations: 8 }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptimiseError {
    #[error(transparent)]
    Estimate(#[from] EstimateError),
    #[error("plan scans {count} relations, more than the configured maximum of {max}")]
    TooManyRelations { count: usize, max: usize },
    #[error("plan produced no candidate")]
    EmptyPlan,
}

/// A rewritten plan together with the memo holding its estimates.
#[derive(Debug, Clone)]
pub struct OptimisedPlan {
    pub memo: Memo,
    pub root: NodeId,
    pub cost: Cost,
    /// Estimated output of `root`.
    pub relation: Relation,
    /// Predicates of the input plan that the rewritten plan does not apply because
    /// no subtree ever produced all of their attributes.
    pub unenforced: Vec<Predicate>,
    /// Number of complete join orders compared.
    pub candidates: usize,
}

impl OptimisedPlan {
    pub fn plan(&self) -> LogicalPlan {
        self.memo.extract_plan(self.root)
    }

    pub fn display(&self) -> String {
        self.memo.display(self.root, 0)
    }
}

/// A canonical plan annotated with estimates, without any rewriting.
#[derive(Debug, Clone)]
pub struct EstimatedPlan {
    pub memo: Memo,
    pub root: NodeId,
    pub relation: Relation,
}

impl EstimatedPlan {
    pub fn display(&self) -> String {
        self.memo.display(self.root, 0)
    }
}

pub struct Optimiser<'a> {
    catalog: &'a dyn Catalog,
    cost_model: Box<dyn CostModel + 'a>,
    config: OptimiserConfig,
}

impl<'a> Optimiser<'a> {
    pub fn new(catalog: &'a dyn Catalog, config: OptimiserConfig) -> Self {
        Self {
            catalog,
            cost_model: Box::new(TupleCountCostModel),
            config,
        }
    }

    pub fn with_cost_model(mut self, cost_model: impl CostModel + 'a) -> Self {
        self.cost_model = Box::new(cost_model);
        self
    }

    pub fn optimise(&self, plan: &LogicalPlan) -> Result<OptimisedPlan, OptimiseError> {
        let decomposition = decompose(plan);
        debug!(
            "Decomposed plan: scans={:?}, predicates={}, final_schema={:?}",
            decomposition.scans,
            decomposition.predicates.len(),
            decomposition.final_schema
        );

        let count = decomposition.scans.len();
        if count > self.config.max_relations {
            return Err(OptimiseError::TooManyRelations {
                count,
                max: self.config.max_relations,
            });
        }

        let estimator = Estimator::new(self.catalog);
        let mut memo = Memo::new();

        let pushed = push_down_predicates(
            &mut memo,
            &estimator,
            &decomposition.scans,
            decomposition.predicates,
        )?;
        debug!(
            "Predicate pushdown complete: chains={}, residual={}",
            pushed.chains.len(),
            pushed.residual.len()
        );

        let final_schema = decomposition.final_schema.as_deref();
        let search = JoinOrderSearch::new(&estimator, self.cost_model.as_ref(), final_schema);
        let outcome = search
            .run(&mut memo, pushed.chains, pushed.residual)?
            .ok_or(OptimiseError::EmptyPlan)?;

        let mut root = outcome.root;
        if let Some(schema) = final_schema {
            let schema_matches = estimator
                .estimate(&mut memo, root)?
                .attribute_names()
                .iter()
                .copied()
                .eq(schema.iter().map(String::as_str));
            if !schema_matches {
                let base = match memo.op(root) {
                    Operator::Project { input, .. } => *input,
                    _ => root,
                };
                root = memo.project(base, schema.to_vec());
            }
        }

        let relation = estimator.estimate(&mut memo, root)?.clone();
        let cost = self.cost_model.compute_cost(&relation);

        let unenforced: Vec<Predicate> = outcome.unapplied.into_iter().collect();
        for predicate in &unenforced {
            warn!("Predicate [{}] never came into scope and was dropped", predicate);
        }

        debug!(
            "Optimisation complete: cost={:?}, candidates={}, memo nodes={}",
            cost,
            outcome.candidates,
            memo.num_nodes()
        );

        Ok(OptimisedPlan {
            memo,
            root,
            cost,
            relation,
            unenforced,
            candidates: outcome.candidates,
        })
    }
}

/// Optimise `plan` against `catalog`.
pub fn optimise(
    catalog: &dyn Catalog,
    plan: &LogicalPlan,
    config: &OptimiserConfig,
) -> Result<OptimisedPlan, OptimiseError> {
    Optimiser::new(catalog, config.clone()).optimise(plan)
}

/// Estimate every node of `plan` as written.
pub fn estimate_plan(catalog: &dyn Catalog, plan: &LogicalPlan) -> Result<EstimatedPlan, OptimiseError> {
    let estimator = Estimator::new(catalog);
    let mut memo = Memo::new();
    let root = memo.insert_plan(plan);
    let relation = estimator.estimate(&mut memo, root)?.clone();
    Ok(EstimatedPlan { memo, root, relation })
}
