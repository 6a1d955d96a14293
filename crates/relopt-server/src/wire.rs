//! # JSON Wire Protocol
//!
//! Request and response bodies for the estimation and optimisation endpoints.
//!
//! A request carries the catalogue inline, so the server holds no relation
//! statistics of its own:
//!
//! ```json
//! {
//!   "catalog": [
//!     {"name": "Emp", "tupleCount": 100,
//!      "attributes": [{"name": "eid", "valueCount": 100}, {"name": "dept", "valueCount": 10}]}
//!   ],
//!   "plan": {"op": "select", "predicate": {"kind": "value", "attribute": "eid", "value": 5},
//!            "input": {"op": "scan", "relation": "Emp"}}
//! }
//! ```

use serde::{Deserialize, Serialize};

use relopt_core::catalog::{CatalogError, InMemoryCatalog};
use relopt_core::expr::{LogicalPlan, Predicate};
use relopt_core::stats::Relation;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Body of `POST /estimate` and `POST /optimise`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub catalog: Vec<RelationInfo>,
    pub plan: LogicalPlan,
}

/// Statistics of one base relation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationInfo {
    pub name: String,
    pub tuple_count: u64,
    #[serde(default)]
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeInfo {
    pub name: String,
    /// Number of distinct values. Must be positive.
    pub value_count: u64,
}

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("relation {0} is listed more than once in the catalogue")]
    DuplicateRelation(String),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Build an in-memory catalogue from the relations listed in a request.
pub fn build_catalog(relations: &[RelationInfo]) -> Result<InMemoryCatalog, WireError> {
    let mut catalog = InMemoryCatalog::new();
    for info in relations {
        if catalog.relations.contains_key(&info.name) {
            return Err(WireError::DuplicateRelation(info.name.clone()));
        }
        let attributes: Vec<(&str, u64)> = info
            .attributes
            .iter()
            .map(|a| (a.name.as_str(), a.value_count))
            .collect();
        catalog.add_relation(info.name.clone(), info.tuple_count, &attributes)?;
    }
    Ok(catalog)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Body returned by `POST /estimate`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// Estimated output of the plan's root.
    pub relation: Relation,
    /// Indented tree with per-node statistics.
    pub rendered: String,
}

/// Body returned by `POST /optimise`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimiseResponse {
    pub plan: LogicalPlan,
    pub relation: Relation,
    pub rendered: String,
    /// Predicates the rewritten plan could not apply.
    pub unenforced: Vec<Predicate>,
    pub cost: u64,
    pub candidates: usize,
}
