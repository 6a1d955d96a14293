//! # relopt-core: Cost-Based Relational Optimiser Core
//!
//! This crate estimates the output statistics of relational-algebra plans and
//! rewrites canonical plans into cheaper equivalent ones.
//!
//! ## Module Overview
//!
//! - **`expr`**: Predicates, scalar literals, the serializable `LogicalPlan` tree and
//!   the arena `Operator` enum.
//! - **`stats`**: `Relation`/`Attribute` statistics and the derivation formulas used
//!   for cardinality estimation.
//! - **`catalog`**: Catalog trait for looking up base-relation statistics.
//! - **`memo`**: The plan arena. Operators are addressed by `NodeId` and their
//!   estimated outputs live in a side table keyed by the same id.
//! - **`estimator`**: Bottom-up estimation of operator outputs.
//! - **`cost`**: Cost abstraction used to rank candidate plans.
//! - **`decompose`**: Splits a canonical plan into scans, predicates and final schema.
//! - **`predicate_pushdown`**: Attaches selections to the lowest chain that can
//!   evaluate them.
//! - **`projection_pushdown`**: Narrows join operands to the attributes still needed.
//! - **`search`**: Breadth-first enumeration of left-deep join orders.
//! - **`optimiser`**: Entry points tying the phases together.

pub mod catalog;
pub mod cost;
pub mod decompose;
pub mod estimator;
pub mod expr;
pub mod memo;
pub mod optimiser;
pub mod predicate_pushdown;
pub mod projection_pushdown;
pub mod search;
pub mod stats;

pub use optimiser::{estimate_plan, optimise, OptimiseError, Optimiser, OptimiserConfig};
