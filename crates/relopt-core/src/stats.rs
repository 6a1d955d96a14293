//! # Statistics for Cost-Based Optimisation
//!
//! This module defines the statistics attached to every plan node and the formulas
//! used to derive a node's statistics from its children.
//!
//! ## Statistics Shape
//!
//! - **Relation-level**: the estimated tuple count `T(R)`.
//! - **Attribute-level**: the estimated number of distinct values `V(R, A)` of each
//!   attribute, kept in output order.
//!
//! ## Derivation Formulas
//!
//! All formulas assume a uniform value distribution and independence between
//! attributes. Arithmetic is integer: division truncates and a result of zero is
//! kept as-is. Products saturate at `u64::MAX`.
//!
//! - **Select `A = c`**: `T = T(R) / V(R,A)`, and `V(A) = 1`.
//! - **Select `A = B`**: `T = T(R) / max(V(R,A), V(R,B))`, and both attributes get
//!   `min(V(R,A), V(R,B))`.
//! - **Product**: `T = T(R) * T(S)`, schema is `R ++ S`.
//! - **Join `A = B`**: `T = T(R) * T(S) / max(V(R,A), V(S,B))`, and both join
//!   attributes get `min(V(R,A), V(S,B))`.
//! - **Project**: `T` unchanged, schema restricted to the listed attributes.

use crate::estimator::EstimateError;
use crate::expr::{OpKind, Predicate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A column together with its estimated distinct-value count.
///
/// Equality and hashing use the name only: two attributes with the same name are
/// the same attribute regardless of their current value counts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub name: String,
    pub value_count: u64,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value_count: u64) -> Self {
        Self {
            name: name.into(),
            value_count,
        }
    }

    /// A copy of this attribute with a different value count.
    pub fn with_value_count(&self, value_count: u64) -> Self {
        Self {
            name: self.name.clone(),
            value_count,
        }
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

/// Estimated statistics of an operator's output (or of a base relation).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relation {
    pub tuple_count: u64,
    pub attributes: Vec<Attribute>,
}

impl Relation {
    pub fn new(tuple_count: u64) -> Self {
        Self {
            tuple_count,
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value_count: u64) -> Self {
        self.attributes.push(Attribute::new(name, value_count));
        self
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    pub fn value_count(&self, name: &str) -> Option<u64> {
        self.attribute(name).map(|a| a.value_count)
    }

    pub fn attribute_names(&self) -> Vec<&str> {
        self.attributes.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn width(&self) -> usize {
        self.attributes.len()
    }

    fn require(&self, name: &str, operator: OpKind) -> Result<&Attribute, EstimateError> {
        self.attribute(name)
            .ok_or_else(|| EstimateError::UnknownAttribute {
                attribute: name.to_string(),
                operator,
            })
    }
}

/// Two relations are identical when their tuple counts match and they list the same
/// attributes, in the same order, with the same value counts.
impl PartialEq for Relation {
    fn eq(&self, other: &Self) -> bool {
        self.tuple_count == other.tuple_count
            && self.attributes.len() == other.attributes.len()
            && self
                .attributes
                .iter()
                .zip(&other.attributes)
                .all(|(a, b)| a.name == b.name && a.value_count == b.value_count)
    }
}

impl Eq for Relation {}

/// Diagnostic rendering: the tuple count followed by one line per attribute.
impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T={}", self.tuple_count)?;
        for attr in &self.attributes {
            write!(f, "\n  {}: V={}", attr.name, attr.value_count)?;
        }
        Ok(())
    }
}

/// Derive statistics for a projection onto `attributes`.
pub fn derive_project_stats(input: &Relation, attributes: &[String]) -> Result<Relation, EstimateError> {
    let mut output = Relation::new(input.tuple_count);
    for name in attributes {
        output.add_attribute(input.require(name, OpKind::Project)?.clone());
    }
    Ok(output)
}

/// Derive statistics for a selection.
///
/// For `A = c` the selectivity is `1 / V(A)` and `A` collapses to a single value.
/// For `A = B` the selectivity is `1 / max(V(A), V(B))`; after the selection both
/// attributes can only hold values present in both, hence `min(V(A), V(B))`.
pub fn derive_select_stats(input: &Relation, predicate: &Predicate) -> Result<Relation, EstimateError> {
    match predicate {
        Predicate::Value { attribute, .. } => {
            let selected = input.require(attribute, OpKind::Select)?;
            let tuple_count = input.tuple_count.checked_div(selected.value_count).unwrap_or(0);
            Ok(Relation {
                tuple_count,
                attributes: input
                    .attributes
                    .iter()
                    .map(|a| if a == selected { a.with_value_count(1) } else { a.clone() })
                    .collect(),
            })
        }
        Predicate::Attributes { left, right } => {
            let left = input.require(left, OpKind::Select)?;
            let right = input.require(right, OpKind::Select)?;
            let tuple_count = input
                .tuple_count
                .checked_div(left.value_count.max(right.value_count))
                .unwrap_or(0);
            let value_count = left.value_count.min(right.value_count);
            Ok(Relation {
                tuple_count,
                attributes: input
                    .attributes
                    .iter()
                    .map(|a| {
                        if a == left || a == right {
                            a.with_value_count(value_count)
                        } else {
                            a.clone()
                        }
                    })
                    .collect(),
            })
        }
    }
}

/// Derive statistics for a Cartesian product: `T(R) * T(S)`, schema `R ++ S`.
pub fn derive_product_stats(left: &Relation, right: &Relation) -> Relation {
    Relation {
        tuple_count: left.tuple_count.saturating_mul(right.tuple_count),
        attributes: left
            .attributes
            .iter()
            .chain(&right.attributes)
            .cloned()
            .collect(),
    }
}

/// Derive statistics for an equi-join.
///
/// ```text
/// |R JOIN S| = |R| * |S| / max(V(R,A), V(S,B))
/// ```
///
/// The predicate's left attribute must resolve in `left` and its right attribute in
/// `right`; orienting the operands is the caller's job.
pub fn derive_join_stats(
    left: &Relation,
    right: &Relation,
    predicate: &Predicate,
) -> Result<Relation, EstimateError> {
    let Predicate::Attributes {
        left: left_name,
        right: right_name,
    } = predicate
    else {
        return Err(EstimateError::NonEquiJoin(predicate.clone()));
    };

    let left_attr = left.require(left_name, OpKind::Join)?;
    let right_attr = right.require(right_name, OpKind::Join)?;
    let value_count = left_attr.value_count.min(right_attr.value_count);
    let denominator = u128::from(left_attr.value_count.max(right_attr.value_count));

    // Widen before dividing so the intermediate product cannot overflow.
    let product = u128::from(left.tuple_count) * u128::from(right.tuple_count);
    let tuple_count = product
        .checked_div(denominator)
        .map_or(0, |t| u64::try_from(t).unwrap_or(u64::MAX));

    let mut attributes = Vec::with_capacity(left.width() + right.width());
    for a in &left.attributes {
        attributes.push(if a == left_attr { a.with_value_count(value_count) } else { a.clone() });
    }
    for a in &right.attributes {
        attributes.push(if a == right_attr { a.with_value_count(value_count) } else { a.clone() });
    }

    Ok(Relation {
        tuple_count,
        attributes,
    })
}
