//! # Predicates and Operator Types
//!
//! This module defines the plan representation used by the optimiser. It has two
//! layers:
//!
//! ## Predicates (`Predicate`)
//! Only conjunctive equality predicates are supported: `attr = literal` (a value
//! selection) and `attr = attr` (an equi-join or intra-relation equality). Predicates
//! are compared, ordered and hashed structurally so that they can be kept in ordered
//! sets and removed once a plan node consumes them.
//!
//! ## Plans (`LogicalPlan` and `Operator`)
//! `LogicalPlan` is the boxed, serializable tree handed in by a query parser and
//! handed back to the caller. Inside the optimiser, plans live in the memo arena as
//! `Operator` values whose children are `NodeId`s. Both are closed enums with the
//! same five variants, so every consumer is forced to handle every operator.

use crate::memo::NodeId;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scalar literal appearing on the right-hand side of a value predicate.
///
/// Uses `OrderedFloat` for `f64` so that predicates stay `Eq + Ord + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Utf8(String),
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{}", v.0),
            ScalarValue::Utf8(v) => write!(f, "\"{v}\""),
        }
    }
}

impl From<i64> for ScalarValue {
    fn from(v: i64) -> Self {
        ScalarValue::Int64(v)
    }
}

impl From<f64> for ScalarValue {
    fn from(v: f64) -> Self {
        ScalarValue::Float64(OrderedFloat(v))
    }
}

impl From<bool> for ScalarValue {
    fn from(v: bool) -> Self {
        ScalarValue::Bool(v)
    }
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Utf8(v.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(v: String) -> Self {
        ScalarValue::Utf8(v)
    }
}

/// An equality predicate.
///
/// Attributes are referenced by name; attribute identity is by name throughout the
/// optimiser, so a predicate never carries statistics of its own.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Predicate {
    /// `attribute = value`
    Value {
        attribute: String,
        value: ScalarValue,
    },
    /// `left = right`
    Attributes { left: String, right: String },
}

impl Predicate {
    pub fn value(attribute: impl Into<String>, value: impl Into<ScalarValue>) -> Self {
        Predicate::Value {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn attributes(left: impl Into<String>, right: impl Into<String>) -> Self {
        Predicate::Attributes {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Whether this is an `attribute = value` predicate.
    pub fn equals_value(&self) -> bool {
        matches!(self, Predicate::Value { .. })
    }

    /// The attribute written on the left of the `=`.
    pub fn left_attribute(&self) -> &str {
        match self {
            Predicate::Value { attribute, .. } => attribute,
            Predicate::Attributes { left, .. } => left,
        }
    }

    /// The attribute written on the right of the `=`, if any.
    pub fn right_attribute(&self) -> Option<&str> {
        match self {
            Predicate::Value { .. } => None,
            Predicate::Attributes { right, .. } => Some(right),
        }
    }

    /// All attribute names referenced by this predicate.
    pub fn referenced_attributes(&self) -> Vec<&str> {
        let mut names = vec![self.left_attribute()];
        names.extend(self.right_attribute());
        names
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Value { attribute, value } => write!(f, "{attribute}={value}"),
            Predicate::Attributes { left, right } => write!(f, "{left}={right}"),
        }
    }
}

/// A relational-algebra plan as a boxed tree.
///
/// This is the form produced by an external query parser (the canonical plan) and
/// the form returned to callers after optimisation. It carries no statistics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum LogicalPlan {
    /// Reads a base relation from the catalogue. Always a leaf.
    Scan { relation: String },
    /// Keeps the input tuples satisfying `predicate`.
    Select {
        input: Box<LogicalPlan>,
        predicate: Predicate,
    },
    /// Restricts the input to the listed attributes, in list order. No duplicate
    /// elimination.
    Project {
        input: Box<LogicalPlan>,
        attributes: Vec<String>,
    },
    /// Cartesian product.
    Product {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
    },
    /// Equi-join. The predicate's left attribute belongs to `left`, its right
    /// attribute to `right`.
    Join {
        left: Box<LogicalPlan>,
        right: Box<LogicalPlan>,
        predicate: Predicate,
    },
}

impl LogicalPlan {
    pub fn scan(relation: impl Into<String>) -> Self {
        LogicalPlan::Scan {
            relation: relation.into(),
        }
    }

    pub fn select(self, predicate: Predicate) -> Self {
        LogicalPlan::Select {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project<S: Into<String>>(self, attributes: impl IntoIterator<Item = S>) -> Self {
        LogicalPlan::Project {
            input: Box::new(self),
            attributes: attributes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn product(self, right: LogicalPlan) -> Self {
        LogicalPlan::Product {
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn join(self, right: LogicalPlan, predicate: Predicate) -> Self {
        LogicalPlan::Join {
            left: Box::new(self),
            right: Box::new(right),
            predicate,
        }
    }
}

/// Compact algebra notation, e.g. `PROJECT[eid,dname]((SCAN(Emp)) JOIN[dept=did] (SCAN(Dept)))`.
impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalPlan::Scan { relation } => write!(f, "SCAN({relation})"),
            LogicalPlan::Select { input, predicate } => write!(f, "SELECT[{predicate}]({input})"),
            LogicalPlan::Project { input, attributes } => {
                write!(f, "PROJECT[{}]({input})", attributes.join(","))
            }
            LogicalPlan::Product { left, right } => write!(f, "({left}) TIMES ({right})"),
            LogicalPlan::Join {
                left,
                right,
                predicate,
            } => write!(f, "({left}) JOIN[{predicate}] ({right})"),
        }
    }
}

/// An operator stored in the memo arena. Children are referenced by `NodeId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    Scan {
        relation: String,
    },
    Select {
        input: NodeId,
        predicate: Predicate,
    },
    Project {
        input: NodeId,
        attributes: Vec<String>,
    },
    Product {
        left: NodeId,
        right: NodeId,
    },
    Join {
        left: NodeId,
        right: NodeId,
        predicate: Predicate,
    },
}

impl Operator {
    pub fn kind(&self) -> OpKind {
        match self {
            Operator::Scan { .. } => OpKind::Scan,
            Operator::Select { .. } => OpKind::Select,
            Operator::Project { .. } => OpKind::Project,
            Operator::Product { .. } => OpKind::Product,
            Operator::Join { .. } => OpKind::Join,
        }
    }

    pub fn children(&self) -> Vec<NodeId> {
        match self {
            Operator::Scan { .. } => vec![],
            Operator::Select { input, .. } | Operator::Project { input, .. } => vec![*input],
            Operator::Product { left, right } | Operator::Join { left, right, .. } => {
                vec![*left, *right]
            }
        }
    }
}

/// Kind discriminant for operators (without data).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Scan,
    Select,
    Project,
    Product,
    Join,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::Scan => "SCAN",
            OpKind::Select => "SELECT",
            OpKind::Project => "PROJECT",
            OpKind::Product => "TIMES",
            OpKind::Join => "JOIN",
        };
        f.write_str(name)
    }
}
