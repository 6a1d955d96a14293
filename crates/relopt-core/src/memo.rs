//! # Plan Memo
//!
//! The memo is the arena every plan lives in while it is being estimated and
//! rewritten. It has two parallel tables:
//!
//! - `nodes`: the operators, addressed by `NodeId`. Children are referenced by id.
//! - `outputs`: the estimated output `Relation` of each node, filled in by the
//!   estimator. An entry is written once; re-deriving it from unchanged children
//!   gives the same relation.
//!
//! ## Deduplication
//!
//! Adding an operator that is structurally identical to an existing one returns the
//! existing id. The join-order search builds the same projections and joins from
//! many search states, and deduplication lets all of them share one node and one
//! cached estimate. Because outputs are pure functions of the children, sharing a
//! sub-plan between candidate plans is safe: extracting any root still yields a tree.

use crate::expr::{LogicalPlan, Operator, Predicate};
use crate::stats::Relation;
use std::collections::HashMap;

/// Identifier of a node in the memo.
pub type NodeId = u32;

#[derive(Debug, Clone, Default)]
pub struct Memo {
    nodes: Vec<Operator>,
    outputs: Vec<Option<Relation>>,
    index: HashMap<Operator, NodeId>,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operator, returning the id of an identical existing node if present.
    pub fn add(&mut self, op: Operator) -> NodeId {
        if let Some(&id) = self.index.get(&op) {
            return id;
        }
        debug_assert!(
            op.children().iter().all(|&c| (c as usize) < self.nodes.len()),
            "children must be added before their parent"
        );
        let id = self.nodes.len() as NodeId;
        self.index.insert(op.clone(), id);
        self.nodes.push(op);
        self.outputs.push(None);
        id
    }

    pub fn scan(&mut self, relation: impl Into<String>) -> NodeId {
        self.add(Operator::Scan {
            relation: relation.into(),
        })
    }

    pub fn select(&mut self, input: NodeId, predicate: Predicate) -> NodeId {
        self.add(Operator::Select { input, predicate })
    }

    pub fn project(&mut self, input: NodeId, attributes: Vec<String>) -> NodeId {
        self.add(Operator::Project { input, attributes })
    }

    pub fn product(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.add(Operator::Product { left, right })
    }

    pub fn join(&mut self, left: NodeId, right: NodeId, predicate: Predicate) -> NodeId {
        self.add(Operator::Join {
            left,
            right,
            predicate,
        })
    }

    pub fn op(&self, id: NodeId) -> &Operator {
        &self.nodes[id as usize]
    }

    /// The estimated output of a node, if it has been estimated.
    pub fn output(&self, id: NodeId) -> Option<&Relation> {
        self.outputs[id as usize].as_ref()
    }

    pub(crate) fn set_output(&mut self, id: NodeId, output: Relation) {
        self.outputs[id as usize] = Some(output);
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Copy a boxed plan tree into the memo, returning the id of its root.
    pub fn insert_plan(&mut self, plan: &LogicalPlan) -> NodeId {
        match plan {
            LogicalPlan::Scan { relation } => self.scan(relation.clone()),
            LogicalPlan::Select { input, predicate } => {
                let input = self.insert_plan(input);
                self.select(input, predicate.clone())
            }
            LogicalPlan::Project { input, attributes } => {
                let input = self.insert_plan(input);
                self.project(input, attributes.clone())
            }
            LogicalPlan::Product { left, right } => {
                let left = self.insert_plan(left);
                let right = self.insert_plan(right);
                self.product(left, right)
            }
            LogicalPlan::Join {
                left,
                right,
                predicate,
            } => {
                let left = self.insert_plan(left);
                let right = self.insert_plan(right);
                self.join(left, right, predicate.clone())
            }
        }
    }

    /// Extract the tree rooted at `id` as a boxed plan.
    pub fn extract_plan(&self, id: NodeId) -> LogicalPlan {
        match self.op(id) {
            Operator::Scan { relation } => LogicalPlan::scan(relation.clone()),
            Operator::Select { input, predicate } => {
                self.extract_plan(*input).select(predicate.clone())
            }
            Operator::Project { input, attributes } => {
                self.extract_plan(*input).project(attributes.iter().cloned())
            }
            Operator::Product { left, right } => {
                self.extract_plan(*left).product(self.extract_plan(*right))
            }
            Operator::Join {
                left,
                right,
                predicate,
            } => self
                .extract_plan(*left)
                .join(self.extract_plan(*right), predicate.clone()),
        }
    }

    /// Render the tree rooted at `id`, one operator per line, with its estimated
    /// tuple count and attribute value counts when available.
    pub fn display(&self, id: NodeId, indent: usize) -> String {
        let mut out = String::new();
        self.write_node(&mut out, id, indent);
        out
    }

    fn write_node(&self, out: &mut String, id: NodeId, indent: usize) {
        let pad = "  ".repeat(indent);
        let op = self.op(id);
        let label = match op {
            Operator::Scan { relation } => format!("{}({relation})", op.kind()),
            Operator::Select { predicate, .. } | Operator::Join { predicate, .. } => {
                format!("{}[{predicate}]", op.kind())
            }
            Operator::Project { attributes, .. } => {
                format!("{}[{}]", op.kind(), attributes.join(","))
            }
            Operator::Product { .. } => op.kind().to_string(),
        };
        out.push_str(&format!("{pad}{label}"));
        if let Some(rel) = self.output(id) {
            let attrs: Vec<String> = rel
                .attributes
                .iter()
                .map(|a| format!("{}={}", a.name, a.value_count))
                .collect();
            out.push_str(&format!("  T={} V{{{}}}", rel.tuple_count, attrs.join(", ")));
        }
        out.push('\n');
        for child in op.children() {
            self.write_node(out, child, indent + 1);
        }
    }
}
