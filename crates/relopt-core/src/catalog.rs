//! # Catalog Interface
//!
//! The catalog gives the optimiser the statistics of base relations: their tuple
//! counts and the ordered list of attributes with distinct-value counts. It is read
//! only for the duration of an optimisation.
//!
//! ## Trait Design
//!
//! `Catalog` is a minimal trait used behind `&dyn Catalog`, so the statistics can
//! come from a parsed catalogue file, a JSON request, or a test fixture. The
//! `InMemoryCatalog` is the HashMap-backed implementation used by the server and the
//! tests.
//!
//! ## Lookups
//!
//! `lookup` returns an independent copy of the stored `Relation`; the estimator is
//! free to derive new statistics from it without touching the catalog. Unknown names
//! fail with `CatalogError::NotFound`.

use crate::stats::{Attribute, Relation};
use std::collections::HashMap;

/// Catalog provides base-relation statistics.
pub trait Catalog: Send + Sync {
    fn lookup(&self, name: &str) -> Result<Relation, CatalogError>;
}

/// In-memory catalog keyed by relation name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    pub relations: HashMap<String, Relation>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relation from its tuple count and `(attribute, value count)` pairs.
    pub fn add_relation(
        &mut self,
        name: impl Into<String>,
        tuple_count: u64,
        attributes: &[(&str, u64)],
    ) -> Result<(), CatalogError> {
        let mut relation = Relation::new(tuple_count);
        for (attr, value_count) in attributes {
            relation.add_attribute(Attribute::new(*attr, *value_count));
        }
        self.insert(name, relation)
    }

    /// Register a relation, replacing any previous entry with the same name.
    ///
    /// Value counts must be positive and attribute names unique within the relation.
    pub fn insert(&mut self, name: impl Into<String>, relation: Relation) -> Result<(), CatalogError> {
        let name = name.into();
        for (i, attr) in relation.attributes.iter().enumerate() {
            if attr.value_count == 0 {
                return Err(CatalogError::InvalidStatistics {
                    relation: name,
                    attribute: attr.name.clone(),
                });
            }
            if relation.attributes[..i].contains(attr) {
                return Err(CatalogError::DuplicateAttribute {
                    relation: name,
                    attribute: attr.name.clone(),
                });
            }
        }
        self.relations.insert(name, relation);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.relations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn lookup(&self, name: &str) -> Result<Relation, CatalogError> {
        self.relations
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(name.to_string()))
    }
}

/// Errors raised by catalog lookups and registration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    /// The plan references a relation the catalog does not know.
    #[error("relation not found in catalogue: {0}")]
    NotFound(String),
    /// An attribute was registered with a zero distinct-value count.
    #[error("attribute {attribute} of relation {relation} has a zero value count")]
    InvalidStatistics { relation: String, attribute: String },
    /// An attribute name appears twice in one relation.
    #[error("attribute {attribute} appears more than once in relation {relation}")]
    DuplicateAttribute { relation: String, attribute: String },
}
