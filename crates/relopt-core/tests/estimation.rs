//! End-to-end estimation tests over a small employee/department catalog.
//!
//! Canonical plans are estimated as written (no rewriting) and the per-node
//! statistics are checked against the textbook formulas:
//!
//! - `Emp`:  T=100, V(eid)=100, V(dept)=10
//! - `Dept`: T=10,  V(did)=10,  V(dname)=10

use relopt_core::catalog::{Catalog, InMemoryCatalog};
use relopt_core::estimate_plan;
use relopt_core::estimator::Estimator;
use relopt_core::expr::{LogicalPlan, Predicate};
use relopt_core::memo::Memo;

fn catalog() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    catalog
        .add_relation("Emp", 100, &[("eid", 100), ("dept", 10)])
        .unwrap();
    catalog
        .add_relation("Dept", 10, &[("did", 10), ("dname", 10)])
        .unwrap();
    catalog
}

#[test]
fn select_on_key_leaves_one_tuple() {
    let catalog = catalog();
    let plan = LogicalPlan::scan("Emp").select(Predicate::value("eid", 5));
    let estimated = estimate_plan(&catalog, &plan).unwrap();

    assert_eq!(estimated.relation.tuple_count, 1);
    assert_eq!(estimated.relation.value_count("eid"), Some(1));
    assert_eq!(estimated.relation.value_count("dept"), Some(10));
}

#[test]
fn equi_join_estimate() {
    let catalog = catalog();
    let plan = LogicalPlan::scan("Emp")
        .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"));
    let estimated = estimate_plan(&catalog, &plan).unwrap();

    let out = &estimated.relation;
    assert_eq!(out.tuple_count, 100);
    assert_eq!(out.value_count("dept"), Some(10));
    assert_eq!(out.value_count("did"), Some(10));
    assert_eq!(out.value_count("eid"), Some(100));
    assert_eq!(out.attribute_names(), vec!["eid", "dept", "did", "dname"]);
}

#[test]
fn product_then_select_matches_join() {
    let catalog = catalog();
    let product = LogicalPlan::scan("Emp").product(LogicalPlan::scan("Dept"));
    let canonical = product.clone().select(Predicate::attributes("dept", "did"));

    let product_out = estimate_plan(&catalog, &product).unwrap();
    assert_eq!(product_out.relation.tuple_count, 1000);

    let selected = estimate_plan(&catalog, &canonical).unwrap();
    assert_eq!(selected.relation.tuple_count, 100);
    assert_eq!(selected.relation.value_count("dept"), Some(10));
}

#[test]
fn projection_keeps_cardinality() {
    let catalog = catalog();
    let plan = LogicalPlan::scan("Emp")
        .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"))
        .project(["eid", "dname"]);
    let estimated = estimate_plan(&catalog, &plan).unwrap();

    assert_eq!(estimated.relation.tuple_count, 100);
    assert_eq!(estimated.relation.attribute_names(), vec!["eid", "dname"]);
    assert_eq!(
        estimated.relation.to_string(),
        "T=100\n  eid: V=100\n  dname: V=10"
    );
}

#[test]
fn rendering_annotates_every_node() {
    let catalog = catalog();
    let plan = LogicalPlan::scan("Emp")
        .product(LogicalPlan::scan("Dept"))
        .select(Predicate::attributes("dept", "did"));
    let estimated = estimate_plan(&catalog, &plan).unwrap();

    let rendered = estimated.display();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "SELECT[dept=did]  T=100 V{eid=100, dept=10, did=10, dname=10}"
    );
    assert_eq!(lines[1], "  TIMES  T=1000 V{eid=100, dept=10, did=10, dname=10}");
    assert_eq!(lines[2], "    SCAN(Emp)  T=100 V{eid=100, dept=10}");
    assert_eq!(lines[3], "    SCAN(Dept)  T=10 V{did=10, dname=10}");
}

#[test]
fn estimating_twice_gives_the_same_statistics() {
    let catalog = catalog();
    let estimator = Estimator::new(&catalog);
    let mut memo = Memo::new();
    let plan = LogicalPlan::scan("Emp")
        .select(Predicate::value("eid", 5))
        .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"));
    let root = memo.insert_plan(&plan);

    let first = estimator.estimate(&mut memo, root).unwrap().clone();
    let second = estimator.derive_output(&memo, root).unwrap();
    assert_eq!(first, second);

    // Estimating never writes back into the catalog.
    assert_eq!(catalog.lookup("Emp").unwrap().value_count("eid"), Some(100));
}

#[test]
fn unknown_relation_is_an_error() {
    let catalog = catalog();
    let plan = LogicalPlan::scan("Emp").product(LogicalPlan::scan("Salary"));
    let err = estimate_plan(&catalog, &plan).unwrap_err();
    assert_eq!(err.to_string(), "relation not found in catalogue: Salary");
}
