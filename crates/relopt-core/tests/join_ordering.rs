//! End-to-end optimisation tests.
//!
//! Canonical plans (selections over a product of every base relation, under one
//! projection) are rewritten by the optimiser and checked for:
//!
//! - the expected shape: products replaced by joins, selections and projections
//!   pushed below the joins;
//! - schema equivalence with the canonical plan;
//! - optimality against hand-built left-deep alternatives;
//! - the reporting of predicates that can never be applied.

use relopt_core::catalog::InMemoryCatalog;
use relopt_core::expr::{LogicalPlan, Predicate};
use relopt_core::{estimate_plan, optimise, OptimiseError, OptimiserConfig};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn emp_dept() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    catalog
        .add_relation("Emp", 100, &[("eid", 100), ("dept", 10)])
        .unwrap();
    catalog
        .add_relation("Dept", 10, &[("did", 10), ("dname", 10)])
        .unwrap();
    catalog
}

/// Emp -> Dept -> City chain with a filter on the far end.
fn chain() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    catalog
        .add_relation("Emp", 1000, &[("eid", 1000), ("dept", 50)])
        .unwrap();
    catalog
        .add_relation("Dept", 50, &[("did", 50), ("city", 20)])
        .unwrap();
    catalog
        .add_relation("City", 20, &[("cid", 20), ("country", 5)])
        .unwrap();
    catalog
}

fn chain_canonical() -> LogicalPlan {
    LogicalPlan::scan("Emp")
        .product(LogicalPlan::scan("Dept"))
        .product(LogicalPlan::scan("City"))
        .select(Predicate::attributes("dept", "did"))
        .select(Predicate::attributes("city", "cid"))
        .select(Predicate::value("country", "NL"))
        .project(["eid", "country"])
}

fn contains_product(plan: &LogicalPlan) -> bool {
    match plan {
        LogicalPlan::Scan { .. } => false,
        LogicalPlan::Product { .. } => true,
        LogicalPlan::Select { input, .. } | LogicalPlan::Project { input, .. } => {
            contains_product(input)
        }
        LogicalPlan::Join { left, right, .. } => contains_product(left) || contains_product(right),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn product_with_equality_becomes_join() {
    let catalog = emp_dept();
    let canonical = LogicalPlan::scan("Emp")
        .product(LogicalPlan::scan("Dept"))
        .select(Predicate::attributes("dept", "did"))
        .project(["eid", "dname"]);

    let out = optimise(&catalog, &canonical, &OptimiserConfig::default()).unwrap();

    let expected = LogicalPlan::scan("Emp")
        .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"))
        .project(["eid", "dname"]);
    assert_eq!(out.plan(), expected);
    assert_eq!(out.plan().to_string(), "PROJECT[eid,dname]((SCAN(Emp)) JOIN[dept=did] (SCAN(Dept)))");
    assert_eq!(out.relation.tuple_count, 100);
    assert_eq!(out.relation.attribute_names(), vec!["eid", "dname"]);
    assert!(out.unenforced.is_empty());
    assert_eq!(out.candidates, 2);
}

#[test]
fn filters_and_projections_are_pushed_below_joins() {
    let catalog = chain();
    let out = optimise(&catalog, &chain_canonical(), &OptimiserConfig::default()).unwrap();

    let city = LogicalPlan::scan("City").select(Predicate::value("country", "NL"));
    let expected = LogicalPlan::scan("Emp")
        .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"))
        .project(["eid", "city"])
        .join(city, Predicate::attributes("city", "cid"))
        .project(["eid", "country"]);

    assert_eq!(out.plan(), expected);
    assert!(!contains_product(&out.plan()));
    assert_eq!(out.relation.tuple_count, 200);
    // Three relations: 3! complete left-deep orders.
    assert_eq!(out.candidates, 6);
}

#[test]
fn rewritten_plan_has_the_canonical_schema() {
    let catalog = chain();
    let canonical = chain_canonical();

    let before = estimate_plan(&catalog, &canonical).unwrap();
    let after = optimise(&catalog, &canonical, &OptimiserConfig::default()).unwrap();

    assert_eq!(
        after.relation.attribute_names(),
        before.relation.attribute_names()
    );
    assert_eq!(after.relation.tuple_count, before.relation.tuple_count);
}

#[test]
fn no_left_deep_alternative_is_cheaper() {
    let catalog = chain();
    let out = optimise(&catalog, &chain_canonical(), &OptimiserConfig::default()).unwrap();

    let city = || LogicalPlan::scan("City").select(Predicate::value("country", "NL"));
    let alternatives = [
        chain_canonical(),
        // City, Dept, Emp
        city()
            .join(LogicalPlan::scan("Dept"), Predicate::attributes("cid", "city"))
            .join(LogicalPlan::scan("Emp"), Predicate::attributes("did", "dept"))
            .project(["eid", "country"]),
        // Dept, Emp, City
        LogicalPlan::scan("Dept")
            .join(LogicalPlan::scan("Emp"), Predicate::attributes("did", "dept"))
            .join(city(), Predicate::attributes("city", "cid"))
            .project(["eid", "country"]),
        // Emp, City as a product, then Dept
        LogicalPlan::scan("Emp")
            .product(city())
            .join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"))
            .select(Predicate::attributes("city", "cid"))
            .project(["eid", "country"]),
    ];

    for alternative in &alternatives {
        let estimated = estimate_plan(&catalog, alternative).unwrap();
        assert!(
            out.relation.tuple_count <= estimated.relation.tuple_count,
            "{} estimates {} tuples, optimised plan {}",
            alternative,
            estimated.relation.tuple_count,
            out.relation.tuple_count
        );
    }
}

/// Truncating division makes the join order matter: the first order found,
/// `(R JOIN S) JOIN U`, keeps one tuple while joining `S` and `U` first keeps none.
fn truncating() -> InMemoryCatalog {
    let mut catalog = InMemoryCatalog::new();
    catalog.add_relation("R", 10, &[("a", 3)]).unwrap();
    catalog.add_relation("S", 1, &[("b", 3), ("c", 2)]).unwrap();
    catalog.add_relation("U", 1, &[("d", 2)]).unwrap();
    catalog
}

#[test]
fn cheaper_later_order_wins() {
    let catalog = truncating();
    let canonical = LogicalPlan::scan("R")
        .product(LogicalPlan::scan("S"))
        .product(LogicalPlan::scan("U"))
        .select(Predicate::attributes("a", "b"))
        .select(Predicate::attributes("c", "d"));

    let first_order = LogicalPlan::scan("R")
        .join(LogicalPlan::scan("S"), Predicate::attributes("a", "b"))
        .join(LogicalPlan::scan("U"), Predicate::attributes("c", "d"));
    assert_eq!(estimate_plan(&catalog, &first_order).unwrap().relation.tuple_count, 1);

    let out = optimise(&catalog, &canonical, &OptimiserConfig::default()).unwrap();

    // S JOIN U is built first; R holds `a`, so it becomes the left operand.
    let expected = LogicalPlan::scan("R").join(
        LogicalPlan::scan("S").join(LogicalPlan::scan("U"), Predicate::attributes("c", "d")),
        Predicate::attributes("a", "b"),
    );
    assert_eq!(out.plan(), expected);
    assert_eq!(out.relation.tuple_count, 0);
    assert_eq!(out.cost.0, 0);
    assert_eq!(out.candidates, 6);
    assert!(out.unenforced.is_empty());
}

#[test]
fn without_projection_nothing_is_pruned() {
    let catalog = emp_dept();
    let canonical = LogicalPlan::scan("Emp")
        .product(LogicalPlan::scan("Dept"))
        .select(Predicate::attributes("dept", "did"));

    let out = optimise(&catalog, &canonical, &OptimiserConfig::default()).unwrap();

    assert_eq!(
        out.plan(),
        LogicalPlan::scan("Emp").join(LogicalPlan::scan("Dept"), Predicate::attributes("dept", "did"))
    );
    assert_eq!(out.relation.attribute_names(), vec!["eid", "dept", "did", "dname"]);
}

#[test]
fn predicate_on_missing_attribute_is_reported() {
    let catalog = emp_dept();
    let canonical = LogicalPlan::scan("Emp")
        .product(LogicalPlan::scan("Dept"))
        .select(Predicate::attributes("dept", "did"))
        .select(Predicate::value("salary", 1000))
        .project(["eid", "dname"]);

    let out = optimise(&catalog, &canonical, &OptimiserConfig::default()).unwrap();

    assert_eq!(out.unenforced, vec![Predicate::value("salary", 1000)]);
    assert_eq!(out.relation.tuple_count, 100);
    assert!(!contains_product(&out.plan()));
}

#[test]
fn relation_limit_is_enforced() {
    let catalog = chain();
    let config = OptimiserConfig { max_relations: 2 };
    match optimise(&catalog, &chain_canonical(), &config) {
        Err(OptimiseError::TooManyRelations { count, max }) => {
            assert_eq!(count, 3);
            assert_eq!(max, 2);
        }
        other => panic!("expected TooManyRelations, got {other:?}"),
    }
}

#[test]
fn repeated_runs_are_deterministic() {
    let catalog = chain();
    let first = optimise(&catalog, &chain_canonical(), &OptimiserConfig::default()).unwrap();
    let second = optimise(&catalog, &chain_canonical(), &OptimiserConfig::default()).unwrap();
    assert_eq!(first.plan(), second.plan());
    assert_eq!(first.display(), second.display());
}
