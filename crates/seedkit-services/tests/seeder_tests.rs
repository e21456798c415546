//! Integration tests for Seeder
//!
//! Verifies that planning and coercion problems surface before the backend
//! is touched, and that reset clears the cascade set before inserting.

mod common;

use pretty_assertions::assert_eq;
use seedkit_core::NativeValue;
use seedkit_dependencies::{InsertOrder, PlanError};
use seedkit_services::{FixtureDocument, PlannedBatch, Seeder, SeederOptions, ServiceError};
use serde_json::json;

use common::{MockBackend, diamond_schema};

/// Compare a numeric value by its decimal text
fn assert_numeric(value: &NativeValue, expected: &str) {
    match value {
        NativeValue::Numeric(Some(d)) => assert_eq!(d.to_string(), expected),
        other => panic!("expected numeric, got {:?}", other),
    }
}

fn fixture() -> FixtureDocument {
    FixtureDocument::from_json(
        r#"[
            {"name": "t3", "rows": [{"id": 1, "t1_id": 1, "t2_id": 1, "amount": 19.990}]},
            {"name": "t0", "rows": [{"id": 1, "label": "root"}]},
            {"name": "t1", "rows": [{"id": 1, "t0_id": 1}]},
            {"name": "t2", "rows": [{"id": 1, "t0_id": 1}]}
        ]"#,
    )
    .unwrap()
}

fn seeder(backend: &std::sync::Arc<MockBackend>) -> Seeder {
    Seeder::new(backend.clone(), backend.clone())
}

// ============ Reset ============

#[tokio::test]
async fn reset_deletes_cascade_then_inserts_parents_first() {
    let backend = MockBackend::new().into_arc();
    let report = seeder(&backend)
        .reset(&diamond_schema(), &fixture())
        .await
        .expect("reset should succeed");

    assert_eq!(report.deleted.tables, 4);
    assert_eq!(report.inserted.rows, 4);

    let calls = backend.calls();
    let position = |entry: &str| calls.iter().position(|c| c == entry).unwrap();

    assert_eq!(calls[0], "delete:t3");
    assert_eq!(calls[3], "delete:t0");
    assert_eq!(calls[4], "insert:t0");
    assert_eq!(calls[7], "insert:t3");
    assert!(position("insert:t1") < position("insert:t3"));
    assert!(position("insert:t2") < position("insert:t3"));
}

#[tokio::test]
async fn reset_coerces_rows_for_their_columns() {
    let backend = MockBackend::new().into_arc();
    seeder(&backend)
        .reset(&diamond_schema(), &fixture())
        .await
        .unwrap();

    let inserted = backend.inserted.lock();
    let row = &inserted["t3"][0];
    assert_eq!(row["id"], NativeValue::Int64(Some(1)));
    assert_numeric(&row["amount"], "19.990");
    assert_eq!(
        inserted["t0"][0]["label"],
        NativeValue::String(Some("root".to_string()))
    );
}

#[tokio::test]
async fn reset_without_delete_only_inserts() {
    let backend = MockBackend::new().into_arc();
    let report = seeder(&backend)
        .with_options(SeederOptions::new().with_delete_before_insert(false))
        .reset(&diamond_schema(), &fixture())
        .await
        .unwrap();

    assert_eq!(report.deleted.batches, 0);
    assert!(backend.calls().iter().all(|c| c.starts_with("insert:")));
}

#[tokio::test]
async fn delete_failure_prevents_inserts() {
    let backend = MockBackend::new().with_failure("t2").into_arc();
    let err = seeder(&backend)
        .reset(&diamond_schema(), &fixture())
        .await
        .unwrap_err();

    match err {
        ServiceError::Batch(batch) => assert_eq!(batch.failed_tables(), vec!["t2"]),
        other => panic!("expected batch error, got {:?}", other),
    }
    assert!(!backend.calls().iter().any(|c| c.starts_with("insert:")));
}

// ============ Fail Fast ============

#[tokio::test]
async fn unknown_table_touches_nothing() {
    let backend = MockBackend::new().into_arc();
    let doc = FixtureDocument::from_json(
        r#"[{"name": "t0", "rows": []}, {"name": "missing", "rows": []}]"#,
    )
    .unwrap();

    let err = seeder(&backend)
        .reset(&diamond_schema(), &doc)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ServiceError::Plan(PlanError::UnknownTable(ref name)) if name == "missing"
    ));
    assert!(backend.log().is_empty());
}

#[tokio::test]
async fn bad_value_touches_nothing() {
    let backend = MockBackend::new().into_arc();
    let doc = FixtureDocument::from_json(
        r#"[{"name": "t0", "rows": [{"id": 1}]}, {"name": "t1", "rows": [{"id": "one"}]}]"#,
    )
    .unwrap();

    let err = seeder(&backend)
        .reset(&diamond_schema(), &doc)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Coercion(_)));
    assert!(err.to_string().contains("t1.id"));
    assert!(backend.log().is_empty());
}

// ============ Delete / Insert ============

#[tokio::test]
async fn delete_cascades_from_targets() {
    let backend = MockBackend::new().into_arc();
    let summary = seeder(&backend)
        .delete(&diamond_schema(), &["t1"])
        .await
        .unwrap();

    assert_eq!(summary.tables, 2);
    assert_eq!(backend.calls(), vec!["delete:t3", "delete:t1"]);
}

#[tokio::test]
async fn insert_level_ascending_order() {
    let backend = MockBackend::new().into_arc();
    seeder(&backend)
        .with_options(SeederOptions::new().with_insert_order(InsertOrder::LevelAscending))
        .insert(&diamond_schema(), &fixture())
        .await
        .unwrap();

    let calls = backend.calls();
    assert_eq!(calls.first().map(String::as_str), Some("insert:t3"));
    assert_eq!(calls.last().map(String::as_str), Some("insert:t0"));
}

// ============ Plan / Dump ============

#[tokio::test]
async fn plan_is_a_dry_run() {
    let backend = MockBackend::new().into_arc();
    let plan = seeder(&backend).plan(&diamond_schema(), &fixture()).unwrap();

    assert_eq!(
        plan.delete,
        vec![
            PlannedBatch {
                level: 0,
                tables: vec!["t3".into()],
                rows: 0
            },
            PlannedBatch {
                level: 1,
                tables: vec!["t1".into(), "t2".into()],
                rows: 0
            },
            PlannedBatch {
                level: 2,
                tables: vec!["t0".into()],
                rows: 0
            },
        ]
    );
    let insert_tables: Vec<Vec<String>> = plan.insert.iter().map(|b| b.tables.clone()).collect();
    assert_eq!(
        insert_tables,
        vec![
            vec!["t0".to_string()],
            vec!["t1".to_string(), "t2".to_string()],
            vec!["t3".to_string()],
        ]
    );
    assert_eq!(plan.insert[1].rows, 2);
    assert!(backend.log().is_empty());
}

#[tokio::test]
async fn dump_orders_tables_parents_first() {
    let backend = MockBackend::new()
        .with_dump("t0", vec![json!({"id": 1, "label": "root"})])
        .with_dump("t3", vec![json!({"id": 7})])
        .into_arc();

    let doc = seeder(&backend)
        .dump(&diamond_schema(), backend.as_ref(), &["t3", "t0"])
        .await
        .unwrap();

    assert_eq!(doc.table_names(), vec!["t0", "t3"]);
    assert_eq!(doc.tables[0].rows[0]["label"], json!("root"));
    assert_eq!(backend.calls(), vec!["dump:t0", "dump:t3"]);
}

#[tokio::test]
async fn dump_without_names_covers_every_table() {
    let backend = MockBackend::new().into_arc();
    let no_names: &[&str] = &[];

    let doc = seeder(&backend)
        .dump(&diamond_schema(), backend.as_ref(), no_names)
        .await
        .unwrap();

    assert_eq!(doc.len(), 4);
    assert_eq!(doc.tables[0].name, "t0");
    assert_eq!(doc.tables[3].name, "t3");
}
