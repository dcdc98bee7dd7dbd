//! Schema bootstrap against SQLite.
mod common;

use backend_lib::storage::{initialize_schema, BootstrapStep, Gateway, SqlParam};
use serde_json::Value;
use std::path::Path;
use tempfile::TempDir;

async fn count(gateway: &dyn Gateway, table: &str) -> i64 {
    let rows = gateway
        .execute(&format!("SELECT COUNT(*) AS n FROM {table}"), &[])
        .await
        .unwrap();
    rows[0].get("n").and_then(Value::as_i64).unwrap()
}

fn copy_dir(from: &Path, to: &Path) {
    std::fs::create_dir_all(to).unwrap();
    for entry in std::fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.file_type().unwrap().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            std::fs::copy(entry.path(), &target).unwrap();
        }
    }
}

#[tokio::test]
async fn fixtures_are_loaded() {
    let (state, _dir) = common::setup_test_env().await;
    let gateway = state.gateway.as_ref();

    assert_eq!(count(gateway, "institutions").await, 2);
    assert_eq!(count(gateway, "positions").await, 3);
    assert_eq!(count(gateway, "experiences").await, 4);
    assert_eq!(count(gateway, "skills").await, 8);
    assert_eq!(count(gateway, "feedback").await, 0);
    assert_eq!(count(gateway, "users").await, 2);
}

#[tokio::test]
async fn null_cells_become_sql_null() {
    let (state, _dir) = common::setup_test_env().await;

    let rows = state
        .gateway
        .execute("SELECT address, zip FROM institutions WHERE inst_id = ?", &[SqlParam::Int(2)])
        .await
        .unwrap();
    assert_eq!(rows[0]["address"], Value::Null);
    assert_eq!(rows[0]["zip"], 48933);
}

#[tokio::test]
async fn purge_and_bootstrap_restores_seed_state() {
    let (state, _dir) = common::setup_test_env().await;
    let gateway = state.gateway.as_ref();

    gateway
        .execute(
            "INSERT INTO feedback (name, email, comment) VALUES (?, ?, ?)",
            &["Ada".into(), "ada@example.com".into(), "hi".into()],
        )
        .await
        .unwrap();
    gateway
        .execute("DELETE FROM skills WHERE experience_id = ?", &[SqlParam::Int(1)])
        .await
        .unwrap();

    let report = state.bootstrap(true).await;
    assert!(report.is_clean(), "{:?}", report.failures);
    assert_eq!(report.dropped.len(), 6);
    assert_eq!(report.rows_seeded("skills"), 8);

    assert_eq!(count(gateway, "feedback").await, 0);
    assert_eq!(count(gateway, "skills").await, 8);
    assert_eq!(count(gateway, "users").await, 2);
}

#[tokio::test]
async fn rerun_without_purge_keeps_data_and_reports_conflicts() {
    let (state, _dir) = common::setup_test_env().await;

    let report = initialize_schema(state.gateway.as_ref(), &common::data_dir(), false).await;
    assert!(report.dropped.is_empty());
    assert_eq!(report.created.len(), 6);
    assert!(report
        .failures
        .iter()
        .all(|f| f.step == BootstrapStep::Seed));
    assert_eq!(count(state.gateway.as_ref(), "institutions").await, 2);
}

#[tokio::test]
async fn missing_data_dir_is_not_fatal() {
    let (state, _dir) = common::setup_state();
    let empty = TempDir::new().unwrap();

    let report = initialize_schema(state.gateway.as_ref(), empty.path(), true).await;
    assert!(report.created.is_empty());
    assert!(report
        .failures
        .iter()
        .any(|f| f.table == "users" && f.step == BootstrapStep::Create));
}

#[tokio::test]
async fn short_fixture_row_fails_alone() {
    let (state, _dir) = common::setup_state();
    let data = TempDir::new().unwrap();
    copy_dir(&common::data_dir(), data.path());

    let skills = data.path().join("initial_data").join("skills.csv");
    let text = std::fs::read_to_string(&skills).unwrap();
    assert!(text.contains("4,2,C,7\n"));
    std::fs::write(&skills, text.replace("4,2,C,7\n", "4,2,C\n")).unwrap();

    let report = initialize_schema(state.gateway.as_ref(), data.path(), true).await;
    assert_eq!(report.rows_seeded("skills"), 7);
    let skill_failures: Vec<_> = report
        .failures
        .iter()
        .filter(|f| f.table == "skills")
        .collect();
    assert_eq!(skill_failures.len(), 1);
    assert_eq!(skill_failures[0].step, BootstrapStep::Seed);
    assert_eq!(count(state.gateway.as_ref(), "skills").await, 7);
    assert_eq!(report.rows_seeded("experiences"), 4);
}
