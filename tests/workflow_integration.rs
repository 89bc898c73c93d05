//! Integration tests for an orchestrator-style workflow.
//!
//! Branch, load, commit with provenance, wait and merge, all against
//! `MockStore` through the `VersionedStore` trait.

use std::time::Duration;

use chrono::{TimeZone, Utc};

use lakehook::core::provenance::RunContext;
use lakehook::sensors::{wait_for, CommitSensor, FileSensor, PollPolicy, SensorError};
use lakehook::store::mock::{FailOn, MockOperation, MockStore};
use lakehook::store::{CommitLog, CommitRequest, Metadata, RemoteError, VersionedStore};

fn policy() -> PollPolicy {
    PollPolicy {
        interval: Duration::from_millis(5),
        timeout: Duration::from_millis(100),
    }
}

/// The steps a daily load task runs, written against the trait.
async fn daily_load(store: &dyn VersionedStore, run: &RunContext) -> Result<String, RemoteError> {
    store.create_branch("lake", "etl", "main").await?;
    store
        .upload("lake", "etl", "tables/orders/part-0.csv", b"id,total\n1,9.5\n".to_vec())
        .await?;

    let mut metadata = Metadata::new();
    metadata.insert("rows".into(), "1".into());
    run.enrich(&mut metadata);
    store
        .commit("lake", "etl", CommitRequest::new("load orders").with_metadata(metadata))
        .await?;

    store
        .merge("lake", "etl", "main", CommitRequest::new("publish orders"))
        .await
}

#[tokio::test]
async fn load_commit_and_publish() {
    let store = MockStore::new().with_repo("lake", "main");
    let run = RunContext::new("Airflow", "daily_load", "scheduled__2024-01-01")
        .with_logical_date(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());

    let merge_id = daily_load(&store, &run).await.unwrap();

    assert_eq!(store.branch_head("lake", "main").as_deref(), Some(merge_id.as_str()));
    let content = store
        .get_object("lake", "main", "tables/orders/part-0.csv")
        .await
        .unwrap();
    assert_eq!(content, b"id,total\n1,9.5\n");

    // Newest first: merge, load, initial
    let history = CommitLog::new(&store, "lake", "main", 1)
        .try_collect()
        .await
        .unwrap();
    let messages: Vec<_> = history.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(messages, vec!["publish orders", "load orders", "Repository created"]);
    assert_eq!(history[0].parents.len(), 2);
    assert_eq!(history[1].metadata["rows"], "1");
    assert_eq!(history[1].metadata["::lakefs::Airflow::dag_id"], "daily_load");
    assert_eq!(
        history[1].metadata["::lakefs::Airflow::logical_date"],
        "2024-01-01T00:00:00+00:00"
    );
}

#[tokio::test]
async fn failed_commit_leaves_main_untouched() {
    let store = MockStore::new()
        .with_repo("lake", "main")
        .fail_on(FailOn::Commit(RemoteError::ApiError {
            status: 500,
            message: "lakeFS server error: disk full".into(),
        }));
    let before = store.branch_head("lake", "main");

    let err = daily_load(&store, &RunContext::new("Airflow", "d", "r"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::ApiError { status: 500, .. }));
    assert_eq!(store.branch_head("lake", "main"), before);

    // Nothing after the failed commit was attempted
    let ops = store.operations();
    assert!(matches!(ops.last(), Some(MockOperation::Commit { .. })));
}

#[tokio::test]
async fn existing_branch_conflicts() {
    let store = MockStore::new().with_repo("lake", "main");
    store.create_branch("lake", "etl", "main").await.unwrap();

    let err = daily_load(&store, &RunContext::new("Airflow", "d", "r"))
        .await
        .unwrap_err();
    assert!(matches!(err, RemoteError::Conflict(_)));
}

#[tokio::test]
async fn downstream_waits_for_published_commit() {
    let store = MockStore::new().with_repo("lake", "main");
    let baseline = store.branch_head("lake", "main").unwrap();

    // Nothing published yet
    let mut sensor = CommitSensor::new(&store, "lake", "main").with_previous_commit(baseline.clone());
    assert!(matches!(
        wait_for(&mut sensor, &policy()).await,
        Err(SensorError::Timeout { .. })
    ));

    daily_load(&store, &RunContext::new("Airflow", "d", "r"))
        .await
        .unwrap();

    let mut sensor = CommitSensor::new(&store, "lake", "main").with_previous_commit(baseline);
    wait_for(&mut sensor, &policy()).await.unwrap();

    let mut marker = FileSensor::new(&store, "lake", "main", "tables/orders/part-0.csv");
    wait_for(&mut marker, &policy()).await.unwrap();
}
