/// Atomic batch tests: all-or-nothing commits and the per-batch write quota

use firedoc_api::{DocumentBuilder, DocumentStore, DriverConfig, MAX_WRITES_PER_BATCH};
use firedoc_test_utils::{assert_integer_eq, user, TestStore};

#[test]
fn test_batch_quota_constant() {
    assert_eq!(MAX_WRITES_PER_BATCH, 500);
    assert_eq!(DocumentStore::MAX_WRITES_PER_BATCH, 500);
    assert_eq!(DriverConfig::default().max_writes_per_batch, MAX_WRITES_PER_BATCH);
}

#[tokio::test]
async fn test_batch_mixed_writes_commit_together() {
    let ts = TestStore::new();
    ts.seed("users", vec![("a", user("Ann", 31)), ("b", user("Bo", 25))]).await;

    let a = ts.doc_ref("users/a").unwrap();
    let b = ts.doc_ref("users/b").unwrap();
    let c = ts.doc_ref("users/c").unwrap();

    let mut batch = ts.write_batch();
    batch
        .update(&a, DocumentBuilder::new().integer("age", 32).build())
        .delete(&b)
        .set(&c, user("Cy", 20));
    assert_eq!(batch.len(), 3);
    batch.commit().await.unwrap();

    assert_integer_eq(ts.raw("users/a").await.unwrap().get("age"), 32);
    assert!(ts.raw("users/b").await.is_none());
    assert_eq!(ts.raw("users/c").await.unwrap(), user("Cy", 20));
}

#[tokio::test]
async fn test_batch_failure_applies_nothing() {
    let ts = TestStore::new();
    ts.seed("users", vec![("a", user("Ann", 31))]).await;

    let a = ts.doc_ref("users/a").unwrap();
    let missing = ts.doc_ref("users/missing").unwrap();

    let mut batch = ts.write_batch();
    batch
        .delete(&a)
        .update(&missing, DocumentBuilder::new().integer("age", 1).build());

    let err = batch.commit().await.unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert_eq!(ts.raw("users/a").await.unwrap(), user("Ann", 31));
}

#[tokio::test]
async fn test_batch_at_quota_succeeds() {
    let ts = TestStore::new();
    let mut batch = ts.write_batch();
    for i in 0..MAX_WRITES_PER_BATCH {
        let doc = ts.doc_ref(&format!("items/{}", i)).unwrap();
        batch.set(&doc, DocumentBuilder::new().integer("n", i as i64).build());
    }

    batch.commit().await.unwrap();
    assert_eq!(ts.driver.document_count(), MAX_WRITES_PER_BATCH);
}

#[tokio::test]
async fn test_batch_over_quota_rejected_by_driver() {
    let ts = TestStore::new();
    let mut batch = ts.write_batch();
    for i in 0..=MAX_WRITES_PER_BATCH {
        let doc = ts.doc_ref(&format!("items/{}", i)).unwrap();
        batch.set(&doc, DocumentBuilder::new().integer("n", i as i64).build());
    }

    let err = batch.commit().await.unwrap_err();
    assert_eq!(err.code(), "RESOURCE_EXHAUSTED");
    assert!(err.is_retryable());
    assert_eq!(ts.driver.document_count(), 0);
}

#[tokio::test]
async fn test_batch_quota_follows_driver_config() {
    let ts = TestStore::with_config(DriverConfig::new().with_max_writes_per_batch(2));
    let mut batch = ts.write_batch();
    for id in ["a", "b", "c"] {
        batch.set(&ts.doc_ref(&format!("users/{}", id)).unwrap(), user(id, 1));
    }

    assert_eq!(batch.commit().await.unwrap_err().code(), "RESOURCE_EXHAUSTED");
}

#[tokio::test]
async fn test_empty_batch_commits() {
    let ts = TestStore::new();
    let batch = ts.write_batch();
    assert!(batch.is_empty());
    batch.commit().await.unwrap();
}
