/// Live listener tests: initial emission, change re-emission, identifier merge and cancellation

use firedoc_api::{order_by, where_field, Direction, Document, FilterOp};
use firedoc_test_utils::{next_within, user, TestStore};
use futures::StreamExt;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, PartialEq)]
struct Named {
    uid: Option<String>,
    name: String,
}

#[tokio::test]
async fn test_col_stream_emits_current_then_changes() {
    let ts = TestStore::new();
    ts.seed("users", vec![("a", user("Ann", 31))]).await;

    let mut stream = ts.col_stream::<Document>("users", []).unwrap();
    let initial = next_within(&mut stream).await.unwrap();
    assert_eq!(initial, vec![user("Ann", 31)]);

    ts.seed("users", vec![("b", user("Bo", 25))]).await;
    let updated = next_within(&mut stream).await.unwrap();
    assert_eq!(updated.len(), 2);

    ts.delete_doc("users/a").await.unwrap();
    let after_delete = next_within(&mut stream).await.unwrap();
    assert_eq!(after_delete, vec![user("Bo", 25)]);
}

#[tokio::test]
async fn test_col_stream_with_uid_merges_identifier() {
    let ts = TestStore::new();
    let mut stale = user("Ann", 31);
    stale.insert("uid", "stale");
    ts.seed("users", vec![("id1", stale), ("id2", user("Bo", 25))]).await;

    let mut stream = ts.col_stream_with_uid::<Named>("users", []).unwrap();
    let items = next_within(&mut stream).await.unwrap();
    let ids: Vec<_> = items.iter().map(|n| n.uid.as_deref()).collect();
    assert_eq!(ids, vec![Some("id1"), Some("id2")]);
}

#[tokio::test]
async fn test_col_stream_without_uid_keeps_stored_uid_field() {
    let ts = TestStore::new();
    let mut doc = user("Ann", 31);
    doc.insert("uid", "stored");
    ts.seed("users", vec![("id1", doc)]).await;

    let mut stream = ts.col_stream::<Named>("users", []).unwrap();
    let items = next_within(&mut stream).await.unwrap();
    assert_eq!(items[0].uid.as_deref(), Some("stored"));
}

#[tokio::test]
async fn test_col_stream_applies_constraints() {
    let ts = TestStore::new();
    ts.seed("users", vec![("a", user("Ann", 31)), ("b", user("Bo", 17))]).await;

    let mut stream = ts
        .col_stream::<Named>(
            "users",
            [
                where_field("age", FilterOp::GreaterThan, 18),
                order_by("age", Direction::Ascending),
            ],
        )
        .unwrap();
    let names: Vec<String> = next_within(&mut stream)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["Ann"]);

    ts.seed("users", vec![("c", user("Cy", 20))]).await;
    let names: Vec<String> = next_within(&mut stream)
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(names, vec!["Cy", "Ann"]);
}

#[tokio::test]
async fn test_doc_stream_tracks_existence() {
    let ts = TestStore::new();
    let mut stream = ts.doc_stream::<Document>("users/ann").unwrap();

    assert_eq!(next_within(&mut stream).await.unwrap(), None);

    ts.seed("users", vec![("ann", user("Ann", 31))]).await;
    assert_eq!(next_within(&mut stream).await.unwrap(), Some(user("Ann", 31)));

    ts.delete_doc("users/ann").await.unwrap();
    assert_eq!(next_within(&mut stream).await.unwrap(), None);
}

#[tokio::test]
async fn test_doc_stream_with_uid() {
    let ts = TestStore::new();
    ts.seed("users", vec![("ann", user("Ann", 31))]).await;

    let mut stream = ts.doc_stream_with_uid::<Named>("users/ann").unwrap();
    let current = next_within(&mut stream).await.unwrap().unwrap();
    assert_eq!(current.uid.as_deref(), Some("ann"));

    ts.update_doc("users/ann", user("Annie", 32)).await.unwrap();
    let changed = next_within(&mut stream).await.unwrap().unwrap();
    assert_eq!(changed.name, "Annie");
    assert_eq!(changed.uid.as_deref(), Some("ann"));
}

#[tokio::test]
async fn test_doc_stream_ignores_sibling_writes() {
    let ts = TestStore::new();
    ts.seed("users", vec![("ann", user("Ann", 31))]).await;

    let mut stream = ts.doc_stream::<Document>("users/ann").unwrap();
    next_within(&mut stream).await.unwrap();

    ts.seed("users", vec![("bo", user("Bo", 25))]).await;
    let quiet = tokio::time::timeout(Duration::from_millis(100), stream.next()).await;
    assert!(quiet.is_err(), "listener emitted for an unrelated document");
}

#[tokio::test]
async fn test_listeners_are_independent() {
    let ts = TestStore::new();
    let mut first = ts.col_stream::<Document>("users", []).unwrap();
    let mut second = ts.col_stream::<Document>("users", []).unwrap();

    assert!(next_within(&mut first).await.unwrap().is_empty());
    assert!(next_within(&mut second).await.unwrap().is_empty());

    ts.seed("users", vec![("a", user("Ann", 31))]).await;
    drop(first);

    assert_eq!(next_within(&mut second).await.unwrap().len(), 1);
    assert_eq!(ts.driver.listener_count(), 1);
}

#[tokio::test]
async fn test_streams_are_cold_until_polled() {
    let ts = TestStore::new();
    let stream = ts.col_stream::<Document>("users", []).unwrap();
    assert_eq!(ts.driver.listener_count(), 0);

    let mut stream = stream;
    next_within(&mut stream).await.unwrap();
    assert_eq!(ts.driver.listener_count(), 1);

    drop(stream);
    assert_eq!(ts.driver.listener_count(), 0);
}
