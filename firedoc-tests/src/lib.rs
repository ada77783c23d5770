/// Test utilities and helpers for Firedoc testing
///
/// This module provides common test utilities to simplify writing tests.

use firedoc_api::{DocumentStore, WriteOptions};
use firedoc_core::{Document, DocumentBuilder, DocumentDriver, DocumentRef, DriverConfig, MemoryDriver, Value};
use futures::{Stream, StreamExt};
use std::ops::Deref;
use std::sync::{Arc, Once};
use std::time::Duration;

/// How long a listener may take to emit before a test fails
pub const EMIT_TIMEOUT: Duration = Duration::from_secs(2);

static TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process (honours `RUST_LOG`)
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Accessor over a fresh in-memory driver, with direct driver access for assertions
pub struct TestStore {
    pub store: DocumentStore,
    pub driver: MemoryDriver,
}

impl TestStore {
    /// Create a new test store with the default driver configuration
    pub fn new() -> Self {
        Self::with_config(DriverConfig::default())
    }

    /// Create a test store with a custom driver configuration
    pub fn with_config(config: DriverConfig) -> Self {
        init_tracing();
        let driver = MemoryDriver::with_config(config).expect("Invalid driver config");
        let store = DocumentStore::new(Arc::new(driver.clone()));
        Self { store, driver }
    }

    /// Write documents verbatim (no timestamps) under `collection`
    pub async fn seed(&self, collection: &str, docs: Vec<(&str, Document)>) {
        for (id, data) in docs {
            self.store
                .set_doc_with(&format!("{}/{}", collection, id), data, WriteOptions::without_timestamps())
                .await
                .expect("Failed to seed document");
        }
    }

    /// Stored fields read straight from the driver
    pub async fn raw(&self, path: &str) -> Option<Document> {
        let doc = DocumentRef::parse(path).expect("Invalid document path");
        self.driver
            .get_doc(&doc)
            .await
            .expect("Failed to read document")
            .into_data()
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for TestStore {
    type Target = DocumentStore;

    fn deref(&self) -> &DocumentStore {
        &self.store
    }
}

/// Next stream item, failing the test if nothing arrives in time
pub async fn next_within<S>(stream: &mut S) -> S::Item
where
    S: Stream + Unpin,
{
    tokio::time::timeout(EMIT_TIMEOUT, stream.next())
        .await
        .expect("Listener did not emit in time")
        .expect("Listener ended unexpectedly")
}

/// Simple user document
pub fn user(name: &str, age: i64) -> Document {
    DocumentBuilder::new()
        .string("name", name)
        .integer("age", age)
        .build()
}

/// Copy of `doc` without `created_at` / `updated_at`
pub fn without_timestamps(mut doc: Document) -> Document {
    doc.remove(firedoc_core::CREATED_AT_FIELD);
    doc.remove(firedoc_core::UPDATED_AT_FIELD);
    doc
}

/// Assert that a value is a string with expected value
pub fn assert_string_eq(value: Option<&Value>, expected: &str) {
    match value {
        Some(Value::String(s)) => assert_eq!(s, expected),
        _ => panic!("Expected string, got {:?}", value),
    }
}

/// Assert that a value is an integer with expected value
pub fn assert_integer_eq(value: Option<&Value>, expected: i64) {
    match value {
        Some(Value::Integer(n)) => assert_eq!(*n, expected),
        _ => panic!("Expected integer, got {:?}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_helper() {
        let test_store = TestStore::new();
        test_store.seed("users", vec![("ann", user("Ann", 30))]).await;

        let raw = test_store.raw("users/ann").await.unwrap();
        assert_eq!(raw, user("Ann", 30));
        assert_eq!(test_store.driver.document_count(), 1);
    }

    #[test]
    fn test_without_timestamps() {
        let mut doc = user("Bo", 1);
        doc.insert(firedoc_core::CREATED_AT_FIELD, firedoc_core::Timestamp::now());
        assert_eq!(without_timestamps(doc), user("Bo", 1));
    }
}
