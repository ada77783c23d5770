use firedoc_core::{DocumentSnapshot, Query, QuerySnapshot};
use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::trace;

pub use firedoc_core::{
    CollectionRef, Direction, Document, DocumentBuilder, DocumentDriver, DocumentRef, DriverConfig,
    FilterOp, MemoryDriver, QueryConstraint, Timestamp, Value, WriteBatch, CREATED_AT_FIELD,
    UID_FIELD, UPDATED_AT_FIELD,
};
pub use firedoc_core::query::{limit, limit_to_last, order_by, where_field};

pub mod error;
pub use error::{Error, Result, DOCUMENT_NOT_FOUND_MESSAGE};

pub mod timestamps;
pub use timestamps::WriteOptions;

/// Maximum writes accepted in one atomic batch by the hosted store.
///
/// See <https://cloud.google.com/firestore/quotas#writes_and_transactions>.
pub const MAX_WRITES_PER_BATCH: usize = DocumentStore::MAX_WRITES_PER_BATCH;

/// Live stream of decoded results; dropping it cancels the listener
pub type DocStream<T> = BoxStream<'static, Result<T>>;

/// Document store accessor
///
/// A thin layer over a [`DocumentDriver`]: reads (one-shot and live, with or
/// without the identifier merged under `uid`), timestamp-managed writes, and
/// atomic batches. Holds no state besides the driver handle.
#[derive(Clone)]
pub struct DocumentStore {
    driver: Arc<dyn DocumentDriver>,
}

impl DocumentStore {
    /// Writes the hosted store accepts in one batch. Batches are not checked
    /// against it here; the driver rejects oversized commits.
    pub const MAX_WRITES_PER_BATCH: usize = 500;

    /// Wrap a driver
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self { driver }
    }

    /// Accessor over a fresh in-memory driver
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDriver::new()))
    }

    /// The underlying driver
    pub fn driver(&self) -> &Arc<dyn DocumentDriver> {
        &self.driver
    }

    fn build_query(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
    ) -> Result<Query> {
        let collection = self.driver.collection(path)?;
        Ok(self.driver.query(collection, constraints.into_iter().collect()))
    }

    /// Live collection results without identifiers
    pub fn col_stream<T>(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
    ) -> Result<DocStream<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.collection_stream(path, constraints, None)
    }

    /// Live collection results with each document's identifier under `uid`
    pub fn col_stream_with_uid<T>(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
    ) -> Result<DocStream<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.collection_stream(path, constraints, Some(UID_FIELD))
    }

    fn collection_stream<T>(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
        id_field: Option<&'static str>,
    ) -> Result<DocStream<Vec<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let query = self.build_query(path, constraints)?;
        trace!(path, with_uid = id_field.is_some(), "collection listener");
        Ok(self
            .driver
            .listen_query(query)
            .map(move |snapshot| decode_query(snapshot?, id_field))
            .boxed())
    }

    /// Collection results at call time without identifiers
    pub async fn col_once<T: DeserializeOwned>(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
    ) -> Result<Vec<T>> {
        let query = self.build_query(path, constraints)?;
        trace!(path, "collection read");
        let snapshot = self.driver.get_docs(&query).await?;
        decode_query(snapshot, None)
    }

    /// Collection results at call time with identifiers under `uid`
    pub async fn col_once_with_uid<T: DeserializeOwned>(
        &self,
        path: &str,
        constraints: impl IntoIterator<Item = QueryConstraint>,
    ) -> Result<Vec<T>> {
        let query = self.build_query(path, constraints)?;
        trace!(path, "collection read with uid");
        let snapshot = self.driver.get_docs(&query).await?;
        decode_query(snapshot, Some(UID_FIELD))
    }

    /// Live document state; `None` while the document does not exist
    pub fn doc_stream<T>(&self, path: &str) -> Result<DocStream<Option<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.document_stream(path, None)
    }

    /// Live document state with its identifier under `uid`
    pub fn doc_stream_with_uid<T>(&self, path: &str) -> Result<DocStream<Option<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        self.document_stream(path, Some(UID_FIELD))
    }

    fn document_stream<T>(
        &self,
        path: &str,
        id_field: Option<&'static str>,
    ) -> Result<DocStream<Option<T>>>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let doc = self.driver.doc(path)?;
        trace!(path, with_uid = id_field.is_some(), "document listener");
        Ok(self
            .driver
            .listen_doc(doc)
            .map(move |snapshot| decode_doc(snapshot?, id_field))
            .boxed())
    }

    /// Document content at call time; `None` if it does not exist
    pub async fn doc_once<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>> {
        let doc = self.driver.doc(path)?;
        trace!(path, "document read");
        let snapshot = self.driver.get_doc(&doc).await?;
        decode_doc(snapshot, None)
    }

    /// Document content at call time with its identifier under `uid`.
    ///
    /// Fails with [`Error::DocumentNotFound`] if the document does not exist.
    pub async fn doc_once_with_uid<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let doc = self.driver.doc(path)?;
        trace!(path, "document read with uid");
        let snapshot = self.driver.get_doc(&doc).await?;
        if !snapshot.exists() {
            return Err(Error::DocumentNotFound {
                path: doc.to_string(),
            });
        }
        decode_doc(snapshot, Some(UID_FIELD))?.ok_or(Error::DocumentNotFound {
            path: doc.to_string(),
        })
    }

    /// Add a document with a driver-assigned id, stamping both timestamps
    pub async fn add_doc(&self, path: &str, data: impl Into<Document>) -> Result<DocumentRef> {
        self.add_doc_with(path, data, WriteOptions::default()).await
    }

    pub async fn add_doc_with(
        &self,
        path: &str,
        data: impl Into<Document>,
        options: WriteOptions,
    ) -> Result<DocumentRef> {
        let collection: CollectionRef = self.driver.collection(path)?;
        trace!(path, timestamps = options.timestamps, "add document");
        let data = if options.timestamps {
            timestamps::stamp_created(data.into(), || self.driver.server_timestamp())
        } else {
            data.into()
        };
        Ok(self.driver.add_doc(&collection, data).await?)
    }

    /// Write a document at `path`, stamping both timestamps.
    ///
    /// Overwrites an existing document; nothing checks that the path is free.
    pub async fn set_doc(&self, path: &str, data: impl Into<Document>) -> Result<()> {
        self.set_doc_with(path, data, WriteOptions::default()).await
    }

    pub async fn set_doc_with(
        &self,
        path: &str,
        data: impl Into<Document>,
        options: WriteOptions,
    ) -> Result<()> {
        let doc = self.driver.doc(path)?;
        trace!(path, timestamps = options.timestamps, "set document");
        let data = if options.timestamps {
            timestamps::stamp_created(data.into(), || self.driver.server_timestamp())
        } else {
            data.into()
        };
        Ok(self.driver.set_doc(&doc, data).await?)
    }

    /// Create or replace a document, keeping the payload's `created_at` if set
    pub async fn save_doc(&self, path: &str, data: impl Into<Document>) -> Result<()> {
        self.save_doc_with(path, data, WriteOptions::default()).await
    }

    pub async fn save_doc_with(
        &self,
        path: &str,
        data: impl Into<Document>,
        options: WriteOptions,
    ) -> Result<()> {
        let doc = self.driver.doc(path)?;
        trace!(path, timestamps = options.timestamps, "save document");
        let data = if options.timestamps {
            timestamps::stamp_saved(data.into(), || self.driver.server_timestamp())
        } else {
            data.into()
        };
        Ok(self.driver.set_doc(&doc, data).await?)
    }

    /// Merge fields into an existing document, stamping `updated_at`
    pub async fn update_doc(&self, path: &str, data: impl Into<Document>) -> Result<()> {
        self.update_doc_with(path, data, WriteOptions::default()).await
    }

    pub async fn update_doc_with(
        &self,
        path: &str,
        data: impl Into<Document>,
        options: WriteOptions,
    ) -> Result<()> {
        let doc = self.driver.doc(path)?;
        trace!(path, timestamps = options.timestamps, "update document");
        let data = if options.timestamps {
            timestamps::stamp_updated(data.into(), || self.driver.server_timestamp())
        } else {
            data.into()
        };
        Ok(self.driver.update_doc(&doc, data).await?)
    }

    /// Delete a document (succeeds if it does not exist)
    pub async fn delete_doc(&self, path: &str) -> Result<()> {
        let doc = self.doc_ref(path)?;
        trace!(path, "delete document");
        Ok(self.driver.delete_doc(&doc).await?)
    }

    /// Start an atomic batch.
    ///
    /// Keep it within [`DocumentStore::MAX_WRITES_PER_BATCH`] writes.
    pub fn write_batch(&self) -> WriteBatch {
        WriteBatch::new(Arc::clone(&self.driver))
    }

    /// Resolve a document reference for direct driver use
    pub fn doc_ref(&self, path: &str) -> Result<DocumentRef> {
        Ok(self.driver.doc(path)?)
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore").finish_non_exhaustive()
    }
}

fn project(snapshot: DocumentSnapshot, id_field: Option<&str>) -> Option<Document> {
    match id_field {
        Some(field) => snapshot.into_data_with_id(field),
        None => snapshot.into_data(),
    }
}

fn decode_doc<T: DeserializeOwned>(
    snapshot: DocumentSnapshot,
    id_field: Option<&str>,
) -> Result<Option<T>> {
    project(snapshot, id_field)
        .map(|doc| doc.deserialize_into::<T>())
        .transpose()
        .map_err(Error::from)
}

fn decode_query<T: DeserializeOwned>(
    snapshot: QuerySnapshot,
    id_field: Option<&str>,
) -> Result<Vec<T>> {
    snapshot
        .docs
        .into_iter()
        .filter_map(|doc| project(doc, id_field))
        .map(|doc| doc.deserialize_into::<T>().map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        uid: Option<String>,
        name: String,
    }

    fn user(name: &str) -> Document {
        DocumentBuilder::new().string("name", name).build()
    }

    #[test]
    fn test_batch_quota_constant() {
        assert_eq!(DocumentStore::MAX_WRITES_PER_BATCH, 500);
        assert_eq!(MAX_WRITES_PER_BATCH, 500);
    }

    #[tokio::test]
    async fn test_set_and_read_back() {
        let store = DocumentStore::in_memory();
        store.set_doc("users/ann", user("Ann")).await.unwrap();

        let plain: Option<User> = store.doc_once("users/ann").await.unwrap();
        assert_eq!(
            plain,
            Some(User {
                uid: None,
                name: "Ann".into()
            })
        );

        let with_uid: User = store.doc_once_with_uid("users/ann").await.unwrap();
        assert_eq!(with_uid.uid.as_deref(), Some("ann"));
    }

    #[tokio::test]
    async fn test_doc_once_with_uid_missing() {
        let store = DocumentStore::in_memory();

        let err = store.doc_once_with_uid::<Document>("users/ghost").await.unwrap_err();
        assert!(err.is_document_not_found());

        let plain = store.doc_once::<Document>("users/ghost").await.unwrap();
        assert!(plain.is_none());
    }

    #[tokio::test]
    async fn test_add_doc_stamps_timestamps() {
        let store = DocumentStore::in_memory();
        let reference = store.add_doc("users", user("Bo")).await.unwrap();

        let stored: Document = store
            .doc_once(&reference.to_string())
            .await
            .unwrap()
            .unwrap();
        let created = stored.get(CREATED_AT_FIELD).and_then(Value::as_timestamp).unwrap();
        let updated = stored.get(UPDATED_AT_FIELD).and_then(Value::as_timestamp).unwrap();
        assert!(created <= updated);
    }

    #[tokio::test]
    async fn test_col_once_with_uid() {
        let store = DocumentStore::in_memory();
        store.set_doc("users/a", user("Ann")).await.unwrap();
        store.set_doc("users/b", user("Bo")).await.unwrap();

        let users: Vec<User> = store.col_once_with_uid("users", []).await.unwrap();
        let ids: Vec<_> = users.iter().filter_map(|u| u.uid.as_deref()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_invalid_path_passes_through() {
        let store = DocumentStore::in_memory();
        let err = store.doc_once::<Document>("users").await.unwrap_err();
        assert_eq!(err.code(), "INVALID_PATH");

        let err = store.add_doc("users/a", user("x")).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_PATH");
    }

    #[tokio::test]
    async fn test_write_batch_commits() {
        let store = DocumentStore::in_memory();
        let mut batch = store.write_batch();
        batch
            .set(&store.doc_ref("users/a").unwrap(), user("Ann"))
            .set(&store.doc_ref("users/b").unwrap(), user("Bo"));
        batch.commit().await.unwrap();

        let users: Vec<Document> = store.col_once("users", []).await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
