/// The document-store driver seam
///
/// Everything that talks to an actual store sits behind `DocumentDriver`:
/// reference construction, one-shot fetches, change listeners, writes,
/// atomic batches and the server clock. `MemoryDriver` is the in-process
/// implementation; hosted backends implement the same trait.

use crate::batch::BatchWrite;
use crate::path::{CollectionRef, DocumentRef};
use crate::query::{Query, QueryConstraint};
use crate::types::{Document, Timestamp};
use crate::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;

/// Live stream of snapshots; dropping it cancels the listener
pub type SnapshotStream<S> = BoxStream<'static, Result<S>>;

/// State of a single document at read time
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    reference: DocumentRef,
    data: Option<Document>,
}

impl DocumentSnapshot {
    pub fn new(reference: DocumentRef, data: Option<Document>) -> Self {
        Self { reference, data }
    }

    pub fn missing(reference: DocumentRef) -> Self {
        Self {
            reference,
            data: None,
        }
    }

    pub fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    /// Store-assigned identifier
    pub fn id(&self) -> &str {
        self.reference.id()
    }

    pub fn exists(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&Document> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<Document> {
        self.data
    }

    /// Stored fields plus the identifier under `id_field`.
    ///
    /// The identifier overwrites any stored field of the same name.
    pub fn into_data_with_id(self, id_field: &str) -> Option<Document> {
        let id = self.reference.id().to_string();
        self.data.map(|mut doc| {
            doc.insert(id_field, id);
            doc
        })
    }
}

/// Result set of a query at read time (existing documents only)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySnapshot {
    pub docs: Vec<DocumentSnapshot>,
}

impl QuerySnapshot {
    pub fn new(docs: Vec<DocumentSnapshot>) -> Self {
        Self { docs }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Trait for document-store drivers
#[async_trait]
pub trait DocumentDriver: Send + Sync {
    /// Resolve a collection reference
    fn collection(&self, path: &str) -> Result<CollectionRef> {
        CollectionRef::parse(path)
    }

    /// Resolve a document reference
    fn doc(&self, path: &str) -> Result<DocumentRef> {
        DocumentRef::parse(path)
    }

    /// Compose a query
    fn query(&self, collection: CollectionRef, constraints: Vec<QueryConstraint>) -> Query {
        Query::new(collection, constraints)
    }

    /// Fetch the current result set of a query
    async fn get_docs(&self, query: &Query) -> Result<QuerySnapshot>;

    /// Fetch the current state of a document (missing documents are not an error)
    async fn get_doc(&self, doc: &DocumentRef) -> Result<DocumentSnapshot>;

    /// Listen to a query: current result set first, then one snapshot per change
    fn listen_query(&self, query: Query) -> SnapshotStream<QuerySnapshot>;

    /// Listen to a document: current state first, then one snapshot per change
    fn listen_doc(&self, doc: DocumentRef) -> SnapshotStream<DocumentSnapshot>;

    /// Store a new document under a driver-assigned id
    async fn add_doc(&self, collection: &CollectionRef, data: Document) -> Result<DocumentRef>;

    /// Create or fully replace a document
    async fn set_doc(&self, doc: &DocumentRef, data: Document) -> Result<()>;

    /// Merge fields into an existing document; dotted keys address nested fields.
    /// Fails with `Error::NotFound` when the document does not exist.
    async fn update_doc(&self, doc: &DocumentRef, data: Document) -> Result<()>;

    /// Remove a document; removing a missing document succeeds
    async fn delete_doc(&self, doc: &DocumentRef) -> Result<()>;

    /// Apply all writes atomically, or none of them
    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> Result<()>;

    /// Current time as the store sees it
    fn server_timestamp(&self) -> Timestamp {
        Timestamp::now()
    }
}
