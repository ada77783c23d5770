/// In-memory document store driver for testing and embedded use
///
/// Implements the full `DocumentDriver` contract in process: documents are
/// kept per collection, ordered by id, and every commit is fanned out to
/// listeners over a broadcast channel. All data is lost when the last clone
/// of the driver is dropped.

use crate::{
    batch::BatchWrite,
    config::DriverConfig,
    driver::{DocumentDriver, DocumentSnapshot, QuerySnapshot, SnapshotStream},
    path::{CollectionRef, DocumentRef},
    query::Query,
    stream::{ChangeKind, ChangeSet, DocumentChange},
    types::Document,
    Error, Result,
};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, trace};

const AUTO_ID_LENGTH: usize = 20;

/// collection path -> document id -> fields
type Collections = BTreeMap<String, BTreeMap<String, Document>>;

struct StoreState {
    collections: Collections,
    next_sequence: u64,
}

struct MemoryInner {
    state: RwLock<StoreState>,
    changes: broadcast::Sender<ChangeSet>,
    config: DriverConfig,
}

/// In-memory driver
#[derive(Clone)]
pub struct MemoryDriver {
    inner: Arc<MemoryInner>,
}

impl MemoryDriver {
    /// Create a driver with the default configuration
    pub fn new() -> Self {
        Self::build(DriverConfig::default())
    }

    /// Create a driver with a custom configuration
    pub fn with_config(config: DriverConfig) -> Result<Self> {
        config.validate().map_err(Error::InvalidArgument)?;
        Ok(Self::build(config))
    }

    fn build(config: DriverConfig) -> Self {
        let (changes, _) = broadcast::channel(config.change_buffer);
        Self {
            inner: Arc::new(MemoryInner {
                state: RwLock::new(StoreState {
                    collections: BTreeMap::new(),
                    next_sequence: 0,
                }),
                changes,
                config,
            }),
        }
    }

    pub fn config(&self) -> &DriverConfig {
        &self.inner.config
    }

    /// Total number of stored documents across all collections
    pub fn document_count(&self) -> usize {
        let state = self.inner.state.read();
        state.collections.values().map(BTreeMap::len).sum()
    }

    /// Number of live listeners
    pub fn listener_count(&self) -> usize {
        self.inner.changes.receiver_count()
    }
}

impl Default for MemoryDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryDriver")
            .field("config", &self.inner.config)
            .field("documents", &self.document_count())
            .finish()
    }
}

fn auto_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(AUTO_ID_LENGTH);
    id
}

impl MemoryInner {
    fn read_doc(&self, doc: &DocumentRef) -> DocumentSnapshot {
        let state = self.state.read();
        let data = state
            .collections
            .get(&doc.parent().to_string())
            .and_then(|docs| docs.get(doc.id()))
            .cloned();
        DocumentSnapshot::new(doc.clone(), data)
    }

    fn run_query(&self, query: &Query) -> Result<QuerySnapshot> {
        let state = self.state.read();
        let collection = query.collection();
        let candidates = match state.collections.get(&collection.to_string()) {
            Some(docs) => docs.iter().map(|(id, doc)| (id.as_str(), doc)).collect(),
            None => Vec::new(),
        };

        let docs = query
            .apply(candidates)
            .into_iter()
            .map(|(id, data)| Ok(DocumentSnapshot::new(collection.doc(id)?, Some(data.clone()))))
            .collect::<Result<Vec<_>>>()?;

        Ok(QuerySnapshot::new(docs))
    }

    /// Apply writes under one lock acquisition. Multi-write batches are staged
    /// on a copy so a failing write leaves the store untouched.
    fn commit(&self, writes: Vec<BatchWrite>) -> Result<()> {
        let change_set = {
            let mut state = self.state.write();
            let mut changes = Vec::with_capacity(writes.len());

            if writes.len() == 1 {
                for write in writes {
                    changes.extend(apply_write(&mut state.collections, write)?);
                }
            } else {
                let mut staged = state.collections.clone();
                for write in writes {
                    changes.extend(apply_write(&mut staged, write)?);
                }
                state.collections = staged;
            }

            if changes.is_empty() {
                return Ok(());
            }

            state.next_sequence += 1;
            ChangeSet::new(state.next_sequence, changes)
        };

        debug!(
            sequence = change_set.sequence_number,
            added = change_set.count(ChangeKind::Added),
            modified = change_set.count(ChangeKind::Modified),
            removed = change_set.count(ChangeKind::Removed),
            "committed writes"
        );

        // No receivers just means nobody is listening
        let _ = self.changes.send(change_set);
        Ok(())
    }
}

/// Apply one write, validating before mutating
fn apply_write(collections: &mut Collections, write: BatchWrite) -> Result<Option<DocumentChange>> {
    match write {
        BatchWrite::Set { doc, data } => {
            let docs = collections.entry(doc.parent().to_string()).or_default();
            let kind = match docs.insert(doc.id().to_string(), data) {
                Some(_) => ChangeKind::Modified,
                None => ChangeKind::Added,
            };
            Ok(Some(DocumentChange::new(kind, doc)))
        }
        BatchWrite::Update { doc, data } => {
            let existing = collections
                .get_mut(&doc.parent().to_string())
                .and_then(|docs| docs.get_mut(doc.id()))
                .ok_or_else(|| Error::NotFound(format!("no document to update: {}", doc)))?;
            for (field, value) in data {
                existing.set_path(&field, value);
            }
            Ok(Some(DocumentChange::new(ChangeKind::Modified, doc)))
        }
        BatchWrite::Delete { doc } => {
            let parent = doc.parent().to_string();
            let Some(docs) = collections.get_mut(&parent) else {
                return Ok(None);
            };
            if docs.remove(doc.id()).is_none() {
                return Ok(None);
            }
            if docs.is_empty() {
                collections.remove(&parent);
            }
            Ok(Some(DocumentChange::new(ChangeKind::Removed, doc)))
        }
    }
}

/// Wait for a relevant change set. Returns false once the channel closes.
///
/// A lagged receiver has missed change sets it cannot inspect, so it reports
/// a change and lets the listener re-read current state.
async fn wait_for_change<F>(rx: &mut broadcast::Receiver<ChangeSet>, relevant: F) -> bool
where
    F: Fn(&ChangeSet) -> bool,
{
    loop {
        match rx.recv().await {
            Ok(set) if relevant(&set) => return true,
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "listener lagged, re-reading current state");
                return true;
            }
            Err(RecvError::Closed) => return false,
        }
    }
}

#[async_trait]
impl DocumentDriver for MemoryDriver {
    async fn get_docs(&self, query: &Query) -> Result<QuerySnapshot> {
        self.inner.run_query(query)
    }

    async fn get_doc(&self, doc: &DocumentRef) -> Result<DocumentSnapshot> {
        Ok(self.inner.read_doc(doc))
    }

    fn listen_query(&self, query: Query) -> SnapshotStream<QuerySnapshot> {
        trace!(collection = %query.collection(), "query listener created");
        let inner = Arc::clone(&self.inner);

        stream::unfold(
            (inner, query, None::<broadcast::Receiver<ChangeSet>>),
            |(inner, query, rx)| async move {
                let rx = match rx {
                    // Subscribe before the first read so no commit slips between them
                    None => inner.changes.subscribe(),
                    Some(mut rx) => {
                        let collection = query.collection();
                        if !wait_for_change(&mut rx, |set| set.touches_collection(collection)).await {
                            return None;
                        }
                        rx
                    }
                };
                let snapshot = inner.run_query(&query);
                Some((snapshot, (inner, query, Some(rx))))
            },
        )
        .boxed()
    }

    fn listen_doc(&self, doc: DocumentRef) -> SnapshotStream<DocumentSnapshot> {
        trace!(doc = %doc, "document listener created");
        let inner = Arc::clone(&self.inner);

        stream::unfold(
            (inner, doc, None::<broadcast::Receiver<ChangeSet>>),
            |(inner, doc, rx)| async move {
                let rx = match rx {
                    None => inner.changes.subscribe(),
                    Some(mut rx) => {
                        if !wait_for_change(&mut rx, |set| set.touches_doc(&doc)).await {
                            return None;
                        }
                        rx
                    }
                };
                let snapshot = inner.read_doc(&doc);
                Some((Ok(snapshot), (inner, doc, Some(rx))))
            },
        )
        .boxed()
    }

    async fn add_doc(&self, collection: &CollectionRef, data: Document) -> Result<DocumentRef> {
        let doc = collection.doc(&auto_id())?;
        self.inner.commit(vec![BatchWrite::Set {
            doc: doc.clone(),
            data,
        }])?;
        Ok(doc)
    }

    async fn set_doc(&self, doc: &DocumentRef, data: Document) -> Result<()> {
        self.inner.commit(vec![BatchWrite::Set {
            doc: doc.clone(),
            data,
        }])
    }

    async fn update_doc(&self, doc: &DocumentRef, data: Document) -> Result<()> {
        self.inner.commit(vec![BatchWrite::Update {
            doc: doc.clone(),
            data,
        }])
    }

    async fn delete_doc(&self, doc: &DocumentRef) -> Result<()> {
        self.inner.commit(vec![BatchWrite::Delete { doc: doc.clone() }])
    }

    async fn commit_batch(&self, writes: Vec<BatchWrite>) -> Result<()> {
        let limit = self.inner.config.max_writes_per_batch;
        if writes.len() > limit {
            return Err(Error::ResourceExhausted(format!(
                "batch of {} writes exceeds the limit of {} writes per batch",
                writes.len(),
                limit
            )));
        }
        self.inner.commit(writes)
    }
}
