/// Atomic write batches
///
/// A `WriteBatch` accumulates set/update/delete writes and commits them through
/// the driver as one unit. The batch never enforces the store's per-batch
/// quota; the driver rejects oversized batches at commit.

use crate::driver::DocumentDriver;
use crate::path::DocumentRef;
use crate::types::Document;
use crate::Result;
use std::fmt;
use std::sync::Arc;

/// Single write inside a batch
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    /// Create or fully replace a document
    Set { doc: DocumentRef, data: Document },
    /// Merge fields into an existing document
    Update { doc: DocumentRef, data: Document },
    /// Remove a document
    Delete { doc: DocumentRef },
}

impl BatchWrite {
    pub fn doc(&self) -> &DocumentRef {
        match self {
            BatchWrite::Set { doc, .. } => doc,
            BatchWrite::Update { doc, .. } => doc,
            BatchWrite::Delete { doc } => doc,
        }
    }
}

/// Caller-owned accumulator bound to a driver
pub struct WriteBatch {
    driver: Arc<dyn DocumentDriver>,
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new(driver: Arc<dyn DocumentDriver>) -> Self {
        Self {
            driver,
            writes: Vec::new(),
        }
    }

    /// Queue a create-or-replace
    pub fn set(&mut self, doc: &DocumentRef, data: impl Into<Document>) -> &mut Self {
        self.writes.push(BatchWrite::Set {
            doc: doc.clone(),
            data: data.into(),
        });
        self
    }

    /// Queue a field merge
    pub fn update(&mut self, doc: &DocumentRef, data: impl Into<Document>) -> &mut Self {
        self.writes.push(BatchWrite::Update {
            doc: doc.clone(),
            data: data.into(),
        });
        self
    }

    /// Queue a delete
    pub fn delete(&mut self, doc: &DocumentRef) -> &mut Self {
        self.writes.push(BatchWrite::Delete { doc: doc.clone() });
        self
    }

    /// Number of queued writes
    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn writes(&self) -> &[BatchWrite] {
        &self.writes
    }

    /// Commit all queued writes atomically
    pub async fn commit(self) -> Result<()> {
        self.driver.commit_batch(self.writes).await
    }
}

impl fmt::Debug for WriteBatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteBatch")
            .field("writes", &self.writes)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDriver;
    use crate::types::DocumentBuilder;

    #[test]
    fn test_batch_builder() {
        let driver = Arc::new(MemoryDriver::new());
        let mut batch = WriteBatch::new(driver);
        let a = DocumentRef::parse("users/a").unwrap();
        let b = DocumentRef::parse("users/b").unwrap();

        batch
            .set(&a, DocumentBuilder::new().string("name", "Ann").build())
            .update(&b, DocumentBuilder::new().integer("score", 3).build())
            .delete(&a);

        assert_eq!(batch.len(), 3);
        assert_eq!(batch.writes()[1].doc(), &b);
        assert!(matches!(batch.writes()[2], BatchWrite::Delete { .. }));
    }

    #[tokio::test]
    async fn test_empty_batch_commits() {
        let driver = Arc::new(MemoryDriver::new());
        let batch = WriteBatch::new(driver);
        assert!(batch.is_empty());
        batch.commit().await.unwrap();
    }
}
