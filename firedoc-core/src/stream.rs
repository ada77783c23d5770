/// Change records fanned out to listeners
///
/// Every committed write (or batch) produces one `ChangeSet` naming the
/// documents it touched. Listeners use it only to decide whether to re-read;
/// the snapshot they emit always reflects current state.

use crate::path::{CollectionRef, DocumentRef};

/// Change event type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new document was created
    Added,
    /// An existing document was replaced or merged into
    Modified,
    /// A document was deleted
    Removed,
}

/// A single document change
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub kind: ChangeKind,
    pub doc: DocumentRef,
}

impl DocumentChange {
    pub fn new(kind: ChangeKind, doc: DocumentRef) -> Self {
        Self { kind, doc }
    }
}

/// All changes applied by one commit
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeSet {
    /// Commit sequence number (monotonically increasing per driver)
    pub sequence_number: u64,
    pub changes: Vec<DocumentChange>,
}

impl ChangeSet {
    pub fn new(sequence_number: u64, changes: Vec<DocumentChange>) -> Self {
        Self {
            sequence_number,
            changes,
        }
    }

    /// Number of changes of the given kind
    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|change| change.kind == kind).count()
    }

    /// True if any change is to a document directly inside `collection`
    pub fn touches_collection(&self, collection: &CollectionRef) -> bool {
        self.changes
            .iter()
            .any(|change| change.doc.parent() == *collection)
    }

    pub fn touches_doc(&self, doc: &DocumentRef) -> bool {
        self.changes.iter().any(|change| change.doc == *doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(path: &str) -> DocumentRef {
        DocumentRef::parse(path).unwrap()
    }

    #[test]
    fn test_touches_collection_is_direct_only() {
        let set = ChangeSet::new(
            1,
            vec![DocumentChange::new(ChangeKind::Added, doc("users/u1/posts/p1"))],
        );

        assert!(set.touches_collection(&CollectionRef::parse("users/u1/posts").unwrap()));
        assert!(!set.touches_collection(&CollectionRef::parse("users").unwrap()));
    }

    #[test]
    fn test_touches_doc() {
        let set = ChangeSet::new(
            7,
            vec![
                DocumentChange::new(ChangeKind::Modified, doc("users/u1")),
                DocumentChange::new(ChangeKind::Removed, doc("users/u2")),
            ],
        );

        assert_eq!(set.sequence_number, 7);
        assert!(set.touches_doc(&doc("users/u2")));
        assert!(!set.touches_doc(&doc("users/u3")));
    }

    #[test]
    fn test_count_by_kind() {
        let set = ChangeSet::new(
            3,
            vec![
                DocumentChange::new(ChangeKind::Added, doc("users/u1")),
                DocumentChange::new(ChangeKind::Added, doc("users/u2")),
                DocumentChange::new(ChangeKind::Removed, doc("users/u3")),
            ],
        );

        assert_eq!(set.count(ChangeKind::Added), 2);
        assert_eq!(set.count(ChangeKind::Modified), 0);
        assert_eq!(set.count(ChangeKind::Removed), 1);
    }
}
