/// Store addressing: slash-separated resource paths and the two reference kinds
///
/// Collection paths have an odd number of segments (`users`, `users/u1/posts`),
/// document paths an even number (`users/u1`). References are plain values and
/// are constructed fresh for every call.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parsed, non-empty path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourcePath {
    segments: Vec<String>,
}

impl ResourcePath {
    /// Parse a path. Leading and trailing slashes are ignored; empty inner
    /// segments are rejected.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidPath(format!("empty path: {:?}", path)));
        }

        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(Error::InvalidPath(format!("empty segment in path: {:?}", path)));
        }

        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Last segment
    pub fn last(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path without its last segment (None for single-segment paths)
    pub fn parent(&self) -> Option<ResourcePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Append a child segment
    pub fn child(&self, segment: &str) -> Result<ResourcePath> {
        if segment.is_empty() || segment.contains('/') {
            return Err(Error::InvalidPath(format!("invalid path segment: {:?}", segment)));
        }
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

/// Reference to a collection (zero or more documents)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    path: ResourcePath,
}

impl CollectionRef {
    pub fn new(path: ResourcePath) -> Result<Self> {
        if path.len() % 2 == 0 {
            return Err(Error::InvalidPath(format!(
                "collection path must have an odd number of segments: {}",
                path
            )));
        }
        Ok(Self { path })
    }

    pub fn parse(path: &str) -> Result<Self> {
        Self::new(ResourcePath::parse(path)?)
    }

    /// Collection id (last segment)
    pub fn id(&self) -> &str {
        self.path.last()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Document containing this sub-collection, if any
    pub fn parent(&self) -> Option<DocumentRef> {
        self.path.parent().map(|path| DocumentRef { path })
    }

    /// Reference a document inside this collection
    pub fn doc(&self, id: &str) -> Result<DocumentRef> {
        Ok(DocumentRef {
            path: self.path.child(id)?,
        })
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}

/// Reference to exactly one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    path: ResourcePath,
}

impl DocumentRef {
    pub fn new(path: ResourcePath) -> Result<Self> {
        if path.len() % 2 != 0 {
            return Err(Error::InvalidPath(format!(
                "document path must have an even number of segments: {}",
                path
            )));
        }
        Ok(Self { path })
    }

    pub fn parse(path: &str) -> Result<Self> {
        Self::new(ResourcePath::parse(path)?)
    }

    /// Document id (last segment)
    pub fn id(&self) -> &str {
        self.path.last()
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Collection that holds this document
    pub fn parent(&self) -> CollectionRef {
        let segments = self.path.segments[..self.path.segments.len() - 1].to_vec();
        CollectionRef {
            path: ResourcePath { segments },
        }
    }

    /// Reference a sub-collection of this document
    pub fn collection(&self, id: &str) -> Result<CollectionRef> {
        Ok(CollectionRef {
            path: self.path.child(id)?,
        })
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.path.fmt(f)
    }
}
