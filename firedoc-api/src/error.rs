/// Error types for the document store accessor
use thiserror::Error;

/// Message carried by [`Error::DocumentNotFound`]
pub const DOCUMENT_NOT_FOUND_MESSAGE: &str = "firestore-document-not-exist";

#[derive(Error, Debug)]
pub enum Error {
    /// Failure reported by the driver, passed through unchanged
    #[error(transparent)]
    Store(#[from] firedoc_core::Error),

    /// Identifier-inclusive read of a document that does not exist
    #[error("firestore-document-not-exist")]
    DocumentNotFound { path: String },
}

impl Error {
    /// Stable error code; driver errors keep their own codes
    pub fn code(&self) -> &'static str {
        match self {
            Error::Store(err) => err.code(),
            Error::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
        }
    }

    pub fn is_document_not_found(&self) -> bool {
        matches!(self, Error::DocumentNotFound { .. })
    }

    /// The driver error, if this is one
    pub fn as_store(&self) -> Option<&firedoc_core::Error> {
        match self {
            Error::Store(err) => Some(err),
            Error::DocumentNotFound { .. } => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
