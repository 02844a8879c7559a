use thiserror::Error;

/// Errors surfaced by [`MaterialStore`](crate::MaterialStore) implementations.
///
/// Display strings are returned to HTTP clients verbatim, so they read like
/// the messages a document database driver would produce.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The identifier is not a valid ObjectId.
    #[error("Cast to ObjectId failed for value \"{0}\" (type string) at path \"_id\" for model \"Material\"")]
    InvalidId(String),

    /// A record addressed by a write vanished before the write landed.
    #[error("No document found for query \"{{ _id: \"{0}\" }}\" on model \"Material\"")]
    NotFound(String),

    /// One or more fields could not be cast to their declared type.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Connection(String),

    #[error("{0}")]
    Backend(String),

    #[error("{0}")]
    Serialization(String),
}

impl StoreError {
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    pub fn connection<E: std::fmt::Display>(err: E) -> Self {
        Self::Connection(err.to_string())
    }
}

impl From<bson::ser::Error> for StoreError {
    fn from(e: bson::ser::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

impl From<bson::de::Error> for StoreError {
    fn from(e: bson::de::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}
