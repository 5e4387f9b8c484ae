use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("duplicate document name '{name}' in collection '{collection}'")]
    DuplicateName { collection: String, name: String },

    #[error("duplicate collection name '{name}' ({first} and {second})")]
    DuplicateCollection {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("malformed document at {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("collection '{collection}' not found")]
    CollectionNotFound { collection: String },

    #[error("document '{name}' not found in collection '{collection}'")]
    NotFound { collection: String, name: String },

    #[error("document name '{name}' is ambiguous; found in: {}", .collections.join(", "))]
    Ambiguous {
        name: String,
        collections: Vec<String>,
    },

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    #[must_use]
    pub fn malformed(path: &Path, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    #[must_use]
    pub fn not_found(collection: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            collection: collection.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn collection_not_found(collection: impl Into<String>) -> Self {
        Self::CollectionNotFound {
            collection: collection.into(),
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }

    /// Whether the error comes from a lookup miss rather than a broken tree.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CollectionNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
