//! Content layer errors
//!
//! Failures talking to the content API are reported as-is; nothing in the
//! crate retries. Commands wrap these in `anyhow` on the way out.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Network failure: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Content API returned {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("No {doc_type} document with uid '{uid}'")]
    NotFound { doc_type: String, uid: String },

    #[error("The content API did not advertise a master ref")]
    MissingMasterRef,

    #[error("Invalid uid '{0}': only ASCII letters, digits, '-' and '_' are allowed")]
    InvalidUid(String),

    #[error("Unknown pagination cursor: {0}")]
    UnknownCursor(String),

    #[error("Fixture error: {0}")]
    Fixture(#[from] std::io::Error),
}

impl ContentError {
    /// Whether the error means the requested document does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type ContentResult<T> = std::result::Result<T, ContentError>;
