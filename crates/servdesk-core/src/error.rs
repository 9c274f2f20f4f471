//! Error types for servdesk-core

use thiserror::Error;

use crate::models::EntryId;

/// Result type alias using servdesk-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in servdesk-core operations
///
/// Per-file validation rejections are not errors; they are reported through
/// [`crate::attachments::AddFilesOutcome`].
#[derive(Error, Debug)]
pub enum Error {
    /// No entry with this local id exists in the registry
    #[error("Attachment not found: {0}")]
    EntryNotFound(EntryId),

    /// Operation only applies to attachments already stored on the server
    #[error("Attachment {0} has not been uploaded yet")]
    NotStoredAttachment(EntryId),

    /// Restoring the attachment would exceed the per-form file limit
    #[error("Cannot keep more than {max_files} attachments")]
    CapacityExceeded { max_files: usize },

    /// A submission is outstanding; the form is read-only until it settles
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    /// `finish_submit` was called without a matching `begin_submit`
    #[error("No submission is pending")]
    NoSubmissionPending,

    /// The submission collaborator rejected the change-set
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Attachment limits are not usable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
