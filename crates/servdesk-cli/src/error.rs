use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] servdesk_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Record ID cannot be empty")]
    EmptyRecordId,
    #[error("Record not found for id/prefix: {0}")]
    RecordNotFound(String),
    #[error("{0}")]
    AmbiguousRecordId(String),
    #[error("Attachment not found on record: {0}")]
    AttachmentNotFound(String),
    #[error("Invalid field '{0}': expected key=value")]
    InvalidField(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Record store error: {0}")]
    Store(String),
}
