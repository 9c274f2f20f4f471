//! Per-file type and size checks.

use std::fmt;

use serde::Serialize;

use crate::config::AttachmentLimits;
use crate::media::mime_matches_pattern;
use crate::models::LocalFile;
use crate::util::format_size;

/// Why a candidate file was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectionReason {
    UnsupportedType { mime_type: String },
    TooLarge { size_bytes: u64, max_bytes: u64 },
    CapacityExceeded { max_files: usize },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedType { mime_type } => {
                write!(f, "{mime_type} files are not accepted")
            }
            Self::TooLarge {
                size_bytes,
                max_bytes,
            } => write!(
                f,
                "file is {} (limit: {})",
                format_size(*size_bytes),
                format_size(*max_bytes)
            ),
            Self::CapacityExceeded { max_files } => {
                write!(f, "no more than {max_files} attachments are allowed")
            }
        }
    }
}

/// A rejected file and the reason, ready to show next to the upload control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRejection {
    pub file_name: String,
    #[serde(flatten)]
    pub reason: RejectionReason,
}

impl fmt::Display for FileRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file_name, self.reason)
    }
}

/// Stateless allow-list and size check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileValidator {
    accepted_mime_types: Vec<String>,
    max_file_size_bytes: u64,
}

impl FileValidator {
    pub fn new(limits: &AttachmentLimits) -> Self {
        Self {
            accepted_mime_types: limits.accepted_mime_types.clone(),
            max_file_size_bytes: limits.max_file_size_bytes,
        }
    }

    pub fn validate(&self, file: &LocalFile) -> Result<(), RejectionReason> {
        let mime_type = file.mime_type();
        let accepted = self
            .accepted_mime_types
            .iter()
            .any(|pattern| mime_matches_pattern(mime_type, pattern));
        if !accepted {
            return Err(RejectionReason::UnsupportedType {
                mime_type: mime_type.to_string(),
            });
        }

        let size_bytes = file.size_bytes();
        if size_bytes > self.max_file_size_bytes {
            return Err(RejectionReason::TooLarge {
                size_bytes,
                max_bytes: self.max_file_size_bytes,
            });
        }

        Ok(())
    }
}
