//! Attachment entry model

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::attachments::PreviewHandle;
use crate::error::{Error, Result};
use crate::media::infer_attachment_mime_type;
use crate::util::byte_len;

/// Local key for an entry in a form session, using UUID v7.
///
/// Distinct from the server-assigned id: new entries have no server id yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryId(Uuid);

impl EntryId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Attachment metadata as returned by the server for a parent record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAttachment {
    /// Identifier the server needs to delete this attachment.
    pub server_id: String,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    /// Where the stored file can be fetched for display.
    #[serde(default)]
    pub url: String,
}

/// A file picked locally that has not been uploaded yet.
#[derive(Clone, PartialEq, Eq)]
pub struct LocalFile {
    name: String,
    mime_type: String,
    bytes: Arc<[u8]>,
}

impl LocalFile {
    /// Build a local file, inferring the MIME type when the declared one is
    /// missing or too generic.
    pub fn new(
        name: impl Into<String>,
        content_type: Option<&str>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment file name cannot be empty".to_string(),
            ));
        }
        let mime_type = infer_attachment_mime_type(content_type, &name);

        Ok(Self {
            name,
            mime_type,
            bytes: bytes.into(),
        })
    }

    /// Read a file from disk, naming it after the final path component.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                Error::InvalidInput(format!("Path has no usable file name: {}", path.display()))
            })?
            .to_string();
        let bytes = std::fs::read(path)?;
        Self::new(name, None, bytes)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size_bytes(&self) -> u64 {
        byte_len(self.bytes.len())
    }
}

impl fmt::Debug for LocalFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size_bytes", &self.bytes.len())
            .finish()
    }
}

/// Where an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOrigin {
    /// Hydrated from server data.
    Existing,
    /// Selected locally, not yet uploaded.
    New,
}

/// Origin-specific state. Keeping it tagged makes a server id on a new
/// entry, or a deletion mark on one, unrepresentable.
#[derive(Debug)]
pub(crate) enum EntrySource {
    Existing {
        server_id: String,
        url: String,
        marked_for_deletion: bool,
    },
    New {
        file: LocalFile,
        preview: Option<PreviewHandle>,
    },
}

/// One attachment tracked by a form session.
#[derive(Debug)]
pub struct AttachmentEntry {
    id: EntryId,
    name: String,
    mime_type: String,
    size_bytes: u64,
    pub(crate) source: EntrySource,
}

impl AttachmentEntry {
    pub(crate) fn existing(attachment: ServerAttachment) -> Self {
        Self {
            id: EntryId::new(),
            name: attachment.name,
            mime_type: attachment.mime_type,
            size_bytes: attachment.size_bytes,
            source: EntrySource::Existing {
                server_id: attachment.server_id,
                url: attachment.url,
                marked_for_deletion: false,
            },
        }
    }

    pub(crate) fn new_local(file: LocalFile) -> Self {
        Self {
            id: EntryId::new(),
            name: file.name().to_string(),
            mime_type: file.mime_type().to_string(),
            size_bytes: file.size_bytes(),
            source: EntrySource::New {
                file,
                preview: None,
            },
        }
    }

    pub const fn id(&self) -> EntryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub const fn origin(&self) -> EntryOrigin {
        match self.source {
            EntrySource::Existing { .. } => EntryOrigin::Existing,
            EntrySource::New { .. } => EntryOrigin::New,
        }
    }

    /// Present iff the entry came from the server.
    pub fn server_id(&self) -> Option<&str> {
        match &self.source {
            EntrySource::Existing { server_id, .. } => Some(server_id),
            EntrySource::New { .. } => None,
        }
    }

    /// Stored URL for existing entries.
    pub fn url(&self) -> Option<&str> {
        match &self.source {
            EntrySource::Existing { url, .. } if !url.is_empty() => Some(url),
            _ => None,
        }
    }

    /// Always `false` for new entries.
    pub const fn is_marked_for_deletion(&self) -> bool {
        matches!(
            self.source,
            EntrySource::Existing {
                marked_for_deletion: true,
                ..
            }
        )
    }

    /// Counts towards the per-form file limit.
    pub const fn is_visible(&self) -> bool {
        !self.is_marked_for_deletion()
    }

    pub const fn preview_handle(&self) -> Option<&PreviewHandle> {
        match &self.source {
            EntrySource::New { preview, .. } => preview.as_ref(),
            EntrySource::Existing { .. } => None,
        }
    }

    /// The underlying file for new entries.
    pub const fn local_file(&self) -> Option<&LocalFile> {
        match &self.source {
            EntrySource::New { file, .. } => Some(file),
            EntrySource::Existing { .. } => None,
        }
    }
}
