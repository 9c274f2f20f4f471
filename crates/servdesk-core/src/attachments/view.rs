//! Render model for attachment lists.

use serde::Serialize;

use super::preview::PreviewAllocator;
use super::registry::AttachmentRegistry;
use crate::media::attachment_kind;
use crate::models::{AttachmentEntry, EntryId, EntryOrigin};
use crate::util::format_size;

/// Visual state of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Stored,
    PendingDeletion,
    PendingUpload,
}

impl EntryStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Stored => "stored",
            Self::PendingDeletion => "pending deletion",
            Self::PendingUpload => "pending upload",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentRow {
    pub id: EntryId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_id: Option<String>,
    pub name: String,
    pub mime_type: String,
    pub kind: &'static str,
    pub size_bytes: u64,
    pub size_label: String,
    pub status: EntryStatus,
    /// Local preview for new entries, stored URL for existing ones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_uri: Option<String>,
}

impl AttachmentRow {
    pub fn from_entry(entry: &AttachmentEntry) -> Self {
        let status = match entry.origin() {
            EntryOrigin::New => EntryStatus::PendingUpload,
            EntryOrigin::Existing if entry.is_marked_for_deletion() => EntryStatus::PendingDeletion,
            EntryOrigin::Existing => EntryStatus::Stored,
        };
        let preview_uri = entry
            .preview_handle()
            .map(|handle| handle.uri().to_string())
            .or_else(|| entry.url().map(str::to_string));

        Self {
            id: entry.id(),
            server_id: entry.server_id().map(str::to_string),
            name: entry.name().to_string(),
            mime_type: entry.mime_type().to_string(),
            kind: attachment_kind(entry.mime_type()).label(),
            size_bytes: entry.size_bytes(),
            size_label: format_size(entry.size_bytes()),
            status,
            preview_uri,
        }
    }
}

pub fn rows<A: PreviewAllocator>(registry: &AttachmentRegistry<A>) -> Vec<AttachmentRow> {
    registry
        .entries()
        .iter()
        .map(AttachmentRow::from_entry)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachments::preview::tests::CountingPreviews;
    use crate::config::FormKind;
    use crate::models::{LocalFile, ServerAttachment};

    #[test]
    fn rows_reflect_entry_state() {
        let mut registry =
            AttachmentRegistry::with_allocator(FormKind::Job.default_limits(), CountingPreviews::default())
                .unwrap();
        registry.hydrate([
            ServerAttachment {
                server_id: "kept".to_string(),
                name: "wiring.pdf".to_string(),
                mime_type: "application/pdf".to_string(),
                size_bytes: 2048,
                url: "https://files.example.com/kept".to_string(),
            },
            ServerAttachment {
                server_id: "gone".to_string(),
                name: "old.png".to_string(),
                mime_type: "image/png".to_string(),
                size_bytes: 10,
                url: String::new(),
            },
        ]);
        let gone = registry.find_by_server_id("gone").unwrap().id();
        registry.remove_entry(gone).unwrap();
        registry.add_files([LocalFile::new("site.jpg", None, vec![0_u8; 1536]).unwrap()]);

        let rows = rows(&registry);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].status, EntryStatus::Stored);
        assert_eq!(rows[0].kind, "file");
        assert_eq!(rows[0].size_label, "2.0 KB");
        assert_eq!(
            rows[0].preview_uri.as_deref(),
            Some("https://files.example.com/kept")
        );

        assert_eq!(rows[1].status, EntryStatus::PendingDeletion);
        assert_eq!(rows[1].preview_uri, None);

        assert_eq!(rows[2].status, EntryStatus::PendingUpload);
        assert_eq!(rows[2].kind, "image");
        assert_eq!(rows[2].server_id, None);
        assert!(rows[2].preview_uri.as_deref().unwrap().starts_with("blob:"));
        assert_eq!(EntryStatus::PendingUpload.label(), "pending upload");
    }
}
