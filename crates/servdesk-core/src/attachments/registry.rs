//! The per-form list of attachment entries.

use serde::Serialize;

use super::assembler::{assemble, ChangeSet};
use super::preview::{PreviewAllocator, PreviewResourceTracker, ThumbnailPreviews};
use super::validator::{FileRejection, FileValidator, RejectionReason};
use crate::config::AttachmentLimits;
use crate::models::{AttachmentEntry, EntryId, EntrySource, LocalFile, ServerAttachment};
use crate::{Error, Result};

/// Result of one `add_files` batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddFilesOutcome {
    /// Local ids of the appended entries, in input order.
    pub accepted: Vec<EntryId>,
    /// Every file that was not appended, in input order.
    pub rejected: Vec<FileRejection>,
}

impl AddFilesOutcome {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// What `remove_entry` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoveOutcome {
    /// A new entry was dropped outright.
    Removed,
    /// An existing entry is now pending deletion.
    MarkedForDeletion,
    /// The existing entry was already pending deletion.
    AlreadyMarked,
}

/// Single source of truth for one form session's attachments.
///
/// Dropping the registry releases every outstanding preview.
#[derive(Debug)]
pub struct AttachmentRegistry<A: PreviewAllocator = ThumbnailPreviews> {
    limits: AttachmentLimits,
    validator: FileValidator,
    entries: Vec<AttachmentEntry>,
    previews: PreviewResourceTracker<A>,
}

impl AttachmentRegistry<ThumbnailPreviews> {
    pub fn new(limits: AttachmentLimits) -> Result<Self> {
        Self::with_allocator(limits, ThumbnailPreviews::default())
    }
}

impl<A: PreviewAllocator> AttachmentRegistry<A> {
    pub fn with_allocator(limits: AttachmentLimits, allocator: A) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            validator: FileValidator::new(&limits),
            limits,
            entries: Vec::new(),
            previews: PreviewResourceTracker::new(allocator),
        })
    }

    /// Replace everything with entries built from server data.
    ///
    /// Server data is trusted and is not validated against the limits.
    pub fn hydrate(&mut self, attachments: impl IntoIterator<Item = ServerAttachment>) {
        self.release_all_previews();
        self.entries = attachments
            .into_iter()
            .map(AttachmentEntry::existing)
            .collect();

        if self.visible_count() > self.limits.max_files {
            tracing::warn!(
                count = self.entries.len(),
                max_files = self.limits.max_files,
                "Server returned more attachments than the form allows"
            );
        }
    }

    /// Validate and append a batch of local files.
    ///
    /// Invalid files are skipped. Once the form is full, every later valid
    /// file in the batch is rejected with `CapacityExceeded`. Accepted files
    /// are appended together at the end.
    pub fn add_files(&mut self, files: impl IntoIterator<Item = LocalFile>) -> AddFilesOutcome {
        let mut remaining = self.remaining_capacity();
        let mut staged: Vec<AttachmentEntry> = Vec::new();
        let mut outcome = AddFilesOutcome::default();

        for file in files {
            let reason = match self.validator.validate(&file) {
                Err(reason) => Some(reason),
                Ok(()) if remaining == 0 => Some(RejectionReason::CapacityExceeded {
                    max_files: self.limits.max_files,
                }),
                Ok(()) => None,
            };

            if let Some(reason) = reason {
                tracing::warn!(file = file.name(), "Attachment rejected: {reason}");
                outcome.rejected.push(FileRejection {
                    file_name: file.name().to_string(),
                    reason,
                });
                continue;
            }

            let mut entry = AttachmentEntry::new_local(file);
            self.previews.allocate(&mut entry);
            remaining -= 1;
            staged.push(entry);
        }

        outcome.accepted = staged.iter().map(AttachmentEntry::id).collect();
        tracing::debug!(
            accepted = outcome.accepted.len(),
            rejected = outcome.rejected.len(),
            "Added attachment batch"
        );
        self.entries.extend(staged);
        outcome
    }

    /// Drop a new entry, or mark an existing one for deletion.
    pub fn remove_entry(&mut self, id: EntryId) -> Result<RemoveOutcome> {
        let index = self.index_of(id)?;

        let outcome = match &mut self.entries[index].source {
            EntrySource::Existing {
                marked_for_deletion: true,
                ..
            } => RemoveOutcome::AlreadyMarked,
            EntrySource::Existing {
                marked_for_deletion,
                ..
            } => {
                *marked_for_deletion = true;
                RemoveOutcome::MarkedForDeletion
            }
            EntrySource::New { .. } => {
                let mut entry = self.entries.remove(index);
                self.previews.release(&mut entry);
                RemoveOutcome::Removed
            }
        };

        tracing::debug!(entry_id = %id, ?outcome, "Removed attachment");
        Ok(outcome)
    }

    /// Undo a pending deletion.
    ///
    /// Fails when the entry is new, or when restoring it would take the form
    /// over its file limit.
    pub fn unmark_deletion(&mut self, id: EntryId) -> Result<()> {
        let index = self.index_of(id)?;
        let at_capacity = self.remaining_capacity() == 0;
        let max_files = self.limits.max_files;

        match &mut self.entries[index].source {
            EntrySource::New { .. } => Err(Error::NotStoredAttachment(id)),
            EntrySource::Existing {
                marked_for_deletion: false,
                ..
            } => Ok(()),
            EntrySource::Existing { .. } if at_capacity => {
                Err(Error::CapacityExceeded { max_files })
            }
            EntrySource::Existing {
                marked_for_deletion,
                ..
            } => {
                *marked_for_deletion = false;
                tracing::debug!(entry_id = %id, "Restored attachment");
                Ok(())
            }
        }
    }

    /// Start over from the server's canonical list after a successful submit.
    pub fn reset(&mut self, attachments: impl IntoIterator<Item = ServerAttachment>) {
        self.hydrate(attachments);
        tracing::debug!(count = self.entries.len(), "Attachment registry reset");
    }

    /// Release every preview and forget all entries (form closed).
    pub fn discard(&mut self) {
        self.release_all_previews();
        self.entries.clear();
    }

    fn release_all_previews(&mut self) {
        for entry in &mut self.entries {
            self.previews.release(entry);
        }
    }

    fn index_of(&self, id: EntryId) -> Result<usize> {
        self.entries
            .iter()
            .position(|entry| entry.id() == id)
            .ok_or(Error::EntryNotFound(id))
    }

    /// Derive the change-set without mutating anything.
    pub fn assemble(&self) -> ChangeSet {
        assemble(self)
    }

    /// All entries in display order, including ones pending deletion.
    pub fn entries(&self) -> &[AttachmentEntry] {
        &self.entries
    }

    pub fn get(&self, id: EntryId) -> Option<&AttachmentEntry> {
        self.entries.iter().find(|entry| entry.id() == id)
    }

    pub fn find_by_server_id(&self, server_id: &str) -> Option<&AttachmentEntry> {
        self.entries
            .iter()
            .find(|entry| entry.server_id() == Some(server_id))
    }

    /// New entries plus existing entries not pending deletion.
    pub fn visible_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.is_visible()).count()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.limits.max_files.saturating_sub(self.visible_count())
    }

    pub fn pending_deletion_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_marked_for_deletion())
            .count()
    }

    pub fn pending_upload_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.local_file().is_some())
            .count()
    }

    /// Whether submitting would change anything on the server.
    pub fn has_changes(&self) -> bool {
        self.pending_upload_count() > 0 || self.pending_deletion_count() > 0
    }

    pub const fn limits(&self) -> &AttachmentLimits {
        &self.limits
    }

    pub const fn previews(&self) -> &PreviewResourceTracker<A> {
        &self.previews
    }
}

impl<A: PreviewAllocator> Drop for AttachmentRegistry<A> {
    fn drop(&mut self) {
        self.discard();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::attachments::preview::tests::{CountingPreviews, PreviewLog};
    use crate::models::EntryOrigin;

    fn limits(max_files: usize) -> AttachmentLimits {
        AttachmentLimits {
            accepted_mime_types: vec!["image/*".to_string(), "application/pdf".to_string()],
            max_file_size_bytes: 1024,
            max_files,
        }
    }

    fn registry(max_files: usize) -> (AttachmentRegistry<CountingPreviews>, Rc<RefCell<PreviewLog>>) {
        let previews = CountingPreviews::default();
        let log = Rc::clone(&previews.log);
        (
            AttachmentRegistry::with_allocator(limits(max_files), previews).unwrap(),
            log,
        )
    }

    fn stored(server_id: &str) -> ServerAttachment {
        ServerAttachment {
            server_id: server_id.to_string(),
            name: format!("{server_id}.pdf"),
            mime_type: "application/pdf".to_string(),
            size_bytes: 100,
            url: format!("https://files.example.com/{server_id}"),
        }
    }

    fn image(name: &str) -> LocalFile {
        LocalFile::new(name, Some("image/png"), vec![7_u8; 16]).unwrap()
    }

    fn pdf(name: &str) -> LocalFile {
        LocalFile::new(name, None, vec![1_u8; 16]).unwrap()
    }

    fn entry_for(registry: &AttachmentRegistry<CountingPreviews>, server_id: &str) -> EntryId {
        registry.find_by_server_id(server_id).unwrap().id()
    }

    #[test]
    fn rejects_invalid_limits() {
        assert!(AttachmentRegistry::with_allocator(limits(0), CountingPreviews::default()).is_err());
    }

    #[test]
    fn hydrate_builds_existing_entries_in_order() {
        let (mut registry, _) = registry(3);
        registry.hydrate([stored("a"), stored("b")]);

        let ids: Vec<_> = registry
            .entries()
            .iter()
            .map(|entry| entry.server_id().unwrap())
            .collect();
        assert_eq!(ids, ["a", "b"]);
        assert!(registry
            .entries()
            .iter()
            .all(|entry| entry.origin() == EntryOrigin::Existing));
        assert_eq!(registry.visible_count(), 2);
        assert!(!registry.has_changes());
    }

    #[test]
    fn hydrate_trusts_server_data_beyond_limits() {
        let (mut registry, _) = registry(1);
        registry.hydrate([stored("a"), stored("b")]);

        assert_eq!(registry.visible_count(), 2);
        assert_eq!(registry.remaining_capacity(), 0);

        let outcome = registry.add_files([pdf("extra.pdf")]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(
            outcome.rejected[0].reason,
            RejectionReason::CapacityExceeded { max_files: 1 }
        );
    }

    #[test]
    fn capacity_scenario_with_two_existing_files() {
        let (mut registry, _) = registry(3);
        registry.hydrate([stored("a"), stored("b")]);

        let outcome = registry.add_files([image("img.png")]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(registry.visible_count(), 3);

        let outcome = registry.add_files([pdf("another.pdf")]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(
            outcome.rejected,
            vec![FileRejection {
                file_name: "another.pdf".to_string(),
                reason: RejectionReason::CapacityExceeded { max_files: 3 },
            }]
        );
        assert_eq!(registry.visible_count(), 3);
    }

    #[test]
    fn batch_keeps_valid_files_and_reports_all_errors() {
        let (mut registry, _) = registry(2);

        let outcome = registry.add_files([
            LocalFile::new("setup.exe", None, vec![0_u8; 4]).unwrap(),
            image("first.png"),
            LocalFile::new("huge.png", None, vec![0_u8; 2048]).unwrap(),
            pdf("second.pdf"),
            pdf("third.pdf"),
            LocalFile::new("late.exe", None, vec![0_u8; 4]).unwrap(),
        ]);

        assert_eq!(outcome.accepted.len(), 2);
        let reasons: Vec<_> = outcome
            .rejected
            .iter()
            .map(|rejection| (rejection.file_name.as_str(), &rejection.reason))
            .collect();
        assert!(matches!(
            reasons[0],
            ("setup.exe", RejectionReason::UnsupportedType { .. })
        ));
        assert!(matches!(
            reasons[1],
            ("huge.png", RejectionReason::TooLarge { size_bytes: 2048, max_bytes: 1024 })
        ));
        assert!(matches!(
            reasons[2],
            ("third.pdf", RejectionReason::CapacityExceeded { max_files: 2 })
        ));
        assert!(matches!(
            reasons[3],
            ("late.exe", RejectionReason::UnsupportedType { .. })
        ));

        let names: Vec<_> = registry.entries().iter().map(AttachmentEntry::name).collect();
        assert_eq!(names, ["first.png", "second.pdf"]);
        assert_eq!(
            registry.entries()[0].id(),
            outcome.accepted[0],
            "accepted ids follow input order"
        );
    }

    #[test]
    fn previews_allocated_only_for_images() {
        let (mut registry, log) = registry(5);
        registry.add_files([image("a.png"), pdf("b.pdf")]);

        assert!(registry.entries()[0].preview_handle().is_some());
        assert!(registry.entries()[1].preview_handle().is_none());
        assert_eq!(log.borrow().allocated.len(), 1);
    }

    #[test]
    fn removing_existing_entry_marks_it_and_is_idempotent() {
        let (mut registry, _) = registry(3);
        registry.hydrate([stored("a"), stored("b")]);
        let a = entry_for(&registry, "a");

        assert_eq!(registry.remove_entry(a).unwrap(), RemoveOutcome::MarkedForDeletion);
        let first = (
            registry.visible_count(),
            registry.pending_deletion_count(),
            registry.assemble(),
        );
        assert_eq!(registry.remove_entry(a).unwrap(), RemoveOutcome::AlreadyMarked);
        let second = (
            registry.visible_count(),
            registry.pending_deletion_count(),
            registry.assemble(),
        );

        assert_eq!(first, second);
        assert_eq!(registry.visible_count(), 2 - 1);
        assert!(registry.get(a).unwrap().is_marked_for_deletion());
        assert_eq!(registry.entries().len(), 2, "marked entries stay listed");
        assert_eq!(registry.assemble().ids_to_delete, vec!["a".to_string()]);
        assert!(registry.assemble().files_to_upload.is_empty());
    }

    #[test]
    fn removing_new_entry_deletes_it_and_releases_preview() {
        let (mut registry, log) = registry(3);
        let outcome = registry.add_files([image("draft.png")]);
        let id = outcome.accepted[0];

        assert_eq!(registry.remove_entry(id).unwrap(), RemoveOutcome::Removed);
        assert!(registry.get(id).is_none());
        assert!(registry.assemble().files_to_upload.is_empty());
        assert_eq!(log.borrow().released.len(), 1);
        assert!(log.borrow().balanced());
        assert!(matches!(
            registry.remove_entry(id),
            Err(Error::EntryNotFound(missing)) if missing == id
        ));
    }

    #[test]
    fn marking_frees_capacity_for_new_files() {
        let (mut registry, _) = registry(2);
        registry.hydrate([stored("a"), stored("b")]);
        registry.remove_entry(entry_for(&registry, "a")).unwrap();

        let outcome = registry.add_files([pdf("replacement.pdf")]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(registry.visible_count(), 2);
    }

    #[test]
    fn unmark_restores_existing_entry() {
        let (mut registry, _) = registry(3);
        registry.hydrate([stored("a")]);
        let a = entry_for(&registry, "a");

        registry.remove_entry(a).unwrap();
        registry.unmark_deletion(a).unwrap();
        assert!(!registry.get(a).unwrap().is_marked_for_deletion());
        assert!(registry.assemble().ids_to_delete.is_empty());

        // unmarking an unmarked entry is a no-op
        registry.unmark_deletion(a).unwrap();
        assert_eq!(registry.visible_count(), 1);
    }

    #[test]
    fn unmark_rejects_new_entries() {
        let (mut registry, _) = registry(3);
        let id = registry.add_files([pdf("new.pdf")]).accepted[0];
        assert!(matches!(
            registry.unmark_deletion(id),
            Err(Error::NotStoredAttachment(_))
        ));
    }

    #[test]
    fn unmark_refuses_to_exceed_capacity() {
        let (mut registry, _) = registry(2);
        registry.hydrate([stored("a"), stored("b")]);
        let a = entry_for(&registry, "a");
        registry.remove_entry(a).unwrap();
        registry.add_files([pdf("fills-the-slot.pdf")]);

        assert!(matches!(
            registry.unmark_deletion(a),
            Err(Error::CapacityExceeded { max_files: 2 })
        ));
        assert!(registry.get(a).unwrap().is_marked_for_deletion());
        assert_eq!(registry.visible_count(), 2);
    }

    #[test]
    fn reset_mirrors_server_response_and_releases_previews() {
        let (mut registry, log) = registry(5);
        registry.hydrate([stored("a"), stored("b")]);
        registry.remove_entry(entry_for(&registry, "a")).unwrap();
        registry.add_files([image("one.png"), image("two.png")]);

        registry.reset([stored("b"), stored("c"), stored("d")]);

        let server_ids: Vec<_> = registry
            .entries()
            .iter()
            .map(|entry| entry.server_id().unwrap())
            .collect();
        assert_eq!(server_ids, ["b", "c", "d"]);
        assert_eq!(registry.pending_deletion_count(), 0);
        assert_eq!(registry.pending_upload_count(), 0);
        assert_eq!(registry.previews().outstanding(), 0);
        assert_eq!(log.borrow().allocated.len(), 2);
        assert!(log.borrow().balanced());
    }

    #[test]
    fn discard_and_drop_release_each_preview_once() {
        let (mut registry, log) = registry(5);
        registry.add_files([image("one.png"), image("two.png")]);
        registry.discard();
        assert!(registry.entries().is_empty());
        assert!(log.borrow().balanced());

        registry.add_files([image("three.png")]);
        drop(registry);

        let log = log.borrow();
        assert_eq!(log.allocated.len(), 3);
        assert_eq!(log.released.len(), 3);
        assert!(log.balanced());
    }

    #[test]
    fn visible_count_never_exceeds_limit_over_mixed_sequence() {
        let (mut registry, log) = registry(3);
        registry.hydrate([stored("a"), stored("b")]);
        let a = entry_for(&registry, "a");
        let b = entry_for(&registry, "b");

        for step in 0..40_usize {
            match step % 5 {
                0 => {
                    registry.add_files([image("x.png"), pdf("y.pdf")]);
                }
                1 => {
                    let newest = registry
                        .entries()
                        .iter()
                        .rev()
                        .find(|entry| entry.origin() == EntryOrigin::New)
                        .map(AttachmentEntry::id);
                    if let Some(id) = newest {
                        registry.remove_entry(id).unwrap();
                    }
                }
                2 => {
                    registry.remove_entry(if step % 2 == 0 { a } else { b }).unwrap();
                }
                3 => {
                    let _ = registry.unmark_deletion(a);
                    let _ = registry.unmark_deletion(b);
                }
                _ => {
                    registry.add_files([image("z.png")]);
                }
            }
            assert!(registry.visible_count() <= 3, "step {step}");
            assert_eq!(
                registry.previews().outstanding(),
                registry
                    .entries()
                    .iter()
                    .filter(|entry| entry.preview_handle().is_some())
                    .count()
            );
        }

        registry.discard();
        assert!(log.borrow().balanced());
    }
}
