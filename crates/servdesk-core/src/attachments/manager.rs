//! Form-facing wrapper that serializes submissions.

use std::fmt;
use std::future::Future;

use super::assembler::ChangeSet;
use super::preview::{PreviewAllocator, ThumbnailPreviews};
use super::registry::{AddFilesOutcome, AttachmentRegistry, RemoveOutcome};
use super::view::{rows, AttachmentRow};
use crate::config::{AttachmentLimits, FormKind};
use crate::models::{AttachmentEntry, EntryId, LocalFile, ServerAttachment};
use crate::{Error, Result};

/// One edit form's attachment state plus the busy flag that keeps the form
/// read-only while a submission is outstanding.
#[derive(Debug)]
pub struct AttachmentLifecycleManager<A: PreviewAllocator = ThumbnailPreviews> {
    form: FormKind,
    registry: AttachmentRegistry<A>,
    submitting: bool,
}

impl AttachmentLifecycleManager<ThumbnailPreviews> {
    pub fn new(form: FormKind, limits: AttachmentLimits) -> Result<Self> {
        Self::with_allocator(form, limits, ThumbnailPreviews::default())
    }
}

impl<A: PreviewAllocator> AttachmentLifecycleManager<A> {
    pub fn with_allocator(form: FormKind, limits: AttachmentLimits, allocator: A) -> Result<Self> {
        Ok(Self {
            form,
            registry: AttachmentRegistry::with_allocator(limits, allocator)?,
            submitting: false,
        })
    }

    /// Load the parent record's stored attachments.
    pub fn open(&mut self, attachments: impl IntoIterator<Item = ServerAttachment>) -> Result<()> {
        self.ensure_idle()?;
        self.registry.hydrate(attachments);
        tracing::debug!(
            form = %self.form,
            count = self.registry.entries().len(),
            "Opened attachment form"
        );
        Ok(())
    }

    pub fn add_files(&mut self, files: impl IntoIterator<Item = LocalFile>) -> Result<AddFilesOutcome> {
        self.ensure_idle()?;
        Ok(self.registry.add_files(files))
    }

    pub fn remove_entry(&mut self, id: EntryId) -> Result<RemoveOutcome> {
        self.ensure_idle()?;
        self.registry.remove_entry(id)
    }

    pub fn unmark_deletion(&mut self, id: EntryId) -> Result<()> {
        self.ensure_idle()?;
        self.registry.unmark_deletion(id)
    }

    /// Lock the form and hand out the change-set to send.
    pub fn begin_submit(&mut self) -> Result<ChangeSet> {
        self.ensure_idle()?;
        self.submitting = true;
        Ok(self.registry.assemble())
    }

    /// Settle the outstanding submission.
    ///
    /// On success the registry mirrors the server's list. On failure it is
    /// left exactly as it was so the user can retry.
    pub fn finish_submit<E: fmt::Display>(
        &mut self,
        result: std::result::Result<Vec<ServerAttachment>, E>,
    ) -> Result<()> {
        if !self.submitting {
            return Err(Error::NoSubmissionPending);
        }
        self.submitting = false;

        match result {
            Ok(attachments) => {
                self.registry.reset(attachments);
                tracing::info!(
                    form = %self.form,
                    count = self.registry.entries().len(),
                    "Attachments saved"
                );
                Ok(())
            }
            Err(error) => {
                let message = error.to_string();
                tracing::warn!(form = %self.form, "Attachment submission failed: {message}");
                Err(Error::Submission(message))
            }
        }
    }

    /// Run `submit` with the assembled change-set and settle the result.
    pub async fn submit<F, Fut, E>(&mut self, submit: F) -> Result<()>
    where
        F: FnOnce(ChangeSet) -> Fut,
        Fut: Future<Output = std::result::Result<Vec<ServerAttachment>, E>>,
        E: fmt::Display,
    {
        let change_set = self.begin_submit()?;
        let result = submit(change_set).await;
        self.finish_submit(result)
    }

    /// Release every preview and forget the session (form closed).
    pub fn discard(&mut self) {
        self.registry.discard();
        self.submitting = false;
    }

    const fn ensure_idle(&self) -> Result<()> {
        if self.submitting {
            Err(Error::SubmissionInProgress)
        } else {
            Ok(())
        }
    }

    pub const fn form(&self) -> FormKind {
        self.form
    }

    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn assemble(&self) -> ChangeSet {
        self.registry.assemble()
    }

    pub fn entries(&self) -> &[AttachmentEntry] {
        self.registry.entries()
    }

    pub fn rows(&self) -> Vec<AttachmentRow> {
        rows(&self.registry)
    }

    pub fn pending_deletion_count(&self) -> usize {
        self.registry.pending_deletion_count()
    }

    pub fn visible_count(&self) -> usize {
        self.registry.visible_count()
    }

    pub const fn registry(&self) -> &AttachmentRegistry<A> {
        &self.registry
    }
}
