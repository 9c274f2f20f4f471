//! Attachment lifecycle management shared by the edit forms.
//!
//! The registry owns the entries for one form session, runs each candidate
//! through the [`FileValidator`], and drives the [`PreviewResourceTracker`]
//! on every path that creates or drops a new entry. [`assemble`] turns the
//! final state into the [`ChangeSet`] handed to the submission collaborator.

mod assembler;
mod manager;
mod preview;
mod registry;
mod validator;
mod view;

pub use assembler::{assemble, ChangeSet};
pub use manager::AttachmentLifecycleManager;
pub use preview::{
    PreviewAllocator, PreviewHandle, PreviewId, PreviewResourceTracker, ThumbnailPreviews,
};
pub use registry::{AddFilesOutcome, AttachmentRegistry, RemoveOutcome};
pub use validator::{FileRejection, FileValidator, RejectionReason};
pub use view::{rows, AttachmentRow, EntryStatus};
