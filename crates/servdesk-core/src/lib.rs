//! servdesk-core - Core library for servdesk
//!
//! This crate contains the attachment lifecycle manager shared by the job,
//! issue, and parts-request edit forms: file validation, the per-form
//! attachment registry, preview resource tracking, and change-set assembly.

pub mod attachments;
pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod util;

pub use attachments::{
    assemble, AddFilesOutcome, AttachmentLifecycleManager, AttachmentRegistry, ChangeSet,
    FileRejection, FileValidator, PreviewAllocator, PreviewResourceTracker, RejectionReason,
    RemoveOutcome,
};
pub use config::{AttachmentLimits, AttachmentSettings, FormKind};
pub use error::{Error, Result};
pub use models::{AttachmentEntry, EntryId, EntryOrigin, LocalFile, ServerAttachment};
