//! Data models for servdesk attachments

mod attachment;

pub use attachment::{AttachmentEntry, EntryId, EntryOrigin, LocalFile, ServerAttachment};
pub(crate) use attachment::EntrySource;
