//! MIME handling and local preview rendering for attachment files.

mod mime;
mod thumbnail;

pub use mime::{
    attachment_kind, infer_attachment_mime_type, is_image_like, mime_essence,
    mime_matches_pattern, AttachmentKind,
};
pub use thumbnail::{generate_thumbnail, ThumbnailFormat, ThumbnailImage, ThumbnailOptions};

#[cfg(test)]
pub(crate) use thumbnail::tests::source_png;
