//! MIME inference and classification.

/// Broad attachment category used for previews and labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Video,
    Audio,
    Text,
    File,
}

impl AttachmentKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Text => "text",
            Self::File => "file",
        }
    }
}

/// Resolve the MIME type for a file from its declared content type and name.
///
/// A declared type wins unless it is empty, `application/octet-stream`, or a
/// generic `text/*` claim on a file whose extension says it is media.
pub fn infer_attachment_mime_type(content_type: Option<&str>, file_name: &str) -> String {
    let extension_guess = mime_guess::from_path(file_name)
        .first_raw()
        .map(str::to_string);

    if let Some(content_type) = content_type {
        let trimmed = content_type.trim();
        if !trimmed.is_empty() {
            let normalized = trimmed.to_ascii_lowercase();

            if normalized != "application/octet-stream"
                && !(normalized.starts_with("text/")
                    && extension_guess.as_deref().is_some_and(is_media_mime_type))
            {
                return normalized;
            }
        }
    }

    extension_guess.unwrap_or_else(|| {
        mime_guess::from_path(file_name)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    })
}

/// Lowercased `type/subtype` with any parameters stripped.
pub fn mime_essence(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Match a MIME type against an allow-list pattern (`image/png` or `image/*`).
pub fn mime_matches_pattern(mime_type: &str, pattern: &str) -> bool {
    let essence = mime_essence(mime_type);
    let pattern = mime_essence(pattern);

    if pattern == "*/*" {
        return !essence.is_empty();
    }
    match pattern.strip_suffix("/*") {
        Some(top_level) => essence
            .split_once('/')
            .is_some_and(|(kind, _)| kind == top_level),
        None => essence == pattern,
    }
}

/// Whether a local preview can be rendered for this MIME type.
pub fn is_image_like(mime_type: &str) -> bool {
    mime_essence(mime_type).starts_with("image/")
}

pub fn attachment_kind(mime_type: &str) -> AttachmentKind {
    let essence = mime_essence(mime_type);
    if essence.starts_with("image/") {
        AttachmentKind::Image
    } else if essence.starts_with("video/") {
        AttachmentKind::Video
    } else if essence.starts_with("audio/") {
        AttachmentKind::Audio
    } else if essence.starts_with("text/") {
        AttachmentKind::Text
    } else {
        AttachmentKind::File
    }
}

fn is_media_mime_type(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
        || mime_type.starts_with("video/")
        || mime_type.starts_with("audio/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inference_prefers_media_extension_over_generic_text() {
        assert_eq!(
            infer_attachment_mime_type(Some("text/plain"), "photo.png"),
            "image/png"
        );
        assert_eq!(
            infer_attachment_mime_type(Some("application/octet-stream"), "invoice.pdf"),
            "application/pdf"
        );
    }

    #[test]
    fn inference_keeps_specific_declared_type() {
        assert_eq!(
            infer_attachment_mime_type(Some("Image/JPEG"), "scan.bin"),
            "image/jpeg"
        );
        assert_eq!(
            infer_attachment_mime_type(Some("text/csv"), "parts.csv"),
            "text/csv"
        );
    }

    #[test]
    fn inference_falls_back_to_octet_stream() {
        assert_eq!(
            infer_attachment_mime_type(None, "no-extension"),
            "application/octet-stream"
        );
        assert_eq!(infer_attachment_mime_type(Some("  "), "notes.txt"), "text/plain");
    }

    #[test]
    fn pattern_matching_handles_wildcards_and_parameters() {
        assert!(mime_matches_pattern("image/png", "image/*"));
        assert!(mime_matches_pattern("IMAGE/PNG", "image/png"));
        assert!(mime_matches_pattern("text/plain; charset=utf-8", "text/plain"));
        assert!(mime_matches_pattern("application/pdf", "*/*"));
        assert!(!mime_matches_pattern("image/png", "image/jpeg"));
        assert!(!mime_matches_pattern("imagefoo/png", "image/*"));
        assert!(!mime_matches_pattern("application/pdf", "image/*"));
    }

    #[test]
    fn kind_classification() {
        assert_eq!(attachment_kind("image/webp"), AttachmentKind::Image);
        assert_eq!(attachment_kind("video/mp4"), AttachmentKind::Video);
        assert_eq!(attachment_kind("audio/mpeg"), AttachmentKind::Audio);
        assert_eq!(attachment_kind("text/plain"), AttachmentKind::Text);
        assert_eq!(attachment_kind("application/pdf").label(), "file");
        assert!(is_image_like("image/gif"));
        assert!(!is_image_like("application/pdf"));
    }
}
