//! Thumbnail rendering for locally selected image attachments.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use image::{codecs::jpeg::JpegEncoder, DynamicImage, GenericImageView, ImageFormat};

use crate::{Error, Result};

/// Encoding used for generated thumbnails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailFormat {
    Jpeg,
    Png,
}

impl ThumbnailFormat {
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    /// Longest allowed edge in pixels.
    pub max_edge: u32,
    pub format: ThumbnailFormat,
    /// Only used when `format` is [`ThumbnailFormat::Jpeg`].
    pub jpeg_quality: u8,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            max_edge: 256,
            format: ThumbnailFormat::Jpeg,
            jpeg_quality: 80,
        }
    }
}

/// An encoded thumbnail held in memory while its preview is live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: ThumbnailFormat,
}

impl ThumbnailImage {
    /// Inline `data:` URI suitable for an `<img src>`.
    pub fn data_uri(&self) -> String {
        let encoded = BASE64_STANDARD.encode(&self.bytes);
        format!("data:{};base64,{encoded}", self.format.mime_type())
    }
}

/// Decode `source_bytes` and shrink it to fit a `max_edge` square.
///
/// Aspect ratio is preserved and smaller images are never upscaled. JPEG
/// output drops any alpha channel.
pub fn generate_thumbnail(source_bytes: &[u8], options: ThumbnailOptions) -> Result<ThumbnailImage> {
    if source_bytes.is_empty() {
        return Err(Error::InvalidInput(
            "Preview source bytes cannot be empty".to_string(),
        ));
    }
    if options.max_edge == 0 {
        return Err(Error::InvalidInput(
            "Preview edge length must be greater than zero".to_string(),
        ));
    }

    let source = image::load_from_memory(source_bytes).map_err(|error| {
        Error::InvalidInput(format!("Failed to decode image for preview: {error}"))
    })?;

    let (source_width, source_height) = source.dimensions();
    let resized = if source_width <= options.max_edge && source_height <= options.max_edge {
        source
    } else {
        source.thumbnail(options.max_edge, options.max_edge)
    };
    let (width, height) = resized.dimensions();

    Ok(ThumbnailImage {
        bytes: encode(&resized, options)?,
        width,
        height,
        format: options.format,
    })
}

fn encode(image: &DynamicImage, options: ThumbnailOptions) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());

    match options.format {
        ThumbnailFormat::Jpeg => {
            let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, options.jpeg_quality);
            encoder.encode_image(&rgb).map_err(|error| {
                Error::InvalidInput(format!("Failed to encode JPEG preview: {error}"))
            })?;
        }
        ThumbnailFormat::Png => {
            image
                .write_to(&mut cursor, ImageFormat::Png)
                .map_err(|error| {
                    Error::InvalidInput(format!("Failed to encode PNG preview: {error}"))
                })?;
        }
    }

    Ok(cursor.into_inner())
}
