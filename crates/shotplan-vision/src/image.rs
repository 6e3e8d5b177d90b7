//! Validated image input.
//!
//! The whole image is decoded once up front, so a file with an intact header
//! but a damaged body is rejected before any provider sees it. The raw bytes
//! and a small RGB preview are kept afterwards.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{GenericImageView, ImageFormat, RgbImage};
use shotplan_models::TechnicalDetails;

use crate::error::{ImageError, ImageResult};

/// Longest edge of the kept preview.
pub const PREVIEW_EDGE: u32 = 64;

/// Image bytes that decoded cleanly.
///
/// Cloning is cheap; the bytes are shared.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    bytes: Arc<[u8]>,
    format: ImageFormat,
    width: u32,
    height: u32,
    preview: Arc<RgbImage>,
}

impl ImagePayload {
    /// Validate raw bytes by decoding them in full.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> ImageResult<Self> {
        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(ImageError::Empty);
        }

        let reader = image::io::Reader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let format = reader.format().ok_or(ImageError::UnknownFormat)?;
        if format_name(format).is_none() {
            return Err(ImageError::UnsupportedFormat(format!("{:?}", format)));
        }

        let decoded = reader
            .decode()
            .map_err(|e| ImageError::Unreadable(e.to_string()))?;
        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Unreadable("zero-sized image".to_string()));
        }
        let preview = if width > PREVIEW_EDGE || height > PREVIEW_EDGE {
            decoded.thumbnail(PREVIEW_EDGE, PREVIEW_EDGE).to_rgb8()
        } else {
            decoded.to_rgb8()
        };

        Ok(Self {
            bytes: bytes.into(),
            format,
            width,
            height,
            preview: Arc::new(preview),
        })
    }

    /// Read and validate an image file.
    pub async fn from_path(path: impl AsRef<Path>) -> ImageResult<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        Self::from_bytes(bytes)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Downscaled RGB copy, at most [`PREVIEW_EDGE`] pixels on each side.
    pub fn preview(&self) -> &RgbImage {
        &self.preview
    }

    /// Short format name (png, jpeg, ...).
    pub fn format_name(&self) -> &'static str {
        format_name(self.format).unwrap_or("unknown")
    }

    pub fn mime_type(&self) -> &'static str {
        match self.format {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Gif => "image/gif",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Bmp => "image/bmp",
            ImageFormat::Tiff => "image/tiff",
            _ => "application/octet-stream",
        }
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// `data:` URI suitable for vision chat APIs.
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type(), self.to_base64())
    }

    pub fn technical_details(&self) -> TechnicalDetails {
        TechnicalDetails::new(self.width, self.height, self.format_name())
    }
}

fn format_name(format: ImageFormat) -> Option<&'static str> {
    match format {
        ImageFormat::Png => Some("png"),
        ImageFormat::Jpeg => Some("jpeg"),
        ImageFormat::Gif => Some("gif"),
        ImageFormat::WebP => Some("webp"),
        ImageFormat::Bmp => Some("bmp"),
        ImageFormat::Tiff => Some("tiff"),
        _ => None,
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{ImageOutputFormat, RgbImage};
    use std::io::Cursor;

    /// Encode a solid PNG of the given size.
    pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_pixel(width, height, image::Rgb([120, 80, 40]));
        let mut buf = Cursor::new(Vec::new());
        img.write_to(&mut buf, ImageOutputFormat::Png)
            .expect("encode png");
        buf.into_inner()
    }
}
