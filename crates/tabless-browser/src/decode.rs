//! Compressed image bytes to RGBA8.

use image::ImageFormat;

use crate::error::{HostError, Result};

/// Formats recognized by signature.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageKind {
    Png,
    Jpeg,
    Gif,
    WebP,
}

impl ImageKind {
    /// Identifies `bytes` by magic number.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::WebP)
        } else {
            None
        }
    }

    fn format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

/// Decoded pixels, always RGBA8 with `4 * width * height` bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Decodes PNG, JPEG, GIF (first frame) or WebP.
pub fn decode(bytes: &[u8]) -> Result<DecodedImage> {
    let kind = ImageKind::sniff(bytes).ok_or(HostError::UnknownImageFormat)?;
    let rgba = image::load_from_memory_with_format(bytes, kind.format())?.to_rgba8();
    let (width, height) = rgba.dimensions();
    log::debug!("decoded {kind:?} {width}x{height}");
    Ok(DecodedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}
