// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/source.rs
//
// The user's uploaded photo.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::error::DecodeError;

/// Content type reported for files whose extension is not an image format.
const UNKNOWN_CONTENT_TYPE: &str = "application/octet-stream";

/// Decoded upload plus the bytes it came from.
///
/// Immutable once loaded. The session shares it with in-flight render tasks
/// through an `Arc`, so a new upload replaces it wholesale instead of
/// mutating it.
pub struct SourceImage {
    bytes: Arc<[u8]>,
    bitmap: DynamicImage,
    content_type: Option<String>,
}

impl SourceImage {
    /// Decode an upload.
    ///
    /// A declared `content_type` must belong to the `image/` family. Without
    /// one, the format is sniffed from the bytes.
    pub fn load(bytes: impl Into<Vec<u8>>, content_type: Option<&str>) -> Result<Self, DecodeError> {
        if let Some(ct) = content_type
            && !is_image_content_type(ct)
        {
            return Err(DecodeError::UnsupportedType(ct.to_string()));
        }

        let bytes: Vec<u8> = bytes.into();
        if bytes.is_empty() {
            return Err(DecodeError::Empty);
        }

        let reader = ImageReader::new(Cursor::new(bytes.as_slice())).with_guessed_format()?;
        let bitmap = reader.decode()?;
        let bitmap = super::orientation::apply_exif_orientation(bitmap, &bytes);

        let (width, height) = bitmap.dimensions();
        log::debug!(
            "Decoded upload: {}x{} ({} bytes, {})",
            width,
            height,
            bytes.len(),
            content_type.unwrap_or("sniffed")
        );

        Ok(Self {
            bytes: bytes.into(),
            bitmap,
            content_type: content_type.map(str::to_string),
        })
    }

    /// Read an image file from disk, deriving its content type from the extension.
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let content_type = content_type_for_path(path);
        let bytes = std::fs::read(path)?;
        Self::load(bytes, content_type.as_deref())
    }

    /// Wrap an already decoded bitmap (no encoded bytes are kept).
    pub fn from_bitmap(bitmap: DynamicImage) -> Self {
        Self {
            bytes: Arc::from(Vec::new()),
            bitmap,
            content_type: None,
        }
    }

    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    /// Returns the pixel dimensions (width, height), after EXIF orientation.
    pub fn dimensions(&self) -> (u32, u32) {
        self.bitmap.dimensions()
    }

    /// Raw encoded bytes as uploaded.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn bitmap(&self) -> &DynamicImage {
        &self.bitmap
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

impl std::fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("bytes", &self.bytes.len())
            .field("content_type", &self.content_type)
            .finish()
    }
}

/// Check whether a declared content type is in the image family.
pub fn is_image_content_type(content_type: &str) -> bool {
    content_type
        .trim()
        .get(..6)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("image/"))
}

/// Derive a content type from a file extension.
///
/// Returns `None` when the path has no extension, so the caller sniffs the
/// bytes instead.
pub fn content_type_for_path(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    if ext == "svg" || ext == "svgz" {
        return Some("image/svg+xml".to_string());
    }
    let content_type = match ImageFormat::from_extension(&ext) {
        Some(format) => format.to_mime_type(),
        None => UNKNOWN_CONTENT_TYPE,
    };
    Some(content_type.to_string())
}
