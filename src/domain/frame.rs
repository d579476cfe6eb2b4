// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/frame.rs
//
// Decorative frame overlay (raster or SVG).

use std::path::Path;

use image::{DynamicImage, GenericImageView, imageops};
use resvg::tiny_skia::{self, Pixmap};
use resvg::usvg::{Options, Tree};

use super::compose::pixmap::rgba_to_pixmap;
use crate::constant::MIN_PIXMAP_SIZE;
use crate::error::{FrameLoadError, RenderError};

enum FrameKind {
    Raster(DynamicImage),
    /// Parsed SVG, re-rendered at every output size so download renders stay sharp.
    Vector(Tree),
}

/// Overlay drawn full-canvas on top of the clipped photo.
///
/// Its transparent cutout is expected to line up with the photo circle;
/// nothing in here checks that.
pub struct FrameAsset {
    kind: FrameKind,
    width: u32,
    height: u32,
}

impl FrameAsset {
    /// Load a frame from disk. `.svg`/`.svgz` files are parsed as vectors,
    /// everything else goes through the image decoders.
    pub fn open(path: &Path) -> Result<Self, FrameLoadError> {
        let data = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => FrameLoadError::Missing(path.display().to_string()),
            _ => FrameLoadError::Decode(format!("{}: {e}", path.display())),
        })?;

        let is_svg = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("svg") || ext.eq_ignore_ascii_case("svgz"));

        let frame = if is_svg {
            Self::from_svg_data(&data)?
        } else {
            let image =
                image::load_from_memory(&data).map_err(|e| FrameLoadError::Decode(e.to_string()))?;
            Self::from_image(image)
        };

        log::info!(
            "Frame loaded from {}: {}x{}",
            path.display(),
            frame.width,
            frame.height
        );
        Ok(frame)
    }

    /// Wrap a decoded raster frame.
    pub fn from_image(image: DynamicImage) -> Self {
        let (width, height) = image.dimensions();
        if width != height {
            log::warn!("Frame is not square ({width}x{height}); it will be stretched");
        }
        Self {
            kind: FrameKind::Raster(image),
            width,
            height,
        }
    }

    /// Parse an SVG (plain or gzip-compressed) frame.
    pub fn from_svg_data(data: &[u8]) -> Result<Self, FrameLoadError> {
        let tree =
            Tree::from_data(data, &Options::default()).map_err(|e| FrameLoadError::Svg(e.to_string()))?;

        let size = tree.size();
        let width = (size.width().ceil() as u32).max(MIN_PIXMAP_SIZE);
        let height = (size.height().ceil() as u32).max(MIN_PIXMAP_SIZE);

        Ok(Self {
            kind: FrameKind::Vector(tree),
            width,
            height,
        })
    }

    /// Native dimensions (width, height) of the frame artwork.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.kind, FrameKind::Vector(_))
    }

    /// Rasterize the frame to a `size` x `size` premultiplied pixmap.
    pub fn render(&self, size: u32) -> Result<Pixmap, RenderError> {
        if size == 0 {
            return Err(RenderError::InvalidSize);
        }

        match &self.kind {
            FrameKind::Raster(image) => {
                let rgba = if (self.width, self.height) == (size, size) {
                    image.to_rgba8()
                } else {
                    imageops::resize(&image.to_rgba8(), size, size, imageops::FilterType::Lanczos3)
                };
                rgba_to_pixmap(&rgba)
            }
            FrameKind::Vector(tree) => {
                let mut pixmap = Pixmap::new(size, size).ok_or(RenderError::Surface {
                    width: size,
                    height: size,
                })?;
                let tree_size = tree.size();
                let ts = tiny_skia::Transform::from_scale(
                    size as f32 / tree_size.width(),
                    size as f32 / tree_size.height(),
                );
                resvg::render(tree, ts, &mut pixmap.as_mut());
                Ok(pixmap)
            }
        }
    }
}

impl std::fmt::Debug for FrameAsset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = if self.is_vector() { "Vector" } else { "Raster" };
        write!(f, "FrameAsset::{kind}({}x{})", self.width, self.height)
    }
}
