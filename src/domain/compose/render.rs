// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/compose/render.rs
//
// Project a crop region of the source onto a square output bitmap.

use image::{RgbaImage, imageops};
use serde::{Deserialize, Serialize};

use crate::domain::crop::CropSpec;
use crate::domain::source::SourceImage;
use crate::error::RenderError;

/// Resampling filter used when scaling bitmaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleQuality {
    /// Bilinear.
    Fast,
    /// Catmull-Rom bicubic.
    Balanced,
    /// Lanczos with a window of 3. Best for large upscales.
    #[default]
    Best,
}

impl ResampleQuality {
    pub fn filter(self) -> imageops::FilterType {
        match self {
            Self::Fast => imageops::FilterType::Triangle,
            Self::Balanced => imageops::FilterType::CatmullRom,
            Self::Best => imageops::FilterType::Lanczos3,
        }
    }
}

impl std::str::FromStr for ResampleQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fast" | "bilinear" => Ok(Self::Fast),
            "balanced" | "bicubic" => Ok(Self::Balanced),
            "best" | "lanczos" => Ok(Self::Best),
            other => Err(format!("unknown resample quality '{other}'")),
        }
    }
}

/// Square photo bitmap ready for compositing.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedBitmap {
    image: RgbaImage,
}

impl CroppedBitmap {
    /// Wrap an existing bitmap. Non-square input is accepted; it will be
    /// stretched to the photo circle when composited.
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Side length in pixels (width, for non-square input).
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// Cut `crop` out of `source` and scale it to `output_size` x `output_size`.
///
/// The region must be non-empty and lie inside the source; clamp it with
/// [`CropSpec::clamped_to`] first if it comes from an untrusted selector.
pub fn render_crop(
    source: &SourceImage,
    crop: &CropSpec,
    output_size: u32,
    quality: ResampleQuality,
) -> Result<CroppedBitmap, RenderError> {
    if output_size == 0 {
        return Err(RenderError::InvalidSize);
    }
    crop.region.validate(source.width(), source.height())?;

    let (x, y, width, height) = crop.region.as_tuple();
    if width != height {
        log::debug!("Crop region {width}x{height} is not square; stretching to 1:1");
    }

    let region = source.bitmap().crop_imm(x, y, width, height).to_rgba8();
    let image = if (width, height) == (output_size, output_size) {
        region
    } else {
        imageops::resize(&region, output_size, output_size, quality.filter())
    };

    log::debug!(
        "Rendered crop ({x}, {y}, {width}x{height}) to {output_size}x{output_size} with {quality:?}"
    );
    Ok(CroppedBitmap { image })
}
