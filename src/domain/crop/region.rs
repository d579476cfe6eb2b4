// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/region.rs
//
// Crop rectangle and crop spec domain model.

use crate::constant::{MAX_ZOOM, MIN_ZOOM};
use crate::error::RenderError;

/// Crop region in source pixel coordinates.
///
/// Pure domain model - represents a rectangular region to crop.
/// No UI concerns, just data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Square region with its top-left corner at (x, y).
    pub fn square(x: u32, y: u32, side: u32) -> Self {
        Self::new(x, y, side, side)
    }

    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.x, self.y, self.width, self.height)
    }

    /// Check if region has valid dimensions.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    pub fn is_square(&self) -> bool {
        self.width == self.height
    }

    /// Whether the region lies entirely inside an image of the given size.
    pub fn fits_within(&self, image_width: u32, image_height: u32) -> bool {
        // u64 so x + width cannot overflow.
        u64::from(self.x) + u64::from(self.width) <= u64::from(image_width)
            && u64::from(self.y) + u64::from(self.height) <= u64::from(image_height)
    }

    /// Validate against an image, returning the matching `RenderError`.
    pub fn validate(&self, image_width: u32, image_height: u32) -> Result<(), RenderError> {
        if !self.is_valid() {
            return Err(RenderError::DegenerateCrop);
        }
        if !self.fits_within(image_width, image_height) {
            return Err(RenderError::OutOfBounds {
                x: self.x,
                y: self.y,
                width: self.width,
                height: self.height,
                image_width,
                image_height,
            });
        }
        Ok(())
    }

    /// Clamp the region into the image bounds.
    ///
    /// Returns `None` if nothing of the region remains (origin outside the
    /// image or zero area).
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<Self> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let width = self.width.min(image_width - self.x);
        let height = self.height.min(image_height - self.y);
        let clamped = Self::new(self.x, self.y, width, height);
        clamped.is_valid().then_some(clamped)
    }
}

/// A crop region plus the zoom it was selected at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropSpec {
    pub region: CropRegion,
    zoom: f32,
}

impl CropSpec {
    /// Build a spec; zoom is clamped to the supported range.
    pub fn new(region: CropRegion, zoom: f32) -> Self {
        Self {
            region,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Clamp the region into the image; see [`CropRegion::clamp_to`].
    /// A square region stays square, shrinking to its shorter clamped side.
    pub fn clamped_to(&self, image_width: u32, image_height: u32) -> Option<Self> {
        let mut region = self.region.clamp_to(image_width, image_height)?;
        if self.region.is_square() {
            let side = region.width.min(region.height);
            region = CropRegion::square(region.x, region.y, side);
        }
        Some(Self { region, ..*self })
    }
}

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`. NaN falls back to the minimum.
pub fn clamp_zoom(zoom: f32) -> f32 {
    if zoom.is_nan() {
        MIN_ZOOM
    } else {
        zoom.clamp(MIN_ZOOM, MAX_ZOOM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_degenerate() {
        assert_eq!(
            CropRegion::new(0, 0, 0, 10).validate(100, 100),
            Err(RenderError::DegenerateCrop)
        );
        assert_eq!(
            CropRegion::new(0, 0, 10, 0).validate(100, 100),
            Err(RenderError::DegenerateCrop)
        );
    }

    #[test]
    fn test_validate_bounds() {
        assert!(CropRegion::square(100, 100, 400).validate(800, 600).is_ok());
        assert!(CropRegion::square(400, 200, 400).validate(800, 600).is_ok());
        assert!(matches!(
            CropRegion::square(401, 200, 400).validate(800, 600),
            Err(RenderError::OutOfBounds { .. })
        ));
        assert!(matches!(
            CropRegion::square(u32::MAX, 0, 2).validate(800, 600),
            Err(RenderError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_clamp_to() {
        let clamped = CropRegion::new(700, 500, 400, 400).clamp_to(800, 600).unwrap();
        assert_eq!(clamped.as_tuple(), (700, 500, 100, 100));
        assert_eq!(CropRegion::new(800, 0, 10, 10).clamp_to(800, 600), None);
        assert_eq!(CropRegion::new(0, 0, 0, 10).clamp_to(800, 600), None);
    }

    #[test]
    fn test_clamped_spec_stays_square() {
        let spec = CropSpec::new(CropRegion::square(600, 100, 400), 0.8);
        let clamped = spec.clamped_to(800, 600).unwrap();
        assert_eq!(clamped.region.as_tuple(), (600, 100, 200, 200));
        assert_eq!(clamped.zoom(), 0.8);
    }

    #[test]
    fn test_zoom_is_clamped() {
        let region = CropRegion::square(0, 0, 10);
        assert_eq!(CropSpec::new(region, 5.0).zoom(), MAX_ZOOM);
        assert_eq!(CropSpec::new(region, 0.0).zoom(), MIN_ZOOM);
        assert_eq!(CropSpec::new(region, f32::NAN).zoom(), MIN_ZOOM);
        assert_eq!(CropSpec::new(region, 0.8).zoom(), 0.8);
    }
}
