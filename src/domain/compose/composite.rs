// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/compose/composite.rs
//
// Circular photo + frame overlay.

use image::{RgbaImage, imageops};
use resvg::tiny_skia::{IntSize, Mask, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke, Transform};

use super::pixmap::{pixmap_to_rgba, rgba_to_pixmap};
use super::render::{CroppedBitmap, ResampleQuality};
use crate::constant::{
    CIRCLE_RADIUS_FRACTION, OUTLINE_COLOR, OUTLINE_GAP, OUTLINE_MIN_WIDTH, OUTLINE_WIDTH_FRACTION,
};
use crate::domain::frame::FrameAsset;
use crate::error::RenderError;

/// Where the photo circle sits on the canvas.
///
/// The radius is tied to the frame artwork's cutout, so it is configuration
/// rather than something derived. Keep it identical for the preview and the
/// download render of one session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleGeometry {
    radius_fraction: f32,
}

impl CircleGeometry {
    /// Radius as a fraction of the canvas side, clamped to `(0, 0.5]`.
    pub fn new(radius_fraction: f32) -> Self {
        let radius_fraction = if radius_fraction.is_finite() && radius_fraction > 0.0 {
            radius_fraction.min(0.5)
        } else {
            CIRCLE_RADIUS_FRACTION
        };
        Self { radius_fraction }
    }

    pub fn radius_fraction(&self) -> f32 {
        self.radius_fraction
    }

    pub fn center(&self, output_size: u32) -> (f32, f32) {
        let half = output_size as f32 / 2.0;
        (half, half)
    }

    pub fn radius(&self, output_size: u32) -> f32 {
        output_size as f32 * self.radius_fraction
    }
}

impl Default for CircleGeometry {
    fn default() -> Self {
        Self::new(CIRCLE_RADIUS_FRACTION)
    }
}

/// Final framed image.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    image: RgbaImage,
}

impl Composite {
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// Scale an existing composite to a new size.
    ///
    /// Fallback for when the source photo is gone and a proper re-render is
    /// impossible; detail is limited to what this composite already has.
    pub fn upscale(&self, output_size: u32, quality: ResampleQuality) -> Result<Self, RenderError> {
        if output_size == 0 {
            return Err(RenderError::InvalidSize);
        }
        if output_size == self.side() {
            return Ok(self.clone());
        }
        Ok(Self {
            image: imageops::resize(&self.image, output_size, output_size, quality.filter()),
        })
    }
}

/// Draw `photo` inside the circle and the frame (or a fallback ring) on top.
pub fn composite(
    photo: &CroppedBitmap,
    frame: Option<&FrameAsset>,
    output_size: u32,
    geometry: &CircleGeometry,
    quality: ResampleQuality,
) -> Result<Composite, RenderError> {
    if output_size == 0 {
        return Err(RenderError::InvalidSize);
    }
    let surface_error = RenderError::Surface {
        width: output_size,
        height: output_size,
    };
    let mut canvas = Pixmap::new(output_size, output_size).ok_or(surface_error.clone())?;
    let (cx, cy) = geometry.center(output_size);
    let radius = geometry.radius(output_size);

    // Photo, clipped to the circle.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let diameter = ((radius * 2.0).round() as u32).max(1);
    let scaled = if photo.dimensions() == (diameter, diameter) {
        photo.image().clone()
    } else {
        imageops::resize(photo.image(), diameter, diameter, quality.filter())
    };
    let scaled = rgba_to_pixmap(&scaled)?;

    let clip = circle_mask(output_size, cx, cy, radius).ok_or(surface_error)?;

    #[allow(clippy::cast_possible_truncation)]
    let (left, top) = (
        (cx - diameter as f32 / 2.0).round() as i32,
        (cy - diameter as f32 / 2.0).round() as i32,
    );
    canvas.draw_pixmap(
        left,
        top,
        scaled.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        Some(&clip),
    );

    // Frame on top, unclipped.
    match frame {
        Some(frame) => {
            let overlay = frame.render(output_size)?;
            canvas.draw_pixmap(
                0,
                0,
                overlay.as_ref(),
                &PixmapPaint::default(),
                Transform::identity(),
                None,
            );
        }
        None => draw_fallback_ring(&mut canvas, cx, cy, radius),
    }

    Ok(Composite {
        image: pixmap_to_rgba(&canvas),
    })
}

/// Anti-aliased circle coverage that never reaches past `radius`.
///
/// Coverage ramps from 0 at a pixel-center distance of `radius` to full at
/// `radius - 1`, so a pixel whose center lies outside the circle gets none.
fn circle_mask(size: u32, cx: f32, cy: f32, radius: f32) -> Option<Mask> {
    let mut data = Vec::with_capacity(size as usize * size as usize);
    for y in 0..size {
        let dy = y as f32 + 0.5 - cy;
        for x in 0..size {
            let dx = x as f32 + 0.5 - cx;
            let coverage = (radius - dx.hypot(dy)).clamp(0.0, 1.0);
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            data.push((coverage * 255.0).round() as u8);
        }
    }
    Mask::from_vec(data, IntSize::from_wh(size, size)?)
}

/// Stroke a plain ring where the frame would have been.
///
/// The ring hugs the photo circle but is pulled inward when it would
/// otherwise fall off the canvas.
fn draw_fallback_ring(canvas: &mut Pixmap, cx: f32, cy: f32, radius: f32) {
    let side = canvas.width() as f32;
    let width = (side * OUTLINE_WIDTH_FRACTION).max(OUTLINE_MIN_WIDTH);
    let ring_radius = (radius + OUTLINE_GAP).min(side / 2.0 - width / 2.0);

    let Some(path) = PathBuilder::from_circle(cx, cy, ring_radius) else {
        log::debug!("Canvas too small for a fallback ring");
        return;
    };

    let [r, g, b] = OUTLINE_COLOR;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, 255);
    paint.anti_alias = true;

    let stroke = Stroke {
        width,
        ..Stroke::default()
    };
    canvas.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgba};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn red_photo(side: u32) -> CroppedBitmap {
        CroppedBitmap::from_image(RgbaImage::from_pixel(side, side, RED))
    }

    /// Opaque blue frame with a transparent hole of `hole` x side radius.
    fn blue_frame(side: u32, hole: f32) -> FrameAsset {
        let c = side as f32 / 2.0;
        FrameAsset::from_image(DynamicImage::ImageRgba8(RgbaImage::from_fn(side, side, |x, y| {
            let d = ((x as f32 + 0.5 - c).powi(2) + (y as f32 + 0.5 - c).powi(2)).sqrt();
            if d < hole * side as f32 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([0, 0, 255, 255])
            }
        })))
    }

    fn distance_from_center(x: u32, y: u32, size: u32) -> f32 {
        let c = size as f32 / 2.0;
        ((x as f32 + 0.5 - c).powi(2) + (y as f32 + 0.5 - c).powi(2)).sqrt()
    }

    #[test]
    fn test_output_size_and_center() {
        let out = composite(
            &red_photo(50),
            None,
            120,
            &CircleGeometry::default(),
            ResampleQuality::Best,
        )
        .unwrap();
        assert_eq!(out.side(), 120);
        assert_eq!(out.image().dimensions(), (120, 120));
        assert_eq!(out.image().get_pixel(60, 60), &RED);
    }

    #[test]
    fn test_photo_never_leaves_the_circle() {
        let size = 200;
        let geometry = CircleGeometry::new(0.35);
        let transparent = FrameAsset::from_image(DynamicImage::ImageRgba8(RgbaImage::new(10, 10)));
        let out = composite(
            &red_photo(64),
            Some(&transparent),
            size,
            &geometry,
            ResampleQuality::Best,
        )
        .unwrap();

        let radius = geometry.radius(size);
        for (x, y, px) in out.image().enumerate_pixels() {
            let d = distance_from_center(x, y, size);
            if d >= radius {
                assert_eq!(px[3], 0, "photo leaked at ({x}, {y}), d = {d}");
            } else if d < radius - 1.0 {
                assert_eq!(px, &RED, "photo missing at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_circle_mask_stops_at_radius() {
        let mask = circle_mask(20, 10.0, 10.0, 6.0).unwrap();
        for (i, &coverage) in mask.data().iter().enumerate() {
            let (x, y) = ((i % 20) as u32, (i / 20) as u32);
            let d = distance_from_center(x, y, 20);
            if d >= 6.0 {
                assert_eq!(coverage, 0, "({x}, {y}) d = {d}");
            } else if d <= 5.0 {
                assert_eq!(coverage, 255, "({x}, {y}) d = {d}");
            }
        }
    }

    #[test]
    fn test_fallback_ring_outside_photo() {
        let size = 400;
        let geometry = CircleGeometry::new(0.35);
        let out = composite(&red_photo(64), None, size, &geometry, ResampleQuality::Best).unwrap();

        let radius = geometry.radius(size);
        let mut ring_pixels = 0;
        for (x, y, px) in out.image().enumerate_pixels() {
            let d = distance_from_center(x, y, size);
            if d > radius + 1.0 {
                // Only the ring (blue-dominant) may show up here.
                assert!(px[3] == 0 || px[0] < px[2], "photo at ({x}, {y}), d = {d}");
                if px[3] == 255 {
                    ring_pixels += 1;
                }
            }
        }
        assert!(ring_pixels > 0, "fallback ring was not drawn");

        // Ring sits just outside the photo: width max(4, 2) centered at r + 2.
        let ring = out.image().get_pixel(200, (200.0 - radius - 2.0) as u32);
        assert_eq!(ring, &Rgba([OUTLINE_COLOR[0], OUTLINE_COLOR[1], OUTLINE_COLOR[2], 255]));
    }

    #[test]
    fn test_fallback_ring_stays_on_canvas_at_full_radius() {
        let size = 400;
        let out = composite(
            &red_photo(64),
            None,
            size,
            &CircleGeometry::default(),
            ResampleQuality::Best,
        )
        .unwrap();
        // Ring is pulled inward to [r - 4, r], so the top edge midpoint is ring-colored.
        let px = out.image().get_pixel(200, 2);
        assert_eq!(px, &Rgba([OUTLINE_COLOR[0], OUTLINE_COLOR[1], OUTLINE_COLOR[2], 255]));
        assert_eq!(out.image().get_pixel(200, 200), &RED);
    }

    #[test]
    fn test_frame_is_drawn_on_top() {
        let size = 100;
        let frame = blue_frame(50, 0.3);
        let out = composite(
            &red_photo(32),
            Some(&frame),
            size,
            &CircleGeometry::default(),
            ResampleQuality::Best,
        )
        .unwrap();
        assert_eq!(out.image().get_pixel(50, 50), &RED);
        // Inside the photo circle but covered by the frame.
        assert_eq!(out.image().get_pixel(50, 8), &Rgba([0, 0, 255, 255]));
        // Outside the circle only the frame contributes.
        assert_eq!(out.image().get_pixel(0, 0), &Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_composite_is_deterministic() {
        let photo = red_photo(37);
        let frame = blue_frame(64, 0.45);
        let geometry = CircleGeometry::new(0.45);
        let a = composite(&photo, Some(&frame), 150, &geometry, ResampleQuality::Best).unwrap();
        let b = composite(&photo, Some(&frame), 150, &geometry, ResampleQuality::Best).unwrap();
        assert_eq!(a, b);
        let c = composite(&photo, None, 150, &geometry, ResampleQuality::Best).unwrap();
        let d = composite(&photo, None, 150, &geometry, ResampleQuality::Best).unwrap();
        assert_eq!(c, d);
    }

    #[test]
    fn test_upscale_fallback() {
        let out = composite(
            &red_photo(16),
            None,
            64,
            &CircleGeometry::default(),
            ResampleQuality::Best,
        )
        .unwrap();
        let big = out.upscale(256, ResampleQuality::Best).unwrap();
        assert_eq!(big.side(), 256);
        assert_eq!(out.upscale(64, ResampleQuality::Fast).unwrap(), out);
        assert_eq!(out.upscale(0, ResampleQuality::Fast), Err(RenderError::InvalidSize));
    }

    #[test]
    fn test_geometry_is_sanitized() {
        assert_eq!(CircleGeometry::new(0.9).radius_fraction(), 0.5);
        assert_eq!(CircleGeometry::new(-1.0).radius_fraction(), CIRCLE_RADIUS_FRACTION);
        assert_eq!(CircleGeometry::new(f32::NAN).radius_fraction(), CIRCLE_RADIUS_FRACTION);
        assert_eq!(CircleGeometry::new(0.35).radius(1000), 350.0);
    }
}
