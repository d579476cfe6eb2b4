// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/selector.rs
//
// Crop selector interface and a headless pan/zoom implementation.

use super::region::{CropRegion, CropSpec, clamp_zoom};
use crate::constant::{DEFAULT_ZOOM, MAX_ZOOM, ZOOM_STEP};

/// Anything that can tell the pipeline which square of the source to use.
///
/// Interactive widgets and the headless [`ViewportSelector`] both implement
/// this. The returned region must be square; the compositor does not
/// enforce it.
pub trait CropSelector {
    /// Current selection in source pixel coordinates.
    fn crop_spec(&self) -> CropSpec;

    /// Return to the default selection for the bound image.
    fn reset(&mut self);
}

/// Square viewport panned and zoomed over an image.
///
/// Zoom is viewport pixels per source pixel, so the selected square has a
/// side of `viewport / zoom` source pixels. The square never leaves the
/// image: zoom is raised when needed and the center is clamped.
#[derive(Debug, Clone)]
pub struct ViewportSelector {
    image_width: u32,
    image_height: u32,
    viewport: f32,
    zoom: f32,
    center: (f32, f32),
    drag_start: Option<((f32, f32), (f32, f32))>,
    pinch_start: Option<f32>,
}

impl ViewportSelector {
    /// Bind an image to a viewport of `viewport` screen pixels per side.
    pub fn new(image_width: u32, image_height: u32, viewport: f32) -> Self {
        let mut selector = Self {
            image_width: image_width.max(1),
            image_height: image_height.max(1),
            viewport: viewport.max(1.0),
            zoom: DEFAULT_ZOOM,
            center: (0.0, 0.0),
            drag_start: None,
            pinch_start: None,
        };
        selector.reset();
        selector
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn center(&self) -> (f32, f32) {
        self.center
    }

    fn min_dimension(&self) -> f32 {
        self.image_width.min(self.image_height) as f32
    }

    /// Smallest zoom at which the viewport square still fits in the image.
    fn boundary_zoom(&self) -> f32 {
        (self.viewport / self.min_dimension()).min(MAX_ZOOM)
    }

    /// Side of the selected square in source pixels.
    fn side(&self) -> f32 {
        (self.viewport / self.zoom).min(self.min_dimension())
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = clamp_zoom(zoom).max(self.boundary_zoom());
        self.clamp_center();
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP);
    }

    /// Remember the zoom at the start of a two-finger gesture.
    pub fn begin_pinch(&mut self) {
        self.pinch_start = Some(self.zoom);
    }

    /// Scale the zoom captured by [`begin_pinch`](Self::begin_pinch) by
    /// the ratio of current to initial finger distance.
    pub fn pinch(&mut self, scale: f32) {
        if let Some(initial) = self.pinch_start {
            self.set_zoom(initial * scale);
        }
    }

    pub fn end_pinch(&mut self) {
        self.pinch_start = None;
    }

    /// Move the image by a screen-space delta (the selection moves the other way).
    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.center.0 -= dx / self.zoom;
        self.center.1 -= dy / self.zoom;
        self.clamp_center();
    }

    pub fn start_drag(&mut self, x: f32, y: f32) {
        self.drag_start = Some(((x, y), self.center));
    }

    pub fn update_drag(&mut self, x: f32, y: f32) {
        let Some(((start_x, start_y), (cx, cy))) = self.drag_start else {
            return;
        };
        self.center = (cx - (x - start_x) / self.zoom, cy - (y - start_y) / self.zoom);
        self.clamp_center();
    }

    pub fn end_drag(&mut self) {
        self.drag_start = None;
    }

    /// Center the selection on a source pixel position.
    pub fn center_on(&mut self, x: f32, y: f32) {
        self.center = (x, y);
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        let half = self.side() / 2.0;
        let (w, h) = (self.image_width as f32, self.image_height as f32);
        self.center.0 = self.center.0.clamp(half, (w - half).max(half));
        self.center.1 = self.center.1.clamp(half, (h - half).max(half));
    }
}

impl CropSelector for ViewportSelector {
    fn crop_spec(&self) -> CropSpec {
        let min_dim = self.image_width.min(self.image_height);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let side = (self.side().round() as u32).clamp(1, min_dim);
        let half = side as f32 / 2.0;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let x = ((self.center.0 - half).round().max(0.0) as u32).min(self.image_width - side);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let y = ((self.center.1 - half).round().max(0.0) as u32).min(self.image_height - side);

        CropSpec::new(CropRegion::square(x, y, side), self.zoom)
    }

    fn reset(&mut self) {
        self.zoom = clamp_zoom(DEFAULT_ZOOM).max(self.boundary_zoom());
        self.center = (
            self.image_width as f32 / 2.0,
            self.image_height as f32 / 2.0,
        );
        self.drag_start = None;
        self.pinch_start = None;
        self.clamp_center();
    }
}

/// A selector that always returns the same spec. Useful when the crop comes
/// from the command line or from a test.
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector(pub CropSpec);

impl CropSelector for FixedSelector {
    fn crop_spec(&self) -> CropSpec {
        self.0
    }

    fn reset(&mut self) {}
}
