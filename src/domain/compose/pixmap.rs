// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/compose/pixmap.rs
//
// Conversions between image-rs buffers (straight alpha) and tiny-skia
// pixmaps (premultiplied alpha).

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{IntSize, Pixmap};

use crate::error::RenderError;

/// Copy an RGBA image into a premultiplied pixmap.
pub fn rgba_to_pixmap(image: &RgbaImage) -> Result<Pixmap, RenderError> {
    let (width, height) = image.dimensions();
    let surface_error = RenderError::Surface { width, height };
    let size = IntSize::from_wh(width, height).ok_or(surface_error.clone())?;

    let mut data = Vec::with_capacity(image.as_raw().len());
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        data.extend_from_slice(&[premultiply(r, a), premultiply(g, a), premultiply(b, a), a]);
    }

    Pixmap::from_vec(data, size).ok_or(surface_error)
}

/// Convert a tiny-skia pixmap back to a straight-alpha RGBA image.
pub fn pixmap_to_rgba(pixmap: &Pixmap) -> RgbaImage {
    let mut image = RgbaImage::new(pixmap.width(), pixmap.height());
    for (dst, src) in image.pixels_mut().zip(pixmap.pixels()) {
        let color = src.demultiply();
        *dst = Rgba([color.red(), color.green(), color.blue(), color.alpha()]);
    }
    image
}

#[allow(clippy::cast_possible_truncation)]
fn premultiply(channel: u8, alpha: u8) -> u8 {
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
