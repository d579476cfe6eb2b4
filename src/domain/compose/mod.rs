// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/compose/mod.rs
//
// Compositor: crop rendering and circular framing.

mod composite;
pub(crate) mod pixmap;
mod render;

pub use composite::{CircleGeometry, Composite, composite};
pub use render::{CroppedBitmap, ResampleQuality, render_crop};
