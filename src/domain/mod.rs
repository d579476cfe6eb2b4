// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/mod.rs
//
// Pure image pipeline: loading, crop geometry, compositing and export.
// No session or async concerns live here.

pub mod compose;
pub mod crop;
pub mod export;
pub mod frame;
mod orientation;
pub mod source;

pub use compose::{CircleGeometry, Composite, CroppedBitmap, ResampleQuality};
pub use crop::{CropRegion, CropSelector, CropSpec, FixedSelector, ViewportSelector};
pub use frame::FrameAsset;
pub use source::SourceImage;
