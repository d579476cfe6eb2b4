// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/crop/mod.rs
//
// Crop geometry: regions, specs and the selector seam.

mod region;
mod selector;

pub use region::{CropRegion, CropSpec, clamp_zoom};
pub use selector::{CropSelector, FixedSelector, ViewportSelector};
