// SPDX-License-Identifier: GPL-3.0-or-later
// src/error.rs
//
// Error taxonomy for every pipeline step.

use thiserror::Error;

use crate::app::session::{SessionId, Stage};

/// Upload could not be turned into a bitmap.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("No image data was provided")]
    Empty,

    #[error("Unsupported file type '{0}', please select a valid image file")]
    UnsupportedType(String),

    #[error("Could not decode image: {0}")]
    Undecodable(#[from] image::ImageError),

    #[error("Could not read image file: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame asset could not be loaded. Never fatal: the composite degrades
/// to an outline ring instead.
///
/// Carries strings only so it can be cloned out of a shared future.
#[derive(Debug, Clone, Error)]
pub enum FrameLoadError {
    #[error("Frame asset not found at {0}")]
    Missing(String),

    #[error("Failed to decode frame asset: {0}")]
    Decode(String),

    #[error("Failed to parse frame SVG: {0}")]
    Svg(String),
}

/// Invalid crop geometry or a drawing surface that could not be allocated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("Crop region has zero width or height")]
    DegenerateCrop,

    #[error("Crop region ({x}, {y}, {width}x{height}) exceeds image bounds {image_width}x{image_height}")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        image_width: u32,
        image_height: u32,
    },

    #[error("Output size must be greater than zero")]
    InvalidSize,

    #[error("Failed to allocate a {width}x{height} drawing surface")]
    Surface { width: u32, height: u32 },
}

/// Export failed.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),

    #[error("Failed to write exported image: {0}")]
    Io(#[from] std::io::Error),
}

/// Anything a pipeline call can report back to the user.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("Session {0} was replaced before the result was ready")]
    Superseded(SessionId),

    #[error("Cannot go from {from} to {to}")]
    InvalidTransition { from: Stage, to: Stage },

    #[error("No image to crop")]
    NoSource,

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl PipelineError {
    /// Whether this error should be shown to the user as a blocking notice.
    ///
    /// Stale results are dropped silently: the user already moved on.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Superseded(_))
    }
}
