// SPDX-License-Identifier: GPL-3.0-or-later
// src/lib.rs
//
// Crop a photo into a circle and composite it inside a decorative frame.

pub mod app;
pub mod config;
pub mod constant;
pub mod domain;
pub mod error;

pub use app::{FrameHandle, Pipeline, PipelineEvent, RenderSettings, SessionId, Stage};
pub use config::AppConfig;
pub use error::{DecodeError, EncodeError, FrameLoadError, PipelineError, RenderError};
