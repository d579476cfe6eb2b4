// SPDX-License-Identifier: GPL-3.0-or-later
// src/app/mod.rs
//
// Session flow on top of the pure image pipeline.

pub mod frame;
pub mod message;
pub mod pipeline;
pub mod session;

pub use frame::FrameHandle;
pub use message::{PipelineEvent, RenderStep};
pub use pipeline::{Pipeline, RenderSettings};
pub use session::{ErrorNotice, SessionId, Stage};
