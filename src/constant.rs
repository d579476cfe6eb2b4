// SPDX-License-Identifier: GPL-3.0-or-later
// src/constant.rs
//
// Application constants that should not be changed by the user.

/// Product name used as the prefix of exported file names.
pub const PRODUCT_NAME: &str = "haloframe";

/// Configuration directory name (under the platform config dir).
pub const CONFIG_DIR: &str = "haloframe";

/// Configuration file name.
pub const CONFIG_FILE: &str = "config.json";

/// Default frame asset location, relative to the working directory.
pub const DEFAULT_FRAME_PATH: &str = "poster/poster.png";

/// Side of the cropped photo bitmap in pixels.
pub const CROP_OUTPUT_SIZE: u32 = 1200;

/// Side of the on-screen preview composite in pixels.
pub const PREVIEW_SIZE: u32 = 1200;

/// Side of the downloaded composite in pixels (native poster resolution).
pub const DOWNLOAD_SIZE: u32 = 3375;

/// Default circle radius as a fraction of the canvas side.
pub const CIRCLE_RADIUS_FRACTION: f32 = 0.5;

/// Crop viewport side in screen pixels (desktop layout).
pub const VIEWPORT_SIZE: f32 = 320.0;

/// Zoom applied when an image is first bound to the crop viewport.
pub const DEFAULT_ZOOM: f32 = 0.8;

/// Minimum zoom factor.
pub const MIN_ZOOM: f32 = 0.1;

/// Maximum zoom factor.
pub const MAX_ZOOM: f32 = 2.0;

/// Zoom increment for zoom in/out buttons.
pub const ZOOM_STEP: f32 = 0.1;

/// Fallback ring color when the frame asset is missing (#667eea).
pub const OUTLINE_COLOR: [u8; 3] = [0x66, 0x7e, 0xea];

/// Minimum fallback ring width in pixels.
pub const OUTLINE_MIN_WIDTH: f32 = 4.0;

/// Fallback ring width as a fraction of the canvas side.
pub const OUTLINE_WIDTH_FRACTION: f32 = 0.005;

/// Gap between the photo circle and the fallback ring in pixels.
pub const OUTLINE_GAP: f32 = 2.0;

/// Capacity of the stage event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Minimum pixmap size (prevents 0x0 surfaces).
pub const MIN_PIXMAP_SIZE: u32 = 1;
