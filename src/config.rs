// SPDX-License-Identifier: GPL-3.0-or-later
// src/config.rs
//
// Persistent configuration stored as JSON in the user's config directory.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::app::pipeline::RenderSettings;
use crate::constant::{
    CIRCLE_RADIUS_FRACTION, CONFIG_DIR, CONFIG_FILE, CROP_OUTPUT_SIZE, DEFAULT_FRAME_PATH,
    DOWNLOAD_SIZE, PREVIEW_SIZE, PRODUCT_NAME, VIEWPORT_SIZE,
};
use crate::domain::{CircleGeometry, ResampleQuality};

/// Global configuration for the application.
///
/// Missing fields fall back to their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Frame artwork (PNG, JPEG, WebP or SVG).
    pub frame_path: PathBuf,
    /// Where downloads go. `None` means the user's picture directory.
    pub output_dir: Option<PathBuf>,
    /// Prefix of exported file names.
    pub product_name: String,
    /// Photo circle radius as a fraction of the output side. Tied to the frame artwork.
    pub radius_fraction: f32,
    pub crop_output_size: u32,
    pub preview_size: u32,
    pub download_size: u32,
    pub viewport_size: f32,
    pub quality: ResampleQuality,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_path: PathBuf::from(DEFAULT_FRAME_PATH),
            output_dir: None,
            product_name: PRODUCT_NAME.to_string(),
            radius_fraction: CIRCLE_RADIUS_FRACTION,
            crop_output_size: CROP_OUTPUT_SIZE,
            preview_size: PREVIEW_SIZE,
            download_size: DOWNLOAD_SIZE,
            viewport_size: VIEWPORT_SIZE,
            quality: ResampleQuality::default(),
        }
    }
}

impl AppConfig {
    /// `<config_dir>/haloframe/config.json`, if the platform has a config dir.
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default location. A missing or unreadable file yields defaults.
    pub fn load() -> Self {
        let Some(path) = Self::path() else {
            log::debug!("No config directory on this platform, using defaults");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring config at {}: {e:#}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save to the default location, returning where it was written.
    pub fn save(&self) -> anyhow::Result<PathBuf> {
        let path = Self::path().context("no config directory on this platform")?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data).with_context(|| format!("failed to write {}", path.display()))?;
        log::info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Resolved download directory.
    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::picture_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn settings(&self) -> RenderSettings {
        RenderSettings {
            crop_output_size: self.crop_output_size,
            preview_size: self.preview_size,
            download_size: self.download_size,
            viewport_size: self.viewport_size,
            geometry: CircleGeometry::new(self.radius_fraction),
            quality: self.quality,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_render_settings() {
        assert_eq!(AppConfig::default().settings(), RenderSettings::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "product_name": "club", "quality": "fast" }"#).unwrap();
        assert_eq!(config.product_name, "club");
        assert_eq!(config.quality, ResampleQuality::Fast);
        assert_eq!(config.download_size, DOWNLOAD_SIZE);
        assert_eq!(config.frame_path, PathBuf::from(DEFAULT_FRAME_PATH));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("haloframe-config-{}", std::process::id()));
        let path = dir.join("nested").join(CONFIG_FILE);
        let config = AppConfig {
            output_dir: Some(PathBuf::from("/tmp/out")),
            radius_fraction: 0.35,
            ..AppConfig::default()
        };

        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_invalid_radius_is_clamped_in_settings() {
        let config = AppConfig {
            radius_fraction: 3.0,
            ..AppConfig::default()
        };
        assert!(config.settings().geometry.radius_fraction() <= 0.5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("haloframe-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
