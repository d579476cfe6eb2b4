// SPDX-License-Identifier: GPL-3.0-or-later
// src/main.rs
//
// Command-line entry point: frame one photo and export it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{ArgAction, Parser};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use haloframe::app::{FrameHandle, Pipeline};
use haloframe::config::AppConfig;
use haloframe::domain::crop::clamp_zoom;
use haloframe::domain::source::content_type_for_path;
use haloframe::domain::{
    CropRegion, CropSelector, CropSpec, FixedSelector, ResampleQuality, export,
};

#[derive(Parser, Debug)]
#[command(
    name = "haloframe",
    version,
    about = "Crop a photo into a circle and place it inside a decorative frame"
)]
struct Args {
    /// Photo to frame
    photo: PathBuf,
    /// Frame artwork (PNG, JPEG, WebP or SVG)
    #[arg(long)]
    frame: Option<PathBuf>,
    /// Explicit square crop in source pixels
    #[arg(long, value_name = "X,Y,SIDE", value_parser = parse_crop)]
    crop: Option<(u32, u32, u32)>,
    /// Viewport zoom (viewport pixels per source pixel)
    #[arg(long)]
    zoom: Option<f32>,
    /// Pan the default selection by screen pixels
    #[arg(long, value_name = "DX,DY", value_parser = parse_pan, allow_hyphen_values = true)]
    pan: Option<(f32, f32)>,
    /// Photo circle radius as a fraction of the output side
    #[arg(long)]
    radius: Option<f32>,
    #[arg(long)]
    preview_size: Option<u32>,
    #[arg(long)]
    download_size: Option<u32>,
    /// Resampling quality: fast, balanced or best
    #[arg(long)]
    quality: Option<ResampleQuality>,
    /// Directory for the exported PNG
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Prefix of the exported file name
    #[arg(long)]
    product: Option<String>,
    /// Also write the preview composite to this path
    #[arg(long)]
    preview: Option<PathBuf>,
    /// Open the exported file with the system viewer
    #[arg(long, action = ArgAction::SetTrue)]
    open: bool,
    /// Persist the effective settings as the new defaults
    #[arg(long, action = ArgAction::SetTrue)]
    save_config: bool,
    /// Debug logging
    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Args {
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(frame) = &self.frame {
            config.frame_path = frame.clone();
        }
        if let Some(radius) = self.radius {
            config.radius_fraction = radius;
        }
        if let Some(size) = self.preview_size {
            config.preview_size = size;
        }
        if let Some(size) = self.download_size {
            config.download_size = size;
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(product) = &self.product {
            config.product_name = product.clone();
        }
    }
}

fn parse_crop(s: &str) -> Result<(u32, u32, u32), String> {
    let parts = s
        .split(',')
        .map(|p| p.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid crop '{s}': {e}"))?;
    match parts.as_slice() {
        [x, y, side] if *side > 0 => Ok((*x, *y, *side)),
        [_, _, _] => Err("crop side must be greater than zero".to_string()),
        _ => Err(format!("expected X,Y,SIDE, got '{s}'")),
    }
}

fn parse_pan(s: &str) -> Result<(f32, f32), String> {
    let (dx, dy) = s
        .split_once(',')
        .ok_or_else(|| format!("expected DX,DY, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f32>()
            .map_err(|e| format!("invalid pan '{s}': {e}"))
    };
    Ok((parse(dx)?, parse(dy)?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let mut config = AppConfig::load();
    args.apply_to(&mut config);
    if args.save_config {
        config.save()?;
    }

    // Start loading the frame right away; only compositing waits on it.
    let frame = FrameHandle::spawn(config.frame_path.clone());
    let pipeline = Arc::new(Pipeline::new(frame, config.settings()));

    let mut events = pipeline.subscribe();
    let progress = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some((percent, label)) = event.describe() {
                        log::info!("[{percent:>3}%] {label}");
                    }
                }
                Err(RecvError::Lagged(n)) => log::debug!("Progress display skipped {n} events"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let bytes = tokio::fs::read(&args.photo)
        .await
        .with_context(|| format!("failed to read {}", args.photo.display()))?;
    let content_type = content_type_for_path(&args.photo);
    pipeline.upload(bytes, content_type).await?;

    let crop = match args.crop {
        Some((x, y, side)) => {
            let zoom = clamp_zoom(args.zoom.unwrap_or(config.viewport_size / side as f32));
            FixedSelector(CropSpec::new(CropRegion::square(x, y, side), zoom)).crop_spec()
        }
        None => {
            let Some(mut selector) = pipeline.default_selector() else {
                bail!("photo was not loaded");
            };
            if let Some(zoom) = args.zoom {
                selector.set_zoom(zoom);
            }
            if let Some((dx, dy)) = args.pan {
                selector.pan(dx, dy);
            }
            selector.crop_spec()
        }
    };
    let crop = pipeline.set_crop(crop)?;
    log::debug!("Using crop {:?} at zoom {:.2}", crop.region.as_tuple(), crop.zoom());

    let preview = pipeline.confirm_crop().await?;
    if let Some(path) = &args.preview {
        let bytes = export::encode_png(&preview)?;
        tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("failed to write preview {}", path.display()))?;
        log::info!("Preview written to {}", path.display());
    }

    let saved = pipeline
        .download(&config.output_dir(), &config.product_name)
        .await?;
    println!("{}", saved.display());

    if args.open {
        if let Err(e) = open::that(&saved) {
            log::warn!("Could not open {}: {e}", saved.display());
        }
    }

    drop(pipeline);
    join_progress(progress).await;
    Ok(())
}

/// Wait for the progress display to drain. A crash there is logged, not hidden.
async fn join_progress(progress: JoinHandle<()>) -> bool {
    match progress.await {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Progress display task failed: {e}");
            false
        }
    }
}
