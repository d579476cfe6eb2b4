// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/export.rs
//
// PNG encoding and timestamped save.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::ImageEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};

use super::compose::Composite;
use crate::error::EncodeError;

/// Timestamp layout: ISO 8601 to the second, colons swapped for dashes.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Encode losslessly as PNG.
pub fn encode_png(composite: &Composite) -> Result<Vec<u8>, EncodeError> {
    let image = composite.image();
    let mut out = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(out)
}

/// `<product>-YYYY-MM-DDTHH-MM-SS.png`
pub fn export_file_name(product: &str, at: DateTime<Utc>) -> String {
    format!("{product}-{}.png", at.format(TIMESTAMP_FORMAT))
}

/// Encode `composite` and write it into `dir` under a timestamped name.
pub fn save(
    composite: &Composite,
    dir: &Path,
    product: &str,
    at: DateTime<Utc>,
) -> Result<PathBuf, EncodeError> {
    let bytes = encode_png(composite)?;
    write_png(&bytes, dir, product, at)
}

/// Write already encoded PNG bytes into `dir` under a timestamped name.
///
/// The directory is created if needed. An existing file with the same name
/// (two exports within one second) gets a numeric suffix instead of being
/// overwritten; the file is created exclusively, so this holds even when
/// another writer races for the same name.
pub fn write_png(
    bytes: &[u8],
    dir: &Path,
    product: &str,
    at: DateTime<Utc>,
) -> Result<PathBuf, EncodeError> {
    fs::create_dir_all(dir)?;

    let name = export_file_name(product, at);
    let stem = name.trim_end_matches(".png");
    let mut n = 0u32;
    loop {
        let path = if n == 0 {
            dir.join(&name)
        } else {
            dir.join(format!("{stem}-{n}.png"))
        };
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)?;
                log::info!("Exported {} ({} bytes)", path.display(), bytes.len());
                return Ok(path);
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compose::{CircleGeometry, CroppedBitmap, ResampleQuality, composite};
    use chrono::TimeZone;
    use image::{Rgba, RgbaImage};

    fn sample_composite() -> Composite {
        let photo = CroppedBitmap::from_image(RgbaImage::from_fn(24, 24, |x, y| {
            Rgba([(x * 10) as u8, (y * 10) as u8, 128, 255])
        }));
        composite(&photo, None, 64, &CircleGeometry::default(), ResampleQuality::Best).unwrap()
    }

    #[test]
    fn test_file_name_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(
            export_file_name("haloframe", at),
            "haloframe-2024-03-09T07-05-01.png"
        );
    }

    #[test]
    fn test_png_round_trip_is_lossless() {
        let composite = sample_composite();
        let bytes = encode_png(&composite).unwrap();
        assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&bytes).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (64, 64));
        assert_eq!(&decoded, composite.image());
    }

    #[test]
    fn test_save_never_overwrites() {
        let dir = std::env::temp_dir().join(format!("haloframe-export-{}", std::process::id()));
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let composite = sample_composite();

        let first = save(&composite, &dir, "test", at).unwrap();
        let second = save(&composite, &dir, "test", at).unwrap();
        assert_eq!(first.file_name().unwrap(), "test-2025-01-02T03-04-05.png");
        assert_eq!(second.file_name().unwrap(), "test-2025-01-02T03-04-05-1.png");
        assert!(first.exists() && second.exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_existing_file_is_left_untouched() {
        let dir = std::env::temp_dir().join(format!("haloframe-keep-{}", std::process::id()));
        let at = Utc.with_ymd_and_hms(2025, 6, 7, 8, 9, 10).unwrap();
        std::fs::create_dir_all(&dir).unwrap();
        let taken = dir.join(export_file_name("keep", at));
        std::fs::write(&taken, b"not ours").unwrap();

        let written = write_png(b"png bytes", &dir, "keep", at).unwrap();
        assert_eq!(written.file_name().unwrap(), "keep-2025-06-07T08-09-10-1.png");
        assert_eq!(std::fs::read(&taken).unwrap(), b"not ours");
        assert_eq!(std::fs::read(&written).unwrap(), b"png bytes");

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
