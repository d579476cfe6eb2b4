// SPDX-License-Identifier: GPL-3.0-or-later
// src/domain/orientation.rs
//
// EXIF orientation handling for uploads (phone photos are often stored sideways).

use image::DynamicImage;

/// Rotate/flip `bitmap` so it is upright according to the EXIF tag in `bytes`.
///
/// Images without EXIF data or with an unreadable tag are returned unchanged.
#[cfg(feature = "exif")]
pub fn apply_exif_orientation(mut bitmap: DynamicImage, bytes: &[u8]) -> DynamicImage {
    use image::metadata::Orientation;

    let Some(value) = read_orientation(bytes) else {
        return bitmap;
    };

    match u8::try_from(value).ok().and_then(Orientation::from_exif) {
        Some(orientation) => {
            if orientation != Orientation::NoTransforms {
                log::debug!("Applying EXIF orientation {value}");
            }
            bitmap.apply_orientation(orientation);
        }
        None => log::warn!("Ignoring invalid EXIF orientation {value}"),
    }

    bitmap
}

#[cfg(not(feature = "exif"))]
pub fn apply_exif_orientation(bitmap: DynamicImage, _bytes: &[u8]) -> DynamicImage {
    bitmap
}

#[cfg(feature = "exif")]
fn read_orientation(bytes: &[u8]) -> Option<u32> {
    let mut cursor = std::io::Cursor::new(bytes);
    let exif = exif::Reader::new().read_from_container(&mut cursor).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0)
}
