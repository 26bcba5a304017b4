//! Shared test utilities.
//!
//! Provides a synthetic [`Image`] builder for classification tests and a
//! real-JPEG writer for tests that exercise decoding or thumbnail encoding.

use crate::sanitize::url_safe_path;
use crate::types::Image;
use chrono::{DateTime, TimeZone, Utc};
use std::path::{Path, PathBuf};

/// A minimal but well-formed image record at the given relative path,
/// as the scanner would produce it (before assembly attaches anything).
pub fn synthetic_image(rel_path: &str) -> Image {
    let base = rel_path.rsplit('/').next().unwrap_or(rel_path);
    Image {
        in_path: PathBuf::from("/in").join(rel_path),
        rel_path: rel_path.to_string(),
        base_name: url_safe_path(base),
        hier: rel_path.split('/').map(String::from).collect(),
        width: 100,
        height: 75,
        mod_time: Utc.with_ymd_and_hms(2023, 1, 1, 12, 0, 0).unwrap(),
        ..Image::default()
    }
}

/// Shorthand for a midday UTC capture timestamp.
pub fn taken(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
    Some(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
}

/// Write a real (tiny) JPEG to `path`, creating parent directories.
///
/// Carries no EXIF block: the scanner must treat it as a valid photo with an
/// unknown capture time. Note that EXIF-less images all share the same dedup
/// exposure key — multi-image discovery tests want [`write_jpeg_with_exif`]
/// with distinct dates instead.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([96, 112, 128]));
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Write a tiny JPEG with a real EXIF APP1 segment carrying
/// `DateTimeOriginal` (EXIF format, e.g. `2023:01:15 10:00:00`) and an ISO
/// rating.
pub fn write_jpeg_with_exif(path: &Path, width: u32, height: u32, taken_exif: &str, iso: u16) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([96, 112, 128]));
    let mut jpeg = Vec::new();
    img.write_to(
        &mut std::io::Cursor::new(&mut jpeg),
        image::ImageFormat::Jpeg,
    )
    .unwrap();

    // Splice the APP1 segment in right after SOI.
    let app1 = exif_app1(taken_exif, iso);
    let mut out = Vec::with_capacity(jpeg.len() + app1.len());
    out.extend_from_slice(&jpeg[..2]);
    out.extend_from_slice(&app1);
    out.extend_from_slice(&jpeg[2..]);
    std::fs::write(path, out).unwrap();
}

/// Minimal big-endian TIFF block with one IFD holding ISOSpeedRatings
/// (0x8827, SHORT) and DateTimeOriginal (0x9003, ASCII), wrapped in a JPEG
/// APP1 marker.
fn exif_app1(datetime: &str, iso: u16) -> Vec<u8> {
    assert_eq!(datetime.len(), 19, "EXIF dates are exactly 19 chars");

    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"MM\x00\x2A");
    tiff.extend_from_slice(&8u32.to_be_bytes()); // IFD0 starts right after the header

    tiff.extend_from_slice(&2u16.to_be_bytes()); // entry count

    // ISOSpeedRatings: SHORT, value left-justified in the 4-byte field
    tiff.extend_from_slice(&0x8827u16.to_be_bytes());
    tiff.extend_from_slice(&3u16.to_be_bytes());
    tiff.extend_from_slice(&1u32.to_be_bytes());
    tiff.extend_from_slice(&iso.to_be_bytes());
    tiff.extend_from_slice(&[0, 0]);

    // DateTimeOriginal: ASCII, 20 bytes including NUL, stored after the IFD
    let date_offset = 8u32 + 2 + 2 * 12 + 4;
    tiff.extend_from_slice(&0x9003u16.to_be_bytes());
    tiff.extend_from_slice(&2u16.to_be_bytes());
    tiff.extend_from_slice(&20u32.to_be_bytes());
    tiff.extend_from_slice(&date_offset.to_be_bytes());

    tiff.extend_from_slice(&0u32.to_be_bytes()); // no next IFD

    let mut date = datetime.as_bytes().to_vec();
    date.push(0);
    tiff.extend_from_slice(&date);

    let mut app1 = vec![0xFF, 0xE1];
    app1.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    app1.extend_from_slice(b"Exif\x00\x00");
    app1.extend_from_slice(&tiff);
    app1
}
