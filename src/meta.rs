//! Per-file photo metadata extraction.
//!
//! Two embedded sources feed one [`FileMeta`]:
//!
//! - **EXIF** (via `rexif`): capture timestamp, camera make/model, lens,
//!   exposure values, and the image description.
//! - **IPTC** (APP13 / Photoshop 8BIM, parsed here): title (ObjectName 2:05),
//!   caption (Caption-Abstract 2:120), and keyword tags (Keywords 2:25) —
//!   the fields photo tools like Lightroom actually write.
//!
//! Every field is optional and tolerated when missing: a file with no EXIF
//! block at all still yields a usable record. The single fatal case is a
//! `DateTimeOriginal` that is present but unparseable — a corrupt date is a
//! sign of something worse, so it aborts discovery rather than silently
//! misdating the photo.
//!
//! Camera strings get light normalization so index pages read well: vendor
//! boilerplate (`CORPORATION`) is dropped from the make, the make is removed
//! from the model (many cameras repeat it), and focal lengths lose a
//! pointless trailing `.0`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// EXIF dates look like `2023:01:15 14:03:22`.
const EXIF_DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

#[derive(Error, Debug)]
pub enum MetaError {
    #[error("unparseable capture date {value:?} in {path}")]
    BadDate { path: String, value: String },
}

/// Metadata extracted from one photo file.
#[derive(Debug, Clone, Default)]
pub struct FileMeta {
    pub taken: Option<DateTime<Utc>>,
    pub make: String,
    pub model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub aperture: Option<f64>,
    pub focal_length: String,
    pub iso: Option<u32>,
    pub shutter_speed: String,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
}

/// Optional JSON sidecar co-located as `<image-path>.json`, compatible with
/// Google Takeout exports.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Sidecar {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

/// Read all embedded metadata for one file.
///
/// Missing fields are left at their zero value and logged at debug level;
/// only a present-but-unparseable capture date is an error.
pub fn read(path: &Path) -> Result<FileMeta, MetaError> {
    let mut meta = FileMeta::default();

    match rexif::parse_file(path) {
        Ok(exif) => apply_exif(path, &exif, &mut meta)?,
        Err(e) => debug!("no exif data for {}: {e}", path.display()),
    }

    let iptc = read_iptc(path);
    meta.title = iptc.title;
    meta.keywords = iptc.keywords;
    if meta.description.is_empty() {
        meta.description = iptc.caption;
    }

    Ok(meta)
}

fn apply_exif(path: &Path, exif: &rexif::ExifData, meta: &mut FileMeta) -> Result<(), MetaError> {
    for entry in &exif.entries {
        let value = entry.value_more_readable.trim();
        match entry.tag {
            rexif::ExifTag::Make => meta.make = clean_make(value),
            rexif::ExifTag::Model => meta.model = value.to_string(),
            rexif::ExifTag::LensMake => meta.lens_make = value.to_string(),
            rexif::ExifTag::LensModel => meta.lens_model = value.to_string(),
            rexif::ExifTag::ISOSpeedRatings => meta.iso = value.parse().ok(),
            rexif::ExifTag::ApertureValue => meta.aperture = parse_numeric(value),
            rexif::ExifTag::ExposureTime => {
                meta.shutter_speed = value.trim_end_matches(" s").to_string();
            }
            rexif::ExifTag::FocalLength => {
                meta.focal_length = value.replace(".0", "");
            }
            rexif::ExifTag::ImageDescription => meta.description = value.to_string(),
            rexif::ExifTag::DateTimeOriginal => {
                // ASCII values sometimes keep their trailing NUL
                let cleaned = value.trim_matches(char::from(0)).trim();
                meta.taken = Some(parse_exif_date(path, cleaned)?);
            }
            _ => {}
        }
    }

    // Many cameras repeat the make inside the model string.
    if !meta.make.is_empty() {
        meta.model = meta.model.replace(&meta.make, "").trim().to_string();
    }

    if meta.taken.is_none() {
        debug!("no capture date for {}", path.display());
    }

    Ok(())
}

fn clean_make(raw: &str) -> String {
    raw.replace("CORPORATION", "").trim().to_string()
}

fn parse_exif_date(path: &Path, value: &str) -> Result<DateTime<Utc>, MetaError> {
    NaiveDateTime::parse_from_str(value, EXIF_DATE_FORMAT)
        .map(|naive| DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc))
        .map_err(|_| MetaError::BadDate {
            path: path.display().to_string(),
            value: value.to_string(),
        })
}

/// Pull the numeric portion out of a readable EXIF value like `f/2.8`.
fn parse_numeric(value: &str) -> Option<f64> {
    let digits: String = value
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

// ---------------------------------------------------------------------------
// IPTC-IIM (APP13) parsing
// ---------------------------------------------------------------------------

/// IPTC fields extracted from a JPEG's APP13 segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IptcFields {
    pub title: String,
    pub caption: String,
    pub keywords: Vec<String>,
}

const PHOTOSHOP_HEADER: &[u8] = b"Photoshop 3.0\0";
const RESOURCE_MARKER: &[u8] = b"8BIM";
const IPTC_RESOURCE: u16 = 0x0404;

/// Read IPTC metadata from a JPEG file. Any parse failure, including a
/// missing file, yields empty fields — IPTC is always optional.
pub fn read_iptc(path: &Path) -> IptcFields {
    match std::fs::read(path) {
        Ok(bytes) => app13_resource(&bytes)
            .map(parse_iim)
            .unwrap_or_default(),
        Err(_) => IptcFields::default(),
    }
}

/// Walk JPEG segments up to start-of-scan looking for an APP13 marker whose
/// Photoshop resource block carries IPTC data (resource 0x0404).
fn app13_resource(data: &[u8]) -> Option<&[u8]> {
    let mut pos = 2; // past SOI
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None; // not a marker stream anymore
        }
        let marker = data[pos + 1];
        match marker {
            0xDA => return None, // image data starts
            0xD8 | 0xD9 | 0xD0..=0xD7 => {
                pos += 2;
                continue;
            }
            _ => {}
        }
        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let seg_end = (pos + 2 + seg_len).min(data.len());
        if marker == 0xED
            && let Some(block) = iptc_from_resources(&data[pos + 4..seg_end])
        {
            return Some(block);
        }
        pos += 2 + seg_len;
    }
    None
}

/// Scan Photoshop 8BIM resource blocks for the IPTC resource.
///
/// Each block: `8BIM` + resource id (u16) + pascal name (padded to even) +
/// data length (u32) + data (padded to even).
fn iptc_from_resources(segment: &[u8]) -> Option<&[u8]> {
    let data = segment.strip_prefix(PHOTOSHOP_HEADER).unwrap_or(segment);

    let mut pos = 0;
    while pos + 12 <= data.len() {
        if &data[pos..pos + 4] != RESOURCE_MARKER {
            pos += 1;
            continue;
        }
        let id = u16::from_be_bytes([data[pos + 4], data[pos + 5]]);
        pos += 6;

        let name_len = *data.get(pos)? as usize;
        pos += 1 + name_len + (1 + name_len) % 2;

        if pos + 4 > data.len() {
            return None;
        }
        let len =
            u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]) as usize;
        pos += 4;
        if pos + len > data.len() {
            return None;
        }
        if id == IPTC_RESOURCE {
            return Some(&data[pos..pos + len]);
        }
        pos += len + len % 2;
    }
    None
}

/// Parse IPTC-IIM datasets: `0x1C`, record, dataset, big-endian length, data.
/// Only application record 2 matters here.
fn parse_iim(block: &[u8]) -> IptcFields {
    let mut fields = IptcFields::default();
    let mut pos = 0;

    while pos + 5 <= block.len() {
        if block[pos] != 0x1C {
            pos += 1;
            continue;
        }
        let record = block[pos + 1];
        let dataset = block[pos + 2];
        let len = u16::from_be_bytes([block[pos + 3], block[pos + 4]]) as usize;
        pos += 5;
        if pos + len > block.len() {
            break;
        }

        if record == 2 {
            let value = String::from_utf8_lossy(&block[pos..pos + len])
                .trim()
                .to_string();
            if !value.is_empty() {
                match dataset {
                    5 => fields.title = value,
                    25 => fields.keywords.push(value),
                    120 => fields.caption = value,
                    _ => {}
                }
            }
        }
        pos += len;
    }

    fields
}
