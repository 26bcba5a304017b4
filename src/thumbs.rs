//! Thumbnail variant generation.
//!
//! For each image the deriver produces one resized JPEG per named
//! [`ThumbSpec`] and copies the original into the output tree. Output names
//! carry the target dimension and the source modification time
//! (`dawn@y350_142233.jpg`), so an edited photo busts stale thumbnails by
//! name while the path stem stays readable.
//!
//! ## Reuse
//!
//! Encoding is the slow part of a build, so existing output is reused when
//! the copied original is still fresh (same size, source not newer) and the
//! thumbnail file on disk is plausibly intact (larger than 128 bytes and
//! decodable). Nothing else is cached — there is no manifest to corrupt or
//! carry between machines.
//!
//! ## Failure model
//!
//! Any failure here is an error. The caller treats thumbnail failure as fatal
//! to the whole collection: a half-thumbnailed site is worse than a loudly
//! failed build.

use crate::sanitize::url_safe_path;
use crate::types::{Image, ThumbMeta};
use image::imageops::FilterType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ThumbError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("degenerate source image: {0}")]
    EmptySource(PathBuf),
}

/// A named thumbnail variant: resize to an exact width or height (the free
/// axis preserves aspect), encoded as JPEG at the given quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbSpec {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: u8,
}

impl Default for ThumbSpec {
    fn default() -> Self {
        Self {
            width: None,
            height: None,
            quality: 85,
        }
    }
}

/// Produce all thumbnail variants for one image under `out_root`.
///
/// Also copies the original to its sanitized output path when missing or
/// stale (size mismatch, or source newer than the copy).
pub fn thumbnails(
    image: &Image,
    specs: &BTreeMap<String, ThumbSpec>,
    out_root: &Path,
) -> Result<BTreeMap<String, ThumbMeta>, ThumbError> {
    let full_dest = out_root.join(url_safe_path(&image.rel_path));
    debug!("thumbnails for {} -> {}", image.in_path.display(), full_dest.display());

    let src_stat = fs::metadata(&image.in_path)?;
    let updated = match fs::metadata(&full_dest) {
        Err(_) => {
            debug!("updating {}: does not exist", full_dest.display());
            true
        }
        Ok(dst) => {
            src_stat.len() != dst.len() || src_stat.modified()? > dst.modified()?
        }
    };

    if updated {
        if let Some(parent) = full_dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&image.in_path, &full_dest)?;
    }

    let mut thumbs = BTreeMap::new();
    let mut pending = Vec::new();

    for (name, spec) in specs {
        let rel_path = thumb_rel_path(image, spec);
        let full_path = out_root.join(&rel_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Reuse plausible existing output when the original is unchanged.
        if !updated
            && let Ok(stat) = fs::metadata(&full_path)
            && stat.len() > 128
        {
            match image::image_dimensions(&full_path) {
                Ok((width, height)) => {
                    debug!("reusing {} ({} bytes)", full_path.display(), stat.len());
                    thumbs.insert(
                        name.clone(),
                        ThumbMeta {
                            width,
                            height,
                            rel_path,
                            path: full_path,
                        },
                    );
                    continue;
                }
                Err(e) => warn!("unable to read thumb {}: {e}", full_path.display()),
            }
        }

        pending.push((name, spec, rel_path, full_path));
    }

    if pending.is_empty() {
        return Ok(thumbs);
    }

    let source = image::open(&image.in_path)?;
    if source.width() == 0 || source.height() == 0 {
        return Err(ThumbError::EmptySource(image.in_path.clone()));
    }

    for (name, spec, rel_path, full_path) in pending {
        let (width, height) = scaled_dimensions(source.width(), source.height(), spec);
        info!("creating {width}x{height} thumb: {}", full_path.display());

        let resized = source.resize_exact(width, height, FilterType::Lanczos3);
        let file = fs::File::create(&full_path)?;
        let mut writer = BufWriter::new(file);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut writer, spec.quality);
        resized.write_with_encoder(encoder)?;

        thumbs.insert(
            name.clone(),
            ThumbMeta {
                width: resized.width(),
                height: resized.height(),
                rel_path,
                path: full_path,
            },
        );
    }

    Ok(thumbs)
}

/// Target dimensions for a spec against a source size: the set axis is taken
/// exactly, the free axis scales to preserve aspect.
fn scaled_dimensions(src_w: u32, src_h: u32, spec: &ThumbSpec) -> (u32, u32) {
    match (spec.width, spec.height) {
        (Some(w), Some(h)) => (w, h),
        (Some(w), None) => (w, ((src_h as f64 * w as f64 / src_w as f64) as u32).max(1)),
        (None, Some(h)) => (((src_w as f64 * h as f64 / src_h as f64) as u32).max(1), h),
        (None, None) => (src_w, src_h),
    }
}

/// Output-relative path for a thumbnail: a `_/` sibling directory next to the
/// copied original, with the constrained dimension and source mtime in the
/// name. Height wins the name tag when both axes are set.
fn thumb_rel_path(image: &Image, spec: &ThumbSpec) -> String {
    let rel = Path::new(&image.rel_path);
    let stem = rel
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let parent = rel.parent().unwrap_or_else(|| Path::new(""));

    let dims = match (spec.width, spec.height) {
        (_, Some(h)) => format!("y{h}"),
        (Some(w), None) => format!("x{w}"),
        (None, None) => String::new(),
    };

    let name = format!("{stem}@{dims}_{}.jpg", image.mod_time.format("%H%M%S"));
    let joined = parent.join("_").join(name);
    url_safe_path(&joined.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{synthetic_image, write_jpeg};
    use tempfile::TempDir;

    fn spec(width: Option<u32>, height: Option<u32>) -> ThumbSpec {
        ThumbSpec {
            width,
            height,
            quality: 80,
        }
    }

    // =========================================================================
    // Dimension math
    // =========================================================================

    #[test]
    fn height_constrained_scales_width() {
        assert_eq!(scaled_dimensions(2048, 1536, &spec(None, Some(120))), (160, 120));
    }

    #[test]
    fn width_constrained_scales_height() {
        assert_eq!(scaled_dimensions(2048, 1536, &spec(Some(512), None)), (512, 384));
    }

    #[test]
    fn both_axes_taken_verbatim() {
        assert_eq!(scaled_dimensions(2048, 1536, &spec(Some(100), Some(100))), (100, 100));
    }

    #[test]
    fn no_axes_keeps_source_size() {
        assert_eq!(scaled_dimensions(640, 480, &spec(None, None)), (640, 480));
    }

    // =========================================================================
    // Naming
    // =========================================================================

    #[test]
    fn thumb_path_lives_in_underscore_dir() {
        let img = synthetic_image("Trip/Day One/IMG 01.jpg");
        let rel = thumb_rel_path(&img, &spec(None, Some(350)));
        assert!(rel.starts_with("trip/day_one/_/img_01@y350_"), "got {rel}");
        assert!(rel.ends_with(".jpg"));
    }

    #[test]
    fn thumb_name_prefers_height_tag() {
        let img = synthetic_image("a.jpg");
        assert!(thumb_rel_path(&img, &spec(Some(512), Some(350))).contains("@y350_"));
        assert!(thumb_rel_path(&img, &spec(Some(512), None)).contains("@x512_"));
    }

    #[test]
    fn root_level_image_gets_top_underscore_dir() {
        let img = synthetic_image("a.jpg");
        let rel = thumb_rel_path(&img, &spec(None, Some(120)));
        assert!(rel.starts_with("_/a@y120_"), "got {rel}");
    }

    // =========================================================================
    // Generation and reuse
    // =========================================================================

    fn fixture(src_w: u32, src_h: u32) -> (TempDir, TempDir, Image) {
        let in_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let path = in_dir.path().join("trip/dawn.jpg");
        write_jpeg(&path, src_w, src_h);

        let mut img = synthetic_image("trip/dawn.jpg");
        img.in_path = path;
        (in_dir, out_dir, img)
    }

    #[test]
    fn generates_variants_and_copies_original() {
        let (_in, out, img) = fixture(64, 48);
        let mut specs = BTreeMap::new();
        specs.insert("tiny".to_string(), spec(None, Some(12)));
        specs.insert("view".to_string(), spec(Some(32), None));

        let thumbs = thumbnails(&img, &specs, out.path()).unwrap();
        assert_eq!(thumbs.len(), 2);

        let tiny = &thumbs["tiny"];
        assert_eq!((tiny.width, tiny.height), (16, 12));
        assert!(tiny.path.exists());
        assert!(tiny.rel_path.starts_with("trip/_/dawn@y12_"));

        let view = &thumbs["view"];
        assert_eq!((view.width, view.height), (32, 24));

        // original copied to its sanitized output path
        assert!(out.path().join("trip/dawn.jpg").exists());
    }

    #[test]
    fn fresh_output_is_reused_not_regenerated() {
        let (_in, out, img) = fixture(64, 48);
        let mut specs = BTreeMap::new();
        specs.insert("tiny".to_string(), spec(None, Some(12)));

        let first = thumbnails(&img, &specs, out.path()).unwrap();

        // Overwrite the generated thumb with a different valid JPEG. If the
        // second run regenerated, dimensions would revert to 16x12.
        write_jpeg(&first["tiny"].path, 30, 30);
        let second = thumbnails(&img, &specs, out.path()).unwrap();
        assert_eq!((second["tiny"].width, second["tiny"].height), (30, 30));
    }

    #[test]
    fn changed_source_busts_reuse() {
        let (_in, out, img) = fixture(64, 48);
        let mut specs = BTreeMap::new();
        specs.insert("tiny".to_string(), spec(None, Some(12)));
        thumbnails(&img, &specs, out.path()).unwrap();

        // Rewrite the source with different content; the size mismatch on the
        // copied original forces regeneration.
        write_jpeg(&img.in_path, 60, 30);
        let thumbs = thumbnails(&img, &specs, out.path()).unwrap();
        assert_eq!((thumbs["tiny"].width, thumbs["tiny"].height), (24, 12));
    }

    #[test]
    fn missing_source_is_an_error() {
        let out = TempDir::new().unwrap();
        let img = synthetic_image("gone.jpg"); // in_path points nowhere real
        let mut specs = BTreeMap::new();
        specs.insert("tiny".to_string(), spec(None, Some(12)));

        assert!(matches!(
            thumbnails(&img, &specs, out.path()),
            Err(ThumbError::Io(_))
        ));
    }
}
