//! Image discovery and metadata reading.
//!
//! Walks an input directory tree, filters to JPEG files, extracts embedded
//! metadata per file, and folds near-identical captures into one
//! representative image. The output of [`find`] is the raw material the
//! assembly engine classifies into albums.
//!
//! ## Discovery rules
//!
//! - Hidden entries (names starting with `.`) are skipped, including whole
//!   hidden subtrees.
//! - Only `.jpg`/`.jpeg` files participate (ASCII case-insensitive).
//! - Entries within a root are visited in lexical order. The dedup fold at
//!   the end does **not** preserve that order — callers must re-sort anything
//!   user-visible.
//!
//! ## Failure model
//!
//! Missing optional metadata never fails discovery; a record simply keeps its
//! zero values. Discovery fails only when something fundamental breaks: the
//! walk itself, a stat, a file that won't yield pixel dimensions, or a
//! capture date too corrupt to parse.
//!
//! ## Deduplication
//!
//! Cameras and phone exports love duplicates: `IMG_001.jpg` next to
//! `IMG_001-edited.jpg`, or the same frame in two input roots. Files sharing
//! the same `(taken, shutter speed, ISO)` exposure key are folded into one,
//! preferring the longer description, then the longer sanitized base name
//! (which keeps `-edited` variants). Known limitation: the key can collide
//! for distinct burst-mode frames shot in the same second with identical
//! exposure, and such frames fold too.

use crate::meta::{self, MetaError, Sidecar};
use crate::sanitize::url_safe_path;
use crate::types::Image;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("metadata: {0}")]
    Meta(#[from] MetaError),
    #[error("unreadable image {path}: {source}")]
    Dimensions {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("no relative path for {0} under its input root")]
    RelPath(PathBuf),
}

/// Search a directory tree for images.
///
/// Returns one [`Image`] per discovered (post-dedup) JPEG. When
/// `process_sidecars` is set, a co-located `<image>.json` sidecar may
/// override the image title.
pub fn find(root: &Path, process_sidecars: bool) -> Result<Vec<Image>, ScanError> {
    info!("finding files in {} ...", root.display());
    let mut found = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() || !is_jpeg(entry.path()) {
            continue;
        }
        found.push(read_image(root, entry.path(), process_sidecars)?);
    }

    Ok(remove_dupes(found))
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

fn read_image(root: &Path, path: &Path, process_sidecars: bool) -> Result<Image, ScanError> {
    debug!("found {}", path.display());

    let stat = std::fs::metadata(path)?;
    let file_meta = meta::read(path)?;
    let (width, height) =
        image::image_dimensions(path).map_err(|source| ScanError::Dimensions {
            path: path.to_path_buf(),
            source,
        })?;

    let rel_path = path
        .strip_prefix(root)
        .map_err(|_| ScanError::RelPath(path.to_path_buf()))?
        .to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/");
    let base_name = url_safe_path(&path.file_name().unwrap_or_default().to_string_lossy());
    let hier = rel_path.split('/').map(String::from).collect();

    let mut image = Image {
        in_path: path.to_path_buf(),
        rel_path,
        base_name,
        hier,
        taken: file_meta.taken,
        make: file_meta.make,
        model: file_meta.model,
        lens_make: file_meta.lens_make,
        lens_model: file_meta.lens_model,
        aperture: file_meta.aperture,
        focal_length: file_meta.focal_length,
        iso: file_meta.iso,
        shutter_speed: file_meta.shutter_speed,
        width,
        height,
        title: file_meta.title,
        description: file_meta.description,
        keywords: file_meta.keywords,
        mod_time: DateTime::<Utc>::from(stat.modified()?),
        ..Image::default()
    };

    if process_sidecars {
        apply_sidecar(&mut image);
    }

    Ok(image)
}

/// Apply a `<image>.json` sidecar if one exists. Only a non-empty sidecar
/// description is used, and it overrides the image *title* — a deliberately
/// partial integration matching what Takeout exports actually carry.
fn apply_sidecar(image: &mut Image) {
    let mut sidecar_path = image.in_path.clone().into_os_string();
    sidecar_path.push(".json");
    let sidecar_path = PathBuf::from(sidecar_path);

    let content = match std::fs::read_to_string(&sidecar_path) {
        Ok(c) => c,
        Err(_) => return, // no sidecar, not an error
    };
    match serde_json::from_str::<Sidecar>(&content) {
        Ok(side) => {
            if !side.description.is_empty() {
                image.title = side.description;
                info!("{}: found sidecar title: {:?}", image.base_name, image.title);
            }
        }
        Err(e) => warn!("sidecar {}: {e}", sidecar_path.display()),
    }
}

/// Fold images sharing the same `(taken, shutter speed, ISO)` exposure key
/// into one representative: longer description wins, then longer base name.
/// Output order is unspecified.
fn remove_dupes(images: Vec<Image>) -> Vec<Image> {
    let mut seen: HashMap<(Option<DateTime<Utc>>, String, Option<u32>), Image> = HashMap::new();

    for image in images {
        let key = (image.taken, image.shutter_speed.clone(), image.iso);
        match seen.get(&key) {
            None => {
                seen.insert(key, image);
            }
            Some(kept) => {
                info!("photo dupe found: {} (choosing best)", image.in_path.display());
                let replace = image.description.len() > kept.description.len()
                    || (image.description.len() == kept.description.len()
                        && image.base_name.len() > kept.base_name.len());
                if replace {
                    debug!("will use {} instead", image.base_name);
                    seen.insert(key, image);
                }
            }
        }
    }

    seen.into_values().collect()
}
