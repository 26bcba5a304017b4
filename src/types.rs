//! Shared data model for the collection pipeline.
//!
//! An [`Image`] is created once by the scanner, mutated exactly once by the
//! assembly engine (thumbnails and output path attached), and then frozen
//! behind an `Arc`. Every album view holds clones of those `Arc`s — shared,
//! read-only references into one canonical list — so all views reflect
//! identical underlying image data, never copies that could drift.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// A named resized variant of an image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThumbMeta {
    /// Pixel width of the generated file.
    pub width: u32,
    /// Pixel height of the generated file.
    pub height: u32,
    /// Path relative to the output root (URL-safe).
    pub rel_path: String,
    /// Absolute path of the generated file.
    pub path: PathBuf,
}

/// One physical photo and everything we know about it.
#[derive(Debug, Clone, Default)]
pub struct Image {
    /// Absolute path of the source file.
    pub in_path: PathBuf,
    /// Path relative to its input root, `/`-separated. Never empty for a
    /// discovered image.
    pub rel_path: String,
    /// Sanitized base file name, used as the dedup tie-breaker.
    pub base_name: String,
    /// Components of `rel_path`, including the file name.
    pub hier: Vec<String>,

    /// Capture timestamp. `None` means the file carried no usable
    /// `DateTimeOriginal` — such images sort as "never taken".
    pub taken: Option<DateTime<Utc>>,
    pub make: String,
    pub model: String,
    pub lens_make: String,
    pub lens_model: String,
    pub aperture: Option<f64>,
    pub focal_length: String,
    pub iso: Option<u32>,
    pub shutter_speed: String,
    /// Pixel dimensions of the source file. Positive whenever the file
    /// decoded.
    pub width: u32,
    pub height: u32,

    pub title: String,
    pub description: String,
    /// Keyword tags in source order. Duplicates possible.
    pub keywords: Vec<String>,

    /// Source modification time, consulted for thumbnail staleness.
    pub mod_time: DateTime<Utc>,

    /// Resolved path under the output root. Set once by the assembly engine.
    pub out_path: PathBuf,
    /// Thumbnail variant name → descriptor. Set once by the assembly engine.
    pub thumbs: BTreeMap<String, ThumbMeta>,
}

/// How an album was populated.
///
/// All kinds share one shape ([`Album`]); the kind records which
/// classification pass created it and, for hierarchy albums, the prefix depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlbumKind {
    /// One per distinct parent directory of images.
    Directory,
    /// One per ancestor path prefix, aggregating all descendant images.
    /// `level` is the number of components in the prefix (1 = top ancestor).
    Hierarchy { level: usize },
    /// One per favorite-keyword value, plus the synthetic `all` bucket.
    Favorite,
    /// One per keyword value.
    Tag,
    /// The single newest-first stream.
    Recent,
}

/// A named, ordered group of image references representing one logical view.
#[derive(Debug, Clone)]
pub struct Album {
    pub kind: AlbumKind,
    /// Real input directory for directory albums; a synthetic label path for
    /// virtual albums.
    pub in_path: PathBuf,
    /// Relative input path (directory albums) or hierarchy label (virtual
    /// albums). Drives the deterministic album ordering.
    pub rel_path: String,
    /// Resolved directory under the output root.
    pub out_path: PathBuf,
    pub title: String,
    /// Hierarchy components of this album.
    pub hier: Vec<String>,
    pub images: Vec<Arc<Image>>,
    /// Set by validation when the album exceeds its population cap. The album
    /// stays in the model; rendering decides whether to skip it.
    pub hidden: bool,
}

impl Album {
    /// Hierarchy level: 0 for every non-hierarchy kind.
    pub fn level(&self) -> usize {
        match self.kind {
            AlbumKind::Hierarchy { level } => level,
            _ => 0,
        }
    }
}

/// The assembled collection: one instance per run, produced by
/// [`collect`](crate::assemble::collect), validated once, then handed to
/// rendering. All slices are present (possibly empty) and pre-sorted; nothing
/// is mutated after validation except album `hidden` flags set during it.
#[derive(Debug)]
pub struct Assembly {
    /// The canonical image list. Every album references into this.
    pub images: Vec<Arc<Image>>,
    /// Directory albums, sorted descending by relative input path.
    pub albums: Vec<Album>,
    /// Hierarchy albums, sorted ascending by label.
    pub hier_albums: Vec<Album>,
    /// Favorite albums, sorted ascending by title.
    pub favorites: Vec<Album>,
    /// Tag albums, sorted ascending by title.
    pub tag_albums: Vec<Album>,
    /// The bounded newest-first stream.
    pub recent: Album,
}
