//! The assembly engine.
//!
//! [`collect`] turns input directories into an [`Assembly`]: one canonical
//! image list plus every album view derived from it. The derivations are
//! orthogonal — a single photo appears in exactly one directory album, in a
//! hierarchy album per ancestor directory, in favorite buckets when tagged
//! with the favorite keyword, and in one tag album per keyword. All views
//! share the same `Arc`'d image records.
//!
//! The engine is a single sequential pass: discover, then one loop that
//! attaches thumbnails and classifies, then a finalize step that filters,
//! sorts, and freezes. Each image record is mutated exactly once (thumbnails
//! and output path) before the first album reference to it is taken; from
//! then on it is read-only.
//!
//! Albums accumulate in hash maps keyed by sanitized identity, but map order
//! never leaks: every finalize step applies an explicit sort — images oldest
//! first (newest first for the recent stream; unknown capture times sort as
//! earliest), directory albums by relative path descending, hierarchy albums
//! by label ascending, keyword albums by title ascending.
//!
//! Failure is all-or-nothing: a discovery or thumbnail error aborts the whole
//! collection and no partial assembly is returned. Classification itself
//! cannot fail.

use crate::config::{Config, Limits};
use crate::sanitize::url_safe_path;
use crate::scan::{self, ScanError};
use crate::thumbs::{self, ThumbError};
use crate::types::{Album, AlbumKind, Assembly, Image};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Reserved directory base name whose images are excluded from every album
/// view. An exclusion hook for a known malformed-directory case in Takeout
/// exports; kept verbatim, not a general filter.
const EMPTY_NAME_DIR: &str = "EmptyName";

#[derive(Error, Debug)]
pub enum CollectError {
    #[error("find: {0}")]
    Discovery(#[from] ScanError),
    #[error("thumbnails: {0}")]
    Thumbnails(#[from] ThumbError),
}

/// Collect an assembly of photos from the configured input directories.
pub fn collect(config: &Config) -> Result<Assembly, CollectError> {
    let mut images = Vec::new();
    for dir in &config.in_dirs {
        images.extend(scan::find(dir, config.process_sidecars)?);
    }
    assemble(images, config)
}

/// Classify discovered images into every album view.
///
/// Split out from [`collect`] so the classification logic is exercisable on
/// synthetic image records without touching the filesystem (thumbnail
/// generation only runs when the spec map is non-empty).
pub fn assemble(images: Vec<Image>, config: &Config) -> Result<Assembly, CollectError> {
    let mut canonical: Vec<Arc<Image>> = Vec::with_capacity(images.len());
    let mut dir_albums: HashMap<String, Album> = HashMap::new();
    let mut hier_albums: HashMap<String, Album> = HashMap::new();
    let mut fav_albums: HashMap<String, Album> = HashMap::new();
    let mut tag_albums: HashMap<String, Album> = HashMap::new();

    for mut image in images {
        debug!("building image: {}", image.rel_path);

        if !config.site.thumbnails.is_empty() {
            image.thumbs = thumbs::thumbnails(&image, &config.site.thumbnails, &config.out_dir)?;
        }
        image.out_path = config.out_dir.join(url_safe_path(&image.rel_path));

        // Last mutation done — freeze and share.
        let image = Arc::new(image);
        canonical.push(image.clone());

        let rel_dir = parent_rel_dir(&image.rel_path);
        if base_component(&rel_dir) == EMPTY_NAME_DIR {
            info!("skipping {} ...", image.rel_path);
            continue;
        }

        classify_directory(&image, &rel_dir, &mut dir_albums, config);
        classify_hierarchy(&image, &rel_dir, &mut hier_albums, config);
        classify_keywords(&image, &rel_dir, &mut fav_albums, &mut tag_albums, config);
    }

    let min_size = config.site.min_album_size;
    Ok(Assembly {
        recent: recent_album(&canonical, config),
        images: canonical,
        albums: finalize_directory_albums(dir_albums, min_size),
        hier_albums: finalize_hierarchy_albums(hier_albums),
        favorites: finalize_keyword_albums(fav_albums, min_size),
        tag_albums: finalize_keyword_albums(tag_albums, min_size),
    })
}

/// Directory part of a `/`-separated relative path; `"."` for a root-level
/// file.
fn parent_rel_dir(rel_path: &str) -> String {
    match rel_path.rsplit_once('/') {
        Some((dir, _)) => dir.to_string(),
        None => ".".to_string(),
    }
}

fn base_component(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn classify_directory(
    image: &Arc<Image>,
    rel_dir: &str,
    albums: &mut HashMap<String, Album>,
    config: &Config,
) {
    let key = url_safe_path(rel_dir);
    let album = albums.entry(key.clone()).or_insert_with(|| Album {
        kind: AlbumKind::Directory,
        in_path: image
            .in_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
        rel_path: rel_dir.to_string(),
        out_path: config.out_dir.join(&key),
        title: base_component(rel_dir).to_string(),
        hier: rel_dir.split('/').map(String::from).collect(),
        images: vec![],
        hidden: false,
    });
    album.images.push(image.clone());
}

/// Add the image to one hierarchy album per strict ancestor prefix of its
/// parent directory. The parent directory itself is never a hierarchy album —
/// that view is the directory album's.
fn classify_hierarchy(
    image: &Arc<Image>,
    rel_dir: &str,
    albums: &mut HashMap<String, Album>,
    config: &Config,
) {
    let components: Vec<&str> = rel_dir.split('/').collect();
    for level in 1..components.len() {
        let label = components[..level].join("/");
        let key = url_safe_path(&label);
        let album = albums.entry(key.clone()).or_insert_with(|| Album {
            kind: AlbumKind::Hierarchy { level },
            in_path: PathBuf::from(&label),
            rel_path: label.clone(),
            out_path: config.out_dir.join(&key),
            title: label.clone(),
            hier: components[..level].iter().map(|s| s.to_string()).collect(),
            images: vec![],
            hidden: false,
        });
        album.images.push(image.clone());
    }
}

fn classify_keywords(
    image: &Arc<Image>,
    rel_dir: &str,
    fav_albums: &mut HashMap<String, Album>,
    tag_albums: &mut HashMap<String, Album>,
    config: &Config,
) {
    let fav = &config.site.favorite_keyword;

    if image.keywords.iter().any(|k| k == fav) {
        for keyword in &image.keywords {
            let bucket = if keyword == fav { "all" } else { keyword.as_str() };
            add_keyword_album(
                image,
                rel_dir,
                fav_albums,
                AlbumKind::Favorite,
                "favorites",
                bucket,
                config,
            );
        }
    }

    for keyword in &image.keywords {
        add_keyword_album(
            image,
            rel_dir,
            tag_albums,
            AlbumKind::Tag,
            "tags",
            keyword,
            config,
        );
    }
}

fn add_keyword_album(
    image: &Arc<Image>,
    rel_dir: &str,
    albums: &mut HashMap<String, Album>,
    kind: AlbumKind,
    group: &str,
    bucket: &str,
    config: &Config,
) {
    let album = albums.entry(bucket.to_string()).or_insert_with(|| {
        debug!("{group} album {bucket:?}: {}", image.base_name);
        let safe = url_safe_path(bucket);
        Album {
            kind,
            in_path: PathBuf::from(rel_dir),
            rel_path: format!("{group}/{safe}"),
            out_path: config.out_dir.join(group).join(&safe),
            title: bucket.to_string(),
            hier: vec![group.to_string(), bucket.to_string()],
            images: vec![],
            hidden: false,
        }
    });
    album.images.push(image.clone());
}

/// Oldest first; unknown capture times sort as earliest. Stable, so equal
/// timestamps keep insertion order.
fn sort_oldest_first(images: &mut [Arc<Image>]) {
    images.sort_by_key(|i| i.taken);
}

fn finalize_directory_albums(albums: HashMap<String, Album>, min_size: usize) -> Vec<Album> {
    let mut out: Vec<Album> = albums
        .into_values()
        .filter(|a| a.images.len() >= min_size)
        .collect();
    for album in &mut out {
        sort_oldest_first(&mut album.images);
    }
    // Deterministic index-display order, not chronological.
    out.sort_by(|a, b| b.rel_path.cmp(&a.rel_path));
    out
}

fn finalize_hierarchy_albums(albums: HashMap<String, Album>) -> Vec<Album> {
    let mut out: Vec<Album> = albums.into_values().collect();
    for album in &mut out {
        sort_oldest_first(&mut album.images);
    }
    out.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
    out
}

fn finalize_keyword_albums(albums: HashMap<String, Album>, min_size: usize) -> Vec<Album> {
    let mut out: Vec<Album> = albums
        .into_values()
        .filter(|a| a.images.len() >= min_size)
        .collect();
    for album in &mut out {
        sort_oldest_first(&mut album.images);
    }
    out.sort_by(|a, b| a.title.cmp(&b.title));
    out
}

/// The bounded newest-first stream over the full image list (including any
/// images the exclusion sentinel kept out of the other views).
fn recent_album(images: &[Arc<Image>], config: &Config) -> Album {
    let mut recent = images.to_vec();
    recent.sort_by(|a, b| b.taken.cmp(&a.taken));
    recent.truncate(config.site.max_recent);

    Album {
        kind: AlbumKind::Recent,
        in_path: PathBuf::new(),
        rel_path: "recent/all".to_string(),
        out_path: config.out_dir.join("recent").join("all"),
        title: "Recent".to_string(),
        hier: vec!["recent".to_string(), "all".to_string()],
        images: recent,
        hidden: false,
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A population-cap violation. Reported, never enforced by deletion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("album '{title}' contains {count} images, which exceeds the {limit} image limit at hierarchy level {level}")]
pub struct ValidationError {
    pub title: String,
    pub count: usize,
    pub limit: usize,
    pub level: usize,
}

/// Check directory and hierarchy albums against their per-level population
/// caps. Over-cap albums are flagged `hidden` and reported; their image lists
/// are left untouched. The caller decides whether the result is fatal.
pub fn validate(assembly: &mut Assembly, limits: &Limits) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let checked = assembly
        .albums
        .iter_mut()
        .chain(assembly.hier_albums.iter_mut());
    for album in checked {
        let level = album.level();
        debug!("{} has {} photos [level={level}]", album.title, album.images.len());

        let limit = match level {
            0 => limits.max_album,
            1 => limits.max_top_hier_album,
            _ => limits.max_hier_album,
        };

        if album.images.len() > limit {
            album.hidden = true;
            errors.push(ValidationError {
                title: album.title.clone(),
                count: album.images.len(),
                limit,
                level,
            });
        }
    }

    errors
}
