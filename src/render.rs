//! Static HTML output.
//!
//! Mechanical last stage: walk a finished [`Assembly`] and write one page per
//! album view plus the top-level index and the recent stream. It relies on —
//! and only on — the assembly contract: slices are present and pre-sorted,
//! every image carries a resolved output path and thumbnail map.
//!
//! Albums flagged `hidden` by validation are skipped here; the model keeps
//! them so other callers can make a different call.
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): compile-time
//! checked templates, auto-escaped interpolation, nothing to ship beside the
//! binary. The stylesheet is embedded at build time and written to
//! `_/style.css` under the output root.

use crate::config::Config;
use crate::sanitize::url_safe_path;
use crate::types::{Album, Assembly, Image};
use maud::{DOCTYPE, Markup, html};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("album output path {0} is outside the output root")]
    OutsideRoot(PathBuf),
}

const STYLESHEET: &str = include_str!("../static/style.css");

/// Thumbnail preference per page style: first present variant wins, the
/// original is the final fallback.
const ALBUM_VARIANTS: &[&str] = &["album", "tiny"];
const STREAM_VARIANTS: &[&str] = &["recent", "album"];

/// Write the whole site for an assembled collection.
pub fn render(config: &Config, assembly: &Assembly) -> Result<(), RenderError> {
    fs::create_dir_all(&config.out_dir)?;

    let style_dir = config.out_dir.join("_");
    fs::create_dir_all(&style_dir)?;
    fs::write(style_dir.join("style.css"), STYLESHEET)?;

    let views = [
        &assembly.albums,
        &assembly.hier_albums,
        &assembly.favorites,
        &assembly.tag_albums,
    ];
    let mut written = 0;
    for album in views.into_iter().flatten() {
        if album.hidden {
            debug!("skipping hidden album {}", album.title);
            continue;
        }
        write_album(config, album, ALBUM_VARIANTS)?;
        written += 1;
    }

    write_album(config, &assembly.recent, STREAM_VARIANTS)?;

    let index = index_page(config, assembly);
    fs::write(config.out_dir.join("index.html"), index.into_string())?;

    info!("wrote {} album pages to {}", written, config.out_dir.display());
    Ok(())
}

fn write_album(config: &Config, album: &Album, variants: &[&str]) -> Result<(), RenderError> {
    let rel = album
        .out_path
        .strip_prefix(&config.out_dir)
        .map_err(|_| RenderError::OutsideRoot(album.out_path.clone()))?;
    let depth = depth_of(rel);

    debug!(
        "rendering album {} [{}] with {} images",
        album.title,
        album.out_path.display(),
        album.images.len()
    );

    let page = album_page(config, album, depth, variants);
    fs::create_dir_all(&album.out_path)?;
    fs::write(album.out_path.join("index.html"), page.into_string())?;
    Ok(())
}

/// Number of real path components — `.` segments don't add depth.
fn depth_of(rel: &Path) -> usize {
    rel.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

// ============================================================================
// Pages
// ============================================================================

fn base_document(title: &str, depth: usize, content: Markup) -> Markup {
    let root = "../".repeat(depth);
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href=(format!("{root}_/style.css"));
            }
            body {
                (content)
            }
        }
    }
}

fn album_page(config: &Config, album: &Album, depth: usize, variants: &[&str]) -> Markup {
    let root = "../".repeat(depth);
    let content = html! {
        header.site-header {
            nav.breadcrumb {
                a href=(format!("{root}index.html")) { (config.site.collection) }
                " / "
                (album.title)
            }
            h1 { (album.title) }
        }
        main.photo-grid {
            @for image in &album.images {
                (photo_cell(image, &root, variants))
            }
        }
    };
    base_document(&album.title, depth, content)
}

fn photo_cell(image: &Image, root: &str, variants: &[&str]) -> Markup {
    let original = format!("{root}{}", url_safe_path(&image.rel_path));
    let thumb = variants.iter().find_map(|v| image.thumbs.get(*v));
    html! {
        figure.photo {
            a href=(original) {
                @match thumb {
                    Some(t) => {
                        img src=(format!("{root}{}", t.rel_path))
                            width=(t.width) height=(t.height)
                            loading="lazy" alt=(display_title(image));
                    }
                    None => {
                        img src=(original) loading="lazy" alt=(display_title(image));
                    }
                }
            }
            @if !image.title.is_empty() {
                figcaption { (image.title) }
            }
        }
    }
}

fn display_title(image: &Image) -> &str {
    if image.title.is_empty() {
        &image.base_name
    } else {
        &image.title
    }
}

fn index_page(config: &Config, assembly: &Assembly) -> Markup {
    let content = html! {
        header.site-header {
            h1 { (config.site.collection) }
            @if !config.site.description.is_empty() {
                p.description { (config.site.description) }
            }
            nav.breadcrumb {
                a href="recent/all/index.html" { "Recent" }
            }
        }
        main {
            (album_section("Albums", &assembly.albums, |a| a.rel_path.clone()))
            (album_section("Collections", &assembly.hier_albums, |a| a.rel_path.clone()))
            (album_section("Favorites", &assembly.favorites, |a| a.title.clone()))
            (album_section("Tags", &assembly.tag_albums, |a| a.title.clone()))
        }
    };
    base_document(&config.site.collection, 0, content)
}

fn album_section(heading: &str, albums: &[Album], label: impl Fn(&Album) -> String) -> Markup {
    let visible: Vec<&Album> = albums.iter().filter(|a| !a.hidden).collect();
    html! {
        @if !visible.is_empty() {
            section {
                h2 { (heading) }
                ul.album-list {
                    @for album in visible {
                        li {
                            a href=(format!("{}/index.html", album_href(album))) {
                                (label(album))
                            }
                            span.count { (album.images.len()) }
                        }
                    }
                }
            }
        }
    }
}

/// Index-relative href of an album page directory.
fn album_href(album: &Album) -> String {
    match album.kind {
        crate::types::AlbumKind::Directory | crate::types::AlbumKind::Hierarchy { .. } => {
            url_safe_path(&album.rel_path)
        }
        _ => album.rel_path.clone(),
    }
}
