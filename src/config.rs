//! Collection configuration.
//!
//! Every tunable the assembly engine consults lives on an explicit value
//! passed into [`collect`](crate::assemble::collect) — there is no
//! process-wide mutable state. Defaults come from constructors; a
//! `config.toml` may override the site-level tunables:
//!
//! ```toml
//! # All options are optional — defaults shown below
//! collection = "Photos"
//! description = ""
//! favorite_keyword = "fav"
//! min_album_size = 4
//! max_recent = 24
//!
//! [limits]
//! max_album = 24          # leaf/directory albums
//! max_hier_album = 48     # hierarchy albums below the top level
//! max_top_hier_album = 365 # top hierarchy ancestors, e.g. "by year"
//!
//! [thumbnails.tiny]
//! height = 120
//! quality = 70
//! ```
//!
//! Unknown keys are rejected to catch typos early. Input and output
//! directories come from the command line, not the file.

use crate::thumbs::ThumbSpec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Per-hierarchy-level album population caps, enforced by
/// [`validate`](crate::assemble::validate).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Limits {
    /// Cap for leaf/directory albums (level 0).
    pub max_album: usize,
    /// Cap for hierarchy albums deeper than the top level (level > 1).
    pub max_hier_album: usize,
    /// Cap for top hierarchy ancestors (level 1), which legitimately
    /// aggregate a whole year of photos.
    pub max_top_hier_album: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_album: 24,
            max_hier_album: 48,
            max_top_hier_album: 365,
        }
    }
}

/// Site-level tunables, loadable from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Collection title shown on the index page.
    pub collection: String,
    /// Collection description shown on the index page.
    pub description: String,
    /// Keyword marking an image as a favorite.
    pub favorite_keyword: String,
    /// Directory/favorite/tag albums below this population are dropped.
    pub min_album_size: usize,
    /// Upper bound on the recent stream.
    pub max_recent: usize,
    pub limits: Limits,
    /// Named thumbnail variants. An empty map disables thumbnail generation
    /// entirely.
    pub thumbnails: BTreeMap<String, ThumbSpec>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            collection: "Photos".to_string(),
            description: String::new(),
            favorite_keyword: "fav".to_string(),
            min_album_size: 4,
            max_recent: 24,
            limits: Limits::default(),
            thumbnails: default_thumbnails(),
        }
    }
}

fn default_thumbnails() -> BTreeMap<String, ThumbSpec> {
    let spec = |width, height, quality| ThumbSpec {
        width,
        height,
        quality,
    };
    BTreeMap::from([
        ("tiny".to_string(), spec(None, Some(120), 70)),
        ("album".to_string(), spec(None, Some(350), 80)),
        ("recent".to_string(), spec(Some(512), None, 85)),
        ("recent_2x".to_string(), spec(Some(1024), None, 85)),
        ("view".to_string(), spec(Some(1920), None, 85)),
    ])
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.favorite_keyword.is_empty() {
            return Err(ConfigError::Validation(
                "favorite_keyword must not be empty".into(),
            ));
        }
        if self.min_album_size == 0 {
            return Err(ConfigError::Validation(
                "min_album_size must be at least 1".into(),
            ));
        }
        if self.max_recent == 0 {
            return Err(ConfigError::Validation("max_recent must be at least 1".into()));
        }
        for (name, spec) in &self.thumbnails {
            if spec.width.is_none() && spec.height.is_none() {
                return Err(ConfigError::Validation(format!(
                    "thumbnail '{name}' must set width or height"
                )));
            }
            if spec.quality == 0 || spec.quality > 100 {
                return Err(ConfigError::Validation(format!(
                    "thumbnail '{name}' quality must be 1-100"
                )));
            }
        }
        Ok(())
    }
}

/// Load site config from a `config.toml`, or defaults when the file does not
/// exist. Unknown keys are rejected; values are validated.
pub fn load_site_config(path: Option<&Path>) -> Result<SiteConfig, ConfigError> {
    let config = match path {
        Some(p) => {
            let content = fs::read_to_string(p)?;
            toml::from_str(&content)?
        }
        None => SiteConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

/// Everything one collection run needs: where to read, where to write, and
/// the site tunables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input roots, scanned in order.
    pub in_dirs: Vec<PathBuf>,
    /// Output root for generated files.
    pub out_dir: PathBuf,
    /// Whether `<image>.json` sidecars may override image metadata.
    pub process_sidecars: bool,
    pub site: SiteConfig,
}

impl Config {
    pub fn new(in_dirs: Vec<PathBuf>, out_dir: PathBuf) -> Self {
        Self {
            in_dirs,
            out_dir,
            process_sidecars: false,
            site: SiteConfig::default(),
        }
    }
}

/// Returns a fully-commented stock `config.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r#"# Albumist Configuration
# ======================
# All settings are optional. Values shown are the defaults.
# Unknown keys will cause an error.

# Collection title and description, shown on the index page.
collection = "Photos"
description = ""

# Keyword that marks an image as a favorite. Favorites get their own
# pseudo-albums: one per co-occurring keyword, plus an "all" bucket.
favorite_keyword = "fav"

# Directory, favorite, and tag albums with fewer images than this are
# dropped from the generated site.
min_album_size = 4

# Upper bound on the "recent" stream.
max_recent = 24

# ---------------------------------------------------------------------------
# Album population caps. Albums over their cap are flagged hidden and
# reported as warnings — never deleted.
# ---------------------------------------------------------------------------
[limits]
max_album = 24           # leaf/directory albums
max_hier_album = 48      # hierarchy albums below the top level
max_top_hier_album = 365 # top hierarchy ancestors, e.g. "by year"

# ---------------------------------------------------------------------------
# Thumbnail variants. Set width OR height; the free axis preserves aspect.
# Removing every [thumbnails.*] table disables thumbnail generation.
# ---------------------------------------------------------------------------
[thumbnails.tiny]
height = 120
quality = 70

[thumbnails.album]
height = 350
quality = 80

[thumbnails.recent]
width = 512
quality = 85

[thumbnails.recent_2x]
width = 1024
quality = 85

[thumbnails.view]
width = 1920
quality = 85
"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_valid() {
        let config = SiteConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.favorite_keyword, "fav");
        assert_eq!(config.min_album_size, 4);
        assert_eq!(config.max_recent, 24);
        assert_eq!(config.limits.max_album, 24);
        assert_eq!(config.limits.max_hier_album, 48);
        assert_eq!(config.limits.max_top_hier_album, 365);
        assert_eq!(config.thumbnails.len(), 5);
    }

    #[test]
    fn partial_config_preserves_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
collection = "Holidays"

[limits]
max_album = 30
"#,
        )
        .unwrap();
        assert_eq!(config.collection, "Holidays");
        assert_eq!(config.limits.max_album, 30);
        // untouched defaults
        assert_eq!(config.limits.max_top_hier_album, 365);
        assert_eq!(config.favorite_keyword, "fav");
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("favourite_keyword = \"fav\"");
        assert!(result.is_err());
    }

    #[test]
    fn thumbnail_without_axis_rejected() {
        let mut config = SiteConfig::default();
        config
            .thumbnails
            .insert("broken".to_string(), ThumbSpec::default());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn zero_quality_rejected() {
        let mut config = SiteConfig::default();
        config.thumbnails.insert(
            "bad".to_string(),
            ThumbSpec {
                width: Some(100),
                height: None,
                quality: 0,
            },
        );
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_favorite_keyword_rejected() {
        let mut config = SiteConfig::default();
        config.favorite_keyword.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_site_config_defaults_without_file() {
        let config = load_site_config(None).unwrap();
        assert_eq!(config.collection, "Photos");
    }

    #[test]
    fn load_site_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "collection = \"Family\"\n").unwrap();

        let config = load_site_config(Some(&path)).unwrap();
        assert_eq!(config.collection, "Family");
    }

    #[test]
    fn load_site_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "not valid [[[").unwrap();

        assert!(matches!(
            load_site_config(Some(&path)),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.collection, "Photos");
        assert_eq!(config.max_recent, 24);
        assert_eq!(config.thumbnails["tiny"].height, Some(120));
        assert_eq!(config.thumbnails["view"].width, Some(1920));
    }
}
