//! # Albumist
//!
//! A static site generator for hierarchical photo albums. Point it at one or
//! more directories of JPEGs and it produces a browsable website: an album per
//! directory, virtual albums for every ancestor directory ("by year" style
//! nesting), favorites and tag pseudo-albums driven by embedded keywords, and
//! a bounded "recent" stream — all with pre-generated thumbnail variants.
//!
//! # Architecture: Collect, Validate, Render
//!
//! The pipeline is three calls:
//!
//! ```text
//! 1. Collect    input dirs  →  Assembly     (scan + thumbnails + classification)
//! 2. Validate   assembly    →  warnings     (population caps, hidden flags)
//! 3. Render     assembly    →  output dir   (static HTML + stylesheet)
//! ```
//!
//! [`assemble::collect`] is the heart of the crate: it turns a flat list of
//! discovered images into one consistent, deduplicated collection model. Every
//! view (directory albums, hierarchy albums, favorites, tags, recent) holds
//! shared references into the same canonical image list, so a photo's metadata
//! is identical no matter which page it appears on.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Walks input directories, extracts per-file metadata, folds near-identical captures |
//! | [`meta`] | Per-file metadata: EXIF fields, IPTC title/caption/keywords, sidecar overrides |
//! | [`sanitize`] | URL-safe lowercase path derivation for all generated output paths |
//! | [`thumbs`] | Named resized thumbnail variants, reusing fresh output across builds |
//! | [`assemble`] | The assembly engine — classification, ordering, size-limit validation |
//! | [`types`] | Shared data model: `Image`, `Album`, `Assembly` |
//! | [`config`] | Explicit configuration value with constructor defaults and TOML overrides |
//! | [`render`] | Static HTML output via Maud |
//!
//! # Design Decisions
//!
//! ## One Sequential Pass
//!
//! Collection is a single synchronous walk followed by a single classification
//! loop. Album membership and sort order are trivially deterministic without
//! interleaving, and the workload (thousands of photos, not millions) does not
//! need parallel throughput. Concurrency, if any, belongs to the caller — e.g.
//! re-running the whole pipeline on a filesystem event — never inside a
//! collection pass.
//!
//! ## Filesystem Is the Source of Truth
//!
//! There is no database and no index that outlives a run. Directory structure
//! becomes album structure; EXIF/IPTC metadata becomes titles, captions, and
//! tags. The only state kept between builds is the thumbnail output itself,
//! reused when the source file's size and modification time still match.
//!
//! ## Maud Over Template Engines
//!
//! HTML is generated with [Maud](https://maud.lambda.xyz/): compile-time
//! checked, type-safe, XSS-escaped by default, and no template directory to
//! ship or get out of sync.
//!
//! ## Explicit Ordering Everywhere
//!
//! Albums accumulate in hash maps during classification, but nothing
//! user-visible is ever emitted in map order: every album list and every image
//! list gets an explicit, documented sort before the assembly is returned.

pub mod assemble;
pub mod config;
pub mod meta;
pub mod render;
pub mod sanitize;
pub mod scan;
pub mod thumbs;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
