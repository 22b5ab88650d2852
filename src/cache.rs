//! On-disk render cache shared across generation runs.
//!
//! Decoding and resampling a full-size original is by far the slowest part of
//! a run. The [`RustRenderer`](crate::imaging::RustRenderer) therefore keeps
//! every rendered variant in a cache directory and reuses it on later runs.
//!
//! # Cache keys
//!
//! The cache is **content-addressed**. A variant's file name is built from
//!
//! - the image's content hash (SHA-256 of the original file, stored in the
//!   shelf or computed on load), so moving or renaming originals does not
//!   invalidate anything;
//! - the width and height limits it was rendered for;
//! - the orientation it was rotated to, so fixing a wrong `orientation`
//!   attribute produces a fresh render.
//!
//! ```text
//! .shelf-gal-cache/
//! ├── 9f86d0…-128x128-up.jpg
//! ├── 9f86d0…-640x640-up.jpg
//! └── 2c26b4…-640x640-left.jpg
//! ```
//!
//! This is independent of the per-run
//! [`ImageReferenceCache`](crate::imgref::ImageReferenceCache), which maps the
//! same key to a published file under `@images/` and is discarded after the run.
//!
//! # Pruning
//!
//! Nothing is ever evicted automatically. `shelf-gal clean-cache` computes the
//! names every catalog image would use at every configured size and deletes
//! the rest.

use crate::catalog::Catalog;
use crate::imaging::Orientation;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// File name of a cached variant.
pub fn cache_file_name(
    hash: &str,
    width_limit: u32,
    height_limit: u32,
    orientation: Orientation,
) -> String {
    format!("{hash}-{width_limit}x{height_limit}-{orientation}.jpg")
}

/// Names of every variant worth keeping: each catalog image at each limit.
pub fn expected_cache_names(catalog: &Catalog, limits: &[(u32, u32)]) -> HashSet<String> {
    catalog
        .images()
        .flat_map(|image| {
            let orientation = Orientation::from_attribute(image.attribute("orientation"));
            limits
                .iter()
                .map(move |(w, h)| cache_file_name(&image.hash, *w, *h, orientation))
        })
        .collect()
}

/// Delete cached files whose names are not in `keep`. Subdirectories are
/// left alone. Returns the number of files removed.
pub fn prune(cache_dir: &Path, keep: &HashSet<String>) -> io::Result<usize> {
    if !cache_dir.is_dir() {
        return Ok(0);
    }
    let mut removed = 0;
    for entry in fs::read_dir(cache_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !keep.contains(&name) {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Summary of render cache performance for a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} rendered ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} rendered", self.misses)
        }
    }
}
