//! Breadcrumb path resolution over the album graph.
//!
//! An album can be reached from the root through several parents, so it has
//! one [`AlbumPath`] per distinct route. The graph may contain cycles; the
//! traversal stops descending whenever the next album already appears on the
//! current path. The guard is path-local, not global: the same album can show
//! up in any number of unrelated paths, but never twice in one.
//!
//! ```text
//! root ─┬─ family ─┬─ summer
//!       │          └─ all ──→ (every album, including root and all)
//!       └─ travel ─── summer
//!
//! summer: [root, family, summer], [root, travel, summer], [root, family, all, summer], ...
//! ```

use crate::catalog::{AlbumId, Catalog};
use std::collections::BTreeMap;

/// One route from the root to an album, root first, target last.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AlbumPath(Vec<AlbumId>);

impl AlbumPath {
    pub fn albums(&self) -> &[AlbumId] {
        &self.0
    }

    /// The album this path leads to.
    pub fn target(&self) -> AlbumId {
        // Paths are built by pushing the target, so they are never empty.
        self.0[self.0.len() - 1]
    }

    /// Albums above the target, root first.
    pub fn ancestors(&self) -> &[AlbumId] {
        &self.0[..self.0.len() - 1]
    }

    pub fn contains(&self, album: AlbumId) -> bool {
        self.0.contains(&album)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Every album reachable from a root, with all of its breadcrumb paths.
pub type AlbumPaths = BTreeMap<AlbumId, Vec<AlbumPath>>;

/// Traverse all albums reachable from `root` and collect the distinct paths
/// leading to each. Images are leaves and never appear as keys.
pub fn resolve_paths(catalog: &Catalog, root: AlbumId) -> AlbumPaths {
    let mut paths = AlbumPaths::new();
    let mut current = Vec::new();
    visit(catalog, root, &mut current, &mut paths);
    paths
}

fn visit(catalog: &Catalog, album: AlbumId, current: &mut Vec<AlbumId>, paths: &mut AlbumPaths) {
    if current.contains(&album) {
        return;
    }
    current.push(album);
    paths
        .entry(album)
        .or_default()
        .push(AlbumPath(current.clone()));
    for child in catalog.album_children(album) {
        visit(catalog, child, current, paths);
    }
    current.pop();
}
