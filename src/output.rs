//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Generate
//!
//! ```text
//! Calculating album paths...
//! Rendered 42 images
//! Creating album family (1 of 3) with 1 child...
//! Creating album root (2 of 3) with 2 children...
//! Creating album travel (3 of 3) with 12 children...
//! Generated 3 albums, 11 image pages, 42 images
//! ```
//!
//! ## Paths
//!
//! ```text
//! summer (2 paths)
//!     root › family › summer
//!     root › travel › summer
//! ```
//!
//! ## Check
//!
//! ```text
//! Shelf OK
//!     5 albums (1 magic)
//!     120 images (3 undated)
//!     4 albums reachable from root
//!     Unreachable: drafts
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::catalog::{AlbumKind, Catalog};
use crate::generate::GenerateEvent;
use crate::paths::{AlbumPath, AlbumPaths};
use crate::register::RegisterSummary;
use std::collections::BTreeMap;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 child`, `2 children`, `0 children`.
fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn path_line(catalog: &Catalog, path: &AlbumPath) -> String {
    path.albums()
        .iter()
        .map(|id| catalog.album(*id).tag.as_str())
        .collect::<Vec<_>>()
        .join(" › ")
}

/// Breadcrumb lines for one album, sorted.
fn sorted_path_lines(catalog: &Catalog, paths: &[AlbumPath]) -> Vec<String> {
    let mut lines: Vec<String> = paths.iter().map(|p| path_line(catalog, p)).collect();
    lines.sort();
    lines
}

// ============================================================================
// Generate
// ============================================================================

pub fn format_generate_event(event: &GenerateEvent) -> Vec<String> {
    match event {
        GenerateEvent::CalculatingPaths => vec!["Calculating album paths...".to_string()],
        GenerateEvent::AssetsWarmed { count } => {
            vec![format!("Rendered {}", plural(*count, "image", "images"))]
        }
        GenerateEvent::AlbumStarted {
            tag,
            position,
            total,
            children,
        } => vec![format!(
            "Creating album {} ({} of {}) with {}...",
            tag,
            position,
            total,
            plural(*children, "child", "children")
        )],
        GenerateEvent::Finished(summary) => vec![format!(
            "Generated {}, {}, {}",
            plural(summary.albums, "album", "albums"),
            plural(summary.image_pages, "image page", "image pages"),
            plural(summary.assets, "image", "images")
        )],
    }
}

/// Render cache line printed after a run.
pub fn format_cache_stats(stats: &CacheStats) -> Vec<String> {
    if stats.total() == 0 {
        return Vec::new();
    }
    vec![format!("Render cache: {}", stats)]
}

pub fn print_generate_event(event: &GenerateEvent) {
    for line in format_generate_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Paths
// ============================================================================

/// Every album reachable from the root with its breadcrumb paths, albums
/// sorted by tag.
pub fn format_paths_output(catalog: &Catalog, paths: &AlbumPaths) -> Vec<String> {
    let mut albums: Vec<_> = paths.iter().collect();
    albums.sort_by(|a, b| catalog.album(*a.0).tag.cmp(&catalog.album(*b.0).tag));

    let mut lines = Vec::new();
    for (id, album_paths) in albums {
        lines.push(format!(
            "{} ({})",
            catalog.album(*id).tag,
            plural(album_paths.len(), "path", "paths")
        ));
        for line in sorted_path_lines(catalog, album_paths) {
            lines.push(format!("{}{}", indent(1), line));
        }
    }
    lines
}

/// JSON form of [`format_paths_output`]: tag → list of tag sequences.
pub fn format_paths_json(catalog: &Catalog, paths: &AlbumPaths) -> serde_json::Value {
    let map: BTreeMap<&str, Vec<Vec<&str>>> = paths
        .iter()
        .map(|(id, album_paths)| {
            let mut routes: Vec<Vec<&str>> = album_paths
                .iter()
                .map(|p| {
                    p.albums()
                        .iter()
                        .map(|a| catalog.album(*a).tag.as_str())
                        .collect()
                })
                .collect();
            routes.sort();
            (catalog.album(*id).tag.as_str(), routes)
        })
        .collect();
    serde_json::json!(map)
}

pub fn print_paths_output(catalog: &Catalog, paths: &AlbumPaths) {
    for line in format_paths_output(catalog, paths) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_output(catalog: &Catalog, paths: &AlbumPaths) -> Vec<String> {
    let magic = catalog
        .albums()
        .filter(|a| a.kind != AlbumKind::Plain)
        .count();
    let undated = catalog
        .images()
        .filter(|i| i.captured().is_none())
        .count();
    let unreachable: Vec<&str> = catalog
        .albums()
        .filter(|a| !paths.contains_key(&a.id))
        .map(|a| a.tag.as_str())
        .collect();

    let mut lines = vec![
        "Shelf OK".to_string(),
        format!(
            "{}{} ({} magic)",
            indent(1),
            plural(catalog.album_count(), "album", "albums"),
            magic
        ),
        format!(
            "{}{} ({} undated)",
            indent(1),
            plural(catalog.image_count(), "image", "images"),
            undated
        ),
        format!(
            "{}{} reachable from {}",
            indent(1),
            plural(paths.len(), "album", "albums"),
            catalog.album(catalog.root()).tag
        ),
    ];
    if !unreachable.is_empty() {
        lines.push(format!("{}Unreachable: {}", indent(1), unreachable.join(", ")));
    }
    lines
}

pub fn print_check_output(catalog: &Catalog, paths: &AlbumPaths) {
    for line in format_check_output(catalog, paths) {
        println!("{}", line);
    }
}

// ============================================================================
// Register and cache maintenance
// ============================================================================

pub fn format_register_output(summary: &RegisterSummary) -> Vec<String> {
    vec![format!(
        "Registered {} and {} in {}",
        plural(summary.albums, "album", "albums"),
        plural(summary.images, "image", "images"),
        summary.shelf.display()
    )]
}

pub fn print_register_output(summary: &RegisterSummary) {
    for line in format_register_output(summary) {
        println!("{}", line);
    }
}

pub fn format_clean_cache_output(removed: usize, kept: usize) -> Vec<String> {
    vec![format!(
        "Removed {} from render cache, {} kept",
        plural(removed, "file", "files"),
        kept
    )]
}

pub fn print_clean_cache_output(removed: usize, kept: usize) {
    for line in format_clean_cache_output(removed, kept) {
        println!("{}", line);
    }
}
