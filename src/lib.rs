//! # shelf-gal
//!
//! A static photo gallery generator for album graphs.
//!
//! Albums live in a shelf file (see [`catalog`]). Unlike a directory tree, the
//! shelf is a graph: an album can sit in several parent albums, and magic
//! albums such as `allalbums` contain every album, themselves included. The
//! generator turns that graph into a browsable static site with one page per
//! album, one page per image in each album, and breadcrumbs for every route
//! from the root.
//!
//! # Pipeline
//!
//! ```text
//! shelf.toml ──→ Catalog ──→ resolve_paths ──→ GenerationPipeline ──→ site/
//!                                                  │
//!                                                  ├─ PageRenderer (HTML)
//!                                                  └─ ImageReferenceCache
//!                                                       ├─ ImageRenderer (resize, cached on disk)
//!                                                       ├─ NameRegistry (unique @images/ names)
//!                                                       └─ OutputWriter (symlink or copy)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`catalog`] | Shelf file format, album/image arena, magic album children |
//! | [`paths`] | Every breadcrumb path to every reachable album, cycle-safe |
//! | [`naming`] | Deterministic asset names and per-run collision handling |
//! | [`imgref`] | Per-run memo: render once, publish once, reuse everywhere |
//! | [`generate`] | Album selection, ordering, and the page emission hooks |
//! | [`html`] | Maud page templates implementing the emission hooks |
//! | [`writer`] | Output tree writes, symlink-or-copy placement |
//! | [`imaging`] | Pure-Rust rendering: orient, resize, JPEG encode |
//! | [`cache`] | Content hashing and the on-disk render cache |
//! | [`config`] | `config.toml` loading, validation, merging, and CSS generation |
//! | [`register`] | Build a shelf file from a directory tree |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Path-local cycle guard
//!
//! Path resolution stops only when an album is already on the *current* path.
//! A global visited set would terminate too, but it would hide every second
//! route to a multi-parent album, and those routes are exactly what the
//! breadcrumbs are for.
//!
//! ## Content-addressed assets
//!
//! Rendered variants are keyed by the original's content hash plus the size
//! limit. Identical files referenced twice in the shelf share one asset, and
//! renders survive renames and moves of the originals.
//!
//! ## Serial naming, parallel rendering
//!
//! Rendering is the only parallel step. Names are claimed one at a time in a
//! fixed order, so two runs over the same shelf always produce the same file
//! names.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod html;
pub mod imaging;
pub mod imgref;
pub mod naming;
pub mod output;
pub mod paths;
pub mod register;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;
