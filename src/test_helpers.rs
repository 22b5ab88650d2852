//! Shared test utilities for the shelf-gal test suite.
//!
//! Provides a fluent [`ShelfBuilder`] for in-memory catalogs plus lookup
//! helpers that panic with a clear message on a miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let catalog = ShelfBuilder::new("root")
//!     .album("root", &[a("travel"), i(1)])
//!     .album("travel", &[])
//!     .image(1, "dawn.jpg", Some("2005-03-15 10:00:00"))
//!     .build();
//!
//! let travel = album_id(&catalog, "travel");
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use crate::catalog::{
    AlbumEntry, AlbumId, AlbumKind, Catalog, CatalogError, ChildRef, ImageEntry, ShelfFile,
};

/// Base directory that relative image locations resolve against.
pub const SHELF_DIR: &str = "/shelf";

// =========================================================================
// Child reference shorthands
// =========================================================================

/// Album child reference.
pub fn a(tag: &str) -> ChildRef {
    ChildRef::Album(tag.to_string())
}

/// Image child reference.
pub fn i(id: u64) -> ChildRef {
    ChildRef::Image(id)
}

// =========================================================================
// Builder
// =========================================================================

/// Builds a [`Catalog`] without touching the filesystem. Image hashes default
/// to `hash-{id}` so nothing is read from disk.
pub struct ShelfBuilder {
    shelf: ShelfFile,
}

impl ShelfBuilder {
    pub fn new(root: &str) -> Self {
        Self {
            shelf: ShelfFile {
                root: root.to_string(),
                albums: Vec::new(),
                images: Vec::new(),
            },
        }
    }

    pub fn album(mut self, tag: &str, children: &[ChildRef]) -> Self {
        self.shelf.albums.push(AlbumEntry {
            tag: tag.to_string(),
            kind: AlbumKind::Plain,
            children: children.to_vec(),
            attributes: BTreeMap::new(),
        });
        self
    }

    pub fn magic(mut self, tag: &str, kind: AlbumKind) -> Self {
        self.shelf.albums.push(AlbumEntry {
            tag: tag.to_string(),
            kind,
            children: Vec::new(),
            attributes: BTreeMap::new(),
        });
        self
    }

    /// Set an attribute on the most recently added album.
    pub fn album_attr(mut self, name: &str, value: &str) -> Self {
        let album = self
            .shelf
            .albums
            .last_mut()
            .expect("album_attr called before any album");
        album.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn image(self, id: u64, location: &str, captured: Option<&str>) -> Self {
        let hash = format!("hash-{id}");
        self.image_hashed(id, location, captured, &hash)
    }

    pub fn image_hashed(
        mut self,
        id: u64,
        location: &str,
        captured: Option<&str>,
        hash: &str,
    ) -> Self {
        let mut attributes = BTreeMap::new();
        if let Some(c) = captured {
            attributes.insert("captured".to_string(), c.to_string());
        }
        self.shelf.images.push(ImageEntry {
            id,
            location: location.into(),
            hash: Some(hash.to_string()),
            attributes,
        });
        self
    }

    /// Set an attribute on an already added image.
    pub fn image_attr(mut self, id: u64, name: &str, value: &str) -> Self {
        let image = self
            .shelf
            .images
            .iter_mut()
            .find(|img| img.id == id)
            .expect("image_attr called before the image was added");
        image.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn try_build(self) -> Result<Catalog, CatalogError> {
        Catalog::from_shelf(self.shelf, Path::new(SHELF_DIR))
    }

    pub fn build(self) -> Catalog {
        self.try_build().unwrap()
    }
}

// =========================================================================
// Lookups: panic with a clear message on miss
// =========================================================================

/// Find an album id by tag. Panics if not found.
pub fn album_id(catalog: &Catalog, tag: &str) -> AlbumId {
    catalog.album_by_tag(tag).unwrap_or_else(|_| {
        let tags: Vec<&str> = catalog.albums().map(|a| a.tag.as_str()).collect();
        panic!("album '{tag}' not found. Available: {tags:?}")
    })
}

/// Tags of the given albums, in order.
pub fn tags_of(catalog: &Catalog, ids: &[AlbumId]) -> Vec<String> {
    ids.iter().map(|id| catalog.album(*id).tag.clone()).collect()
}

// =========================================================================
// Image files with EXIF data
// =========================================================================

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    out.extend(tag.to_le_bytes());
    out.extend(kind.to_le_bytes());
    out.extend(count.to_le_bytes());
    out.extend(value);
}

/// Little-endian TIFF block: IFD0 with `Make` and `Orientation`, and an Exif
/// IFD with `DateTimeOriginal` (`YYYY:MM:DD HH:MM:SS`).
pub fn exif_block(make: &str, orientation: u16, captured: &str) -> Vec<u8> {
    const ASCII: u16 = 2;
    const SHORT: u16 = 3;
    const LONG: u16 = 4;
    let make = format!("{make}\0");
    let captured = format!("{captured}\0");
    assert!(make.len() > 4, "make must not fit inline");

    let exif_ifd: u32 = 8 + 2 + 3 * 12 + 4;
    let make_at = exif_ifd + 2 + 12 + 4;
    let captured_at = make_at + make.len() as u32;
    let [lo, hi] = orientation.to_le_bytes();

    let mut out = Vec::new();
    out.extend(b"II");
    out.extend(42u16.to_le_bytes());
    out.extend(8u32.to_le_bytes());

    out.extend(3u16.to_le_bytes());
    ifd_entry(&mut out, 0x010F, ASCII, make.len() as u32, make_at.to_le_bytes());
    ifd_entry(&mut out, 0x0112, SHORT, 1, [lo, hi, 0, 0]);
    ifd_entry(&mut out, 0x8769, LONG, 1, exif_ifd.to_le_bytes());
    out.extend(0u32.to_le_bytes());

    out.extend(1u16.to_le_bytes());
    ifd_entry(&mut out, 0x9003, ASCII, captured.len() as u32, captured_at.to_le_bytes());
    out.extend(0u32.to_le_bytes());

    out.extend(make.as_bytes());
    out.extend(captured.as_bytes());
    out
}

/// Write a `width`×`height` JPEG carrying an APP1 segment built by
/// [`exif_block`].
pub fn write_exif_jpeg(
    path: &Path,
    width: u32,
    height: u32,
    make: &str,
    orientation: u16,
    captured: &str,
) {
    let mut encoded = std::io::Cursor::new(Vec::new());
    image::RgbImage::new(width, height)
        .write_to(&mut encoded, image::ImageFormat::Jpeg)
        .unwrap();
    let encoded = encoded.into_inner();

    let tiff = exif_block(make, orientation, captured);
    let length = u16::try_from(2 + 6 + tiff.len()).unwrap();
    let mut jpeg = encoded[..2].to_vec();
    jpeg.extend([0xFF, 0xE1]);
    jpeg.extend(length.to_be_bytes());
    jpeg.extend(b"Exif\0\0");
    jpeg.extend(tiff);
    jpeg.extend(&encoded[2..]);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, jpeg).unwrap();
}
