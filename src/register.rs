//! Build a shelf file from a directory of photos.
//!
//! Every directory becomes a plain album and every supported image file an
//! image entry. The top directory is the root album; nested directories are
//! tagged by their path below it, joined with `-`:
//!
//! ```text
//! photos/                  → root      children: ["travel", 1]
//! ├── cover.jpg            → image 1
//! └── travel/              → travel    children: ["travel-japan", 3]
//!     ├── japan/           → travel-japan
//!     │   └── tokyo.png    → image 2
//!     └── kyoto.jpg        → image 3
//! ```
//!
//! Entries are visited in file-name order so ids are stable across runs on
//! the same tree. Hidden files and directories are skipped. Each image is
//! hashed and its pixel dimensions recorded as `width`/`height` attributes.
//! EXIF data adds `captured`, `orientation` and the camera attributes (see
//! [`read_exif_attributes`]). Files that fail to decode are still
//! registered, without the attributes that could not be read.

use crate::cache::hash_file;
use crate::catalog::{
    AlbumEntry, AlbumKind, CatalogError, ChildRef, ImageEntry, ShelfFile, verify_album_tag,
};
use crate::imaging::read_exif_attributes;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum RegisterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Failed to serialize shelf: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("{0} is not a directory")]
    NotADirectory(PathBuf),
}

/// Supported image file extensions (lowercase).
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSummary {
    pub albums: usize,
    pub images: usize,
    pub shelf: PathBuf,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Album tag for a directory `relative` to the scanned root. Whitespace
/// becomes `_`; purely numeric tags get an `album-` prefix.
fn directory_tag(relative: &Path) -> String {
    let tag = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().replace(char::is_whitespace, "_"))
        .collect::<Vec<_>>()
        .join("-");
    if verify_album_tag(&tag).is_ok() {
        tag
    } else {
        format!("album-{tag}")
    }
}

/// Make `tag` unique among `taken` by appending `-2`, `-3`, …
fn unique_tag(tag: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(tag.clone()) {
        return tag;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{tag}-{n}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Location as stored in the shelf: relative to `base` when below it.
fn shelf_location(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Scan `dir` into a [`ShelfFile`] whose locations are relative to
/// `shelf_dir` where possible.
pub fn scan_directory(
    dir: &Path,
    root_tag: &str,
    shelf_dir: &Path,
) -> Result<ShelfFile, RegisterError> {
    if !dir.is_dir() {
        return Err(RegisterError::NotADirectory(dir.to_path_buf()));
    }
    verify_album_tag(root_tag)?;
    let dir = fs::canonicalize(dir)?;
    let shelf_dir = fs::canonicalize(shelf_dir)?;

    let mut taken = HashSet::from([root_tag.to_string()]);
    let mut tags: HashMap<PathBuf, String> = HashMap::from([(dir.clone(), root_tag.to_string())]);
    let mut albums: Vec<AlbumEntry> = vec![AlbumEntry {
        tag: root_tag.to_string(),
        kind: AlbumKind::Plain,
        children: Vec::new(),
        attributes: BTreeMap::new(),
    }];
    let mut album_index: HashMap<String, usize> = HashMap::from([(root_tag.to_string(), 0)]);
    let mut images = Vec::new();
    let mut next_id = 1u64;

    let walker = WalkDir::new(&dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = entry?;
        if entry.depth() == 0 {
            continue;
        }
        let path = entry.path();
        let parent_tag = path
            .parent()
            .and_then(|p| tags.get(p))
            .cloned()
            .unwrap_or_else(|| root_tag.to_string());

        if entry.file_type().is_dir() {
            let relative = path.strip_prefix(&dir).unwrap_or(path);
            let tag = unique_tag(directory_tag(relative), &mut taken);
            tags.insert(path.to_path_buf(), tag.clone());
            album_index.insert(tag.clone(), albums.len());
            albums.push(AlbumEntry {
                tag: tag.clone(),
                kind: AlbumKind::Plain,
                children: Vec::new(),
                attributes: BTreeMap::from([(
                    "title".to_string(),
                    entry.file_name().to_string_lossy().into_owned(),
                )]),
            });
            albums[album_index[&parent_tag]]
                .children
                .push(ChildRef::Album(tag));
        } else if entry.file_type().is_file() && is_image(path) {
            let id = next_id;
            next_id += 1;
            let mut attributes = BTreeMap::new();
            match image::image_dimensions(path) {
                Ok((w, h)) => {
                    attributes.insert("width".to_string(), w.to_string());
                    attributes.insert("height".to_string(), h.to_string());
                }
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "could not read dimensions");
                }
            }
            match read_exif_attributes(path) {
                Ok(tags) => attributes.extend(tags),
                Err(e) => {
                    tracing::warn!(file = %path.display(), error = %e, "could not read EXIF data");
                }
            }
            images.push(ImageEntry {
                id,
                location: shelf_location(path, &shelf_dir),
                hash: Some(hash_file(path)?),
                attributes,
            });
            albums[album_index[&parent_tag]]
                .children
                .push(ChildRef::Image(id));
            tracing::debug!(id, file = %path.display(), album = %parent_tag, "registered image");
        }
    }

    Ok(ShelfFile {
        root: root_tag.to_string(),
        albums,
        images,
    })
}

/// Scan `dir` and write the result to `shelf_path`.
pub fn register(
    dir: &Path,
    root_tag: &str,
    shelf_path: &Path,
) -> Result<RegisterSummary, RegisterError> {
    let shelf_dir = match shelf_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&shelf_dir)?;
    let shelf = scan_directory(dir, root_tag, &shelf_dir)?;
    fs::write(shelf_path, shelf.to_toml()?)?;
    tracing::info!(
        albums = shelf.albums.len(),
        images = shelf.images.len(),
        shelf = %shelf_path.display(),
        "registered directory"
    );
    Ok(RegisterSummary {
        albums: shelf.albums.len(),
        images: shelf.images.len(),
        shelf: shelf_path.to_path_buf(),
    })
}
