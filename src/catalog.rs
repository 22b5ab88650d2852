//! The shelf: albums, images and their attributes.
//!
//! A shelf is a TOML file listing albums and images. Albums form a graph, not
//! a tree: an album may be the child of several albums, and the children
//! relation may contain cycles (an album listing one of its ancestors, or the
//! magic `allalbums` album, which contains every album including itself).
//!
//! ## File format
//!
//! ```toml
//! root = "root"
//!
//! [[album]]
//! tag = "root"
//! children = ["travel", 1, "all"]   # strings are album tags, integers image ids
//! [album.attributes]
//! title = "My photos"
//!
//! [[album]]
//! tag = "all"
//! type = "allalbums"
//!
//! [[image]]
//! id = 1
//! location = "photos/img_0001.jpg"  # relative to the shelf file
//! [image.attributes]
//! captured = "2005-03-15 10:00:00"
//! ```
//!
//! ## Album kinds
//!
//! | Kind | Children |
//! |------|----------|
//! | `plain` | explicit, ordered |
//! | `allalbums` | every album, sorted by tag |
//! | `allimages` | every image with a `captured` attribute, by capture time |
//! | `orphans` | albums and images that no plain album lists |
//!
//! The generation engine only reads from a [`Catalog`]; nothing here is
//! mutated once loaded.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Bad album tag: {0:?}")]
    BadAlbumTag(String),
    #[error("Duplicate album tag: {0}")]
    DuplicateAlbum(String),
    #[error("Duplicate image id: {0}")]
    DuplicateImage(ImageId),
    #[error("Album not found: {0}")]
    AlbumNotFound(String),
    #[error("Image not found: {0}")]
    ImageNotFound(ImageId),
    #[error("Cannot hash {path}: {source}")]
    Hash {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Arena index of an album within one [`Catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlbumId(usize);

/// Numeric image identity, as stored in the shelf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(pub u64);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlbumKind {
    #[default]
    Plain,
    AllAlbums,
    AllImages,
    Orphans,
}

impl AlbumKind {
    fn is_plain(&self) -> bool {
        *self == AlbumKind::Plain
    }
}

/// A member of an album.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Child {
    Album(AlbumId),
    Image(ImageId),
}

impl Child {
    pub fn is_album(&self) -> bool {
        matches!(self, Child::Album(_))
    }
}

#[derive(Debug, Clone)]
pub struct Album {
    pub id: AlbumId,
    pub tag: String,
    pub kind: AlbumKind,
    pub attributes: BTreeMap<String, String>,
    members: Vec<Child>,
}

impl Album {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Display title: the `title` attribute, falling back to the tag.
    pub fn title(&self) -> &str {
        self.attribute("title")
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(&self.tag)
    }
}

#[derive(Debug, Clone)]
pub struct Image {
    pub id: ImageId,
    /// Content hash, stable across runs.
    pub hash: String,
    /// Location of the original file.
    pub location: PathBuf,
    pub attributes: BTreeMap<String, String>,
}

impl Image {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Free-text capture timestamp, if any.
    pub fn captured(&self) -> Option<&str> {
        self.attribute("captured")
    }

    fn capture_order_key(&self) -> (&str, &Path) {
        (self.captured().unwrap_or(""), self.location.as_path())
    }
}

// ============================================================================
// Shelf file (serialized form)
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShelfFile {
    /// Tag of the root album.
    pub root: String,
    #[serde(default, rename = "album")]
    pub albums: Vec<AlbumEntry>,
    #[serde(default, rename = "image")]
    pub images: Vec<ImageEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlbumEntry {
    pub tag: String,
    #[serde(default, rename = "type", skip_serializing_if = "AlbumKind::is_plain")]
    pub kind: AlbumKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

/// Child reference in a shelf file: integers are image ids, strings album tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChildRef {
    Image(u64),
    Album(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageEntry {
    pub id: u64,
    pub location: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ShelfFile {
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Album tags must be non-empty, free of whitespace, and not look like an
/// image id.
pub fn verify_album_tag(tag: &str) -> Result<(), CatalogError> {
    if tag.is_empty() || tag.chars().any(char::is_whitespace) || tag.parse::<i64>().is_ok() {
        return Err(CatalogError::BadAlbumTag(tag.to_string()));
    }
    Ok(())
}

// ============================================================================
// Catalog
// ============================================================================

/// Loaded, validated shelf.
#[derive(Debug, Clone)]
pub struct Catalog {
    albums: Vec<Album>,
    images: BTreeMap<ImageId, Image>,
    tags: HashMap<String, AlbumId>,
    by_tag: Vec<AlbumId>,
    root: AlbumId,
}

impl Catalog {
    /// Load a shelf file. Relative image locations resolve against the
    /// directory containing the file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let shelf: ShelfFile = toml::from_str(&content)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_shelf(shelf, base_dir)
    }

    /// Build a catalog from its serialized form, validating every reference.
    /// Images without a stored hash are hashed from their file contents.
    pub fn from_shelf(shelf: ShelfFile, base_dir: &Path) -> Result<Self, CatalogError> {
        let mut images = BTreeMap::new();
        for entry in shelf.images {
            let id = ImageId(entry.id);
            let location = if entry.location.is_absolute() {
                entry.location
            } else {
                base_dir.join(entry.location)
            };
            let hash = match entry.hash {
                Some(h) => h,
                None => crate::cache::hash_file(&location).map_err(|source| {
                    CatalogError::Hash {
                        path: location.clone(),
                        source,
                    }
                })?,
            };
            let image = Image {
                id,
                hash,
                location,
                attributes: entry.attributes,
            };
            if images.insert(id, image).is_some() {
                return Err(CatalogError::DuplicateImage(id));
            }
        }

        let mut tags = HashMap::new();
        for (idx, entry) in shelf.albums.iter().enumerate() {
            verify_album_tag(&entry.tag)?;
            if tags.insert(entry.tag.clone(), AlbumId(idx)).is_some() {
                return Err(CatalogError::DuplicateAlbum(entry.tag.clone()));
            }
        }

        let mut albums = Vec::with_capacity(shelf.albums.len());
        for (idx, entry) in shelf.albums.into_iter().enumerate() {
            let members = entry
                .children
                .iter()
                .map(|child| match child {
                    ChildRef::Image(id) => {
                        let id = ImageId(*id);
                        if images.contains_key(&id) {
                            Ok(Child::Image(id))
                        } else {
                            Err(CatalogError::ImageNotFound(id))
                        }
                    }
                    ChildRef::Album(tag) => tags
                        .get(tag)
                        .map(|id| Child::Album(*id))
                        .ok_or_else(|| CatalogError::AlbumNotFound(tag.clone())),
                })
                .collect::<Result<Vec<_>, _>>()?;
            albums.push(Album {
                id: AlbumId(idx),
                tag: entry.tag,
                kind: entry.kind,
                attributes: entry.attributes,
                members,
            });
        }

        let root = *tags
            .get(&shelf.root)
            .ok_or_else(|| CatalogError::AlbumNotFound(shelf.root.clone()))?;

        let mut by_tag: Vec<AlbumId> = albums.iter().map(|a| a.id).collect();
        by_tag.sort_by(|a, b| albums[a.0].tag.cmp(&albums[b.0].tag));

        Ok(Self {
            albums,
            images,
            tags,
            by_tag,
            root,
        })
    }

    pub fn root(&self) -> AlbumId {
        self.root
    }

    /// Look up an album by id. Ids are only handed out by this catalog.
    pub fn album(&self, id: AlbumId) -> &Album {
        &self.albums[id.0]
    }

    pub fn album_by_tag(&self, tag: &str) -> Result<AlbumId, CatalogError> {
        self.tags
            .get(tag)
            .copied()
            .ok_or_else(|| CatalogError::AlbumNotFound(tag.to_string()))
    }

    pub fn image(&self, id: ImageId) -> Result<&Image, CatalogError> {
        self.images.get(&id).ok_or(CatalogError::ImageNotFound(id))
    }

    /// All albums in tag order.
    pub fn albums(&self) -> impl Iterator<Item = &Album> {
        self.by_tag.iter().map(|id| self.album(*id))
    }

    /// All images in id order.
    pub fn images(&self) -> impl Iterator<Item = &Image> {
        self.images.values()
    }

    pub fn album_count(&self) -> usize {
        self.albums.len()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Ordered children of an album. Magic albums compute theirs from the
    /// whole shelf on every call.
    pub fn children(&self, id: AlbumId) -> Vec<Child> {
        let album = self.album(id);
        match album.kind {
            AlbumKind::Plain => album.members.clone(),
            AlbumKind::AllAlbums => self.by_tag.iter().map(|id| Child::Album(*id)).collect(),
            AlbumKind::AllImages => {
                let mut images: Vec<&Image> =
                    self.images.values().filter(|i| i.captured().is_some()).collect();
                images.sort_by(|a, b| a.capture_order_key().cmp(&b.capture_order_key()));
                images.into_iter().map(|i| Child::Image(i.id)).collect()
            }
            AlbumKind::Orphans => self.orphans(),
        }
    }

    /// Children that are albums, in child order.
    pub fn album_children(&self, id: AlbumId) -> Vec<AlbumId> {
        self.children(id)
            .into_iter()
            .filter_map(|c| match c {
                Child::Album(a) => Some(a),
                Child::Image(_) => None,
            })
            .collect()
    }

    /// Plain albums listing `id` as a child, in tag order.
    pub fn album_parents(&self, id: AlbumId) -> Vec<AlbumId> {
        self.by_tag
            .iter()
            .copied()
            .filter(|parent| {
                let album = self.album(*parent);
                album.kind.is_plain() && album.members.contains(&Child::Album(id))
            })
            .collect()
    }

    fn orphans(&self) -> Vec<Child> {
        let listed: HashSet<Child> = self
            .albums
            .iter()
            .filter(|a| a.kind.is_plain())
            .flat_map(|a| a.members.iter().copied())
            .collect();

        let mut children: Vec<Child> = self
            .by_tag
            .iter()
            .copied()
            .filter(|id| *id != self.root && !listed.contains(&Child::Album(*id)))
            .map(Child::Album)
            .collect();

        let mut images: Vec<&Image> = self
            .images
            .values()
            .filter(|i| !listed.contains(&Child::Image(i.id)))
            .collect();
        images.sort_by(|a, b| a.capture_order_key().cmp(&b.capture_order_key()));
        children.extend(images.into_iter().map(|i| Child::Image(i.id)));
        children
    }
}
