//! Site generation.
//!
//! Walks the album graph from a root album and drives a [`PageRenderer`] over
//! it. The pipeline decides *which* albums and images get pages and in what
//! order; the renderer decides what a page looks like and where it is written.
//!
//! ## Run order
//!
//! 1. Create the destination directory.
//! 2. Resolve every breadcrumb path from the root ([`resolve_paths`]).
//! 3. Select albums: everything reachable, or the requested subset with its
//!    descendants and ancestors.
//! 4. `pre_generation` once.
//! 5. Optionally warm the image cache in parallel (see
//!    [`PageRenderer::asset_limits`]).
//! 6. For each selected album, sorted by tag: one album page, then one page
//!    per image child in child order.
//! 7. `post_generation` once.
//!
//! Any error aborts the run. Whatever was written before the failure stays.
//!
//! ## Per-run state
//!
//! [`RunContext`] carries the catalog, the output writer and the
//! [`ImageReferenceCache`]. A fresh context is built for every
//! [`GenerationPipeline::generate`] call, so asset names never leak between
//! runs.

use crate::catalog::{Album, AlbumId, Catalog, CatalogError, Child, Image};
use crate::imaging::{ImageRenderer, RenderError};
use crate::imgref::{ImageReference, ImageReferenceCache};
use crate::paths::{AlbumPath, AlbumPaths, resolve_paths};
use crate::writer::{OutputWriter, PlacementMode};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Rendering failed: {0}")]
    Render(#[from] RenderError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Progress reported while a run is under way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateEvent {
    CalculatingPaths,
    AssetsWarmed {
        count: usize,
    },
    AlbumStarted {
        tag: String,
        /// 1-based position among the albums being generated.
        position: usize,
        total: usize,
        children: usize,
    },
    Finished(GenerateSummary),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateSummary {
    pub albums: usize,
    pub image_pages: usize,
    pub assets: usize,
}

/// State shared by every page of one run.
pub struct RunContext<'a> {
    pub catalog: &'a Catalog,
    pub writer: OutputWriter,
    pub images: ImageReferenceCache<'a>,
}

impl RunContext<'_> {
    /// Published reference for `image` within `limit`.
    pub fn image_reference(
        &mut self,
        image: &Image,
        limit: (u32, u32),
    ) -> Result<ImageReference, RenderError> {
        self.images.get(image, limit.0, limit.1)
    }
}

/// Page emission hooks driven by [`GenerationPipeline`].
pub trait PageRenderer {
    fn pre_generation(&mut self, run: &mut RunContext<'_>, root: &Album)
    -> Result<(), GenerateError>;

    fn generate_album(
        &mut self,
        run: &mut RunContext<'_>,
        album: &Album,
        sub_albums: &[&Album],
        images: &[&Image],
        paths: &[AlbumPath],
    ) -> Result<(), GenerateError>;

    /// `index` is the image's position in `images` (0-based).
    fn generate_image(
        &mut self,
        run: &mut RunContext<'_>,
        album: &Album,
        image: &Image,
        images: &[&Image],
        index: usize,
        paths: &[AlbumPath],
    ) -> Result<(), GenerateError>;

    fn post_generation(
        &mut self,
        run: &mut RunContext<'_>,
        root: &Album,
    ) -> Result<(), GenerateError>;

    /// Sizes every image on an album page is requested at. When non-empty
    /// the pipeline renders them up front on the rayon pool.
    fn asset_limits(&self) -> Vec<(u32, u32)> {
        Vec::new()
    }
}

pub struct GenerationPipeline<'a, P: PageRenderer> {
    catalog: &'a Catalog,
    renderer: &'a dyn ImageRenderer,
    pages: P,
    placement: PlacementMode,
    events: Option<Sender<GenerateEvent>>,
}

impl<'a, P: PageRenderer> GenerationPipeline<'a, P> {
    pub fn new(catalog: &'a Catalog, renderer: &'a dyn ImageRenderer, pages: P) -> Self {
        Self {
            catalog,
            renderer,
            pages,
            placement: PlacementMode::default(),
            events: None,
        }
    }

    pub fn with_placement(mut self, placement: PlacementMode) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_events(mut self, events: Sender<GenerateEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn pages(&self) -> &P {
        &self.pages
    }

    pub fn into_pages(self) -> P {
        self.pages
    }

    fn emit(&self, event: GenerateEvent) {
        if let Some(tx) = &self.events {
            // The printer may have gone away; progress is best-effort.
            let _ = tx.send(event);
        }
    }

    /// Generate pages for `root` and everything below it, or only for
    /// `subset` (plus descendants and ancestors) when it is non-empty.
    pub fn generate(
        &mut self,
        root: AlbumId,
        subset: &[AlbumId],
        dest: &Path,
    ) -> Result<GenerateSummary, GenerateError> {
        let catalog = self.catalog;
        match fs::create_dir_all(dest) {
            Err(e) if e.kind() != io::ErrorKind::AlreadyExists => return Err(e.into()),
            _ => {}
        }

        self.emit(GenerateEvent::CalculatingPaths);
        let album_paths = resolve_paths(catalog, root);
        let selected = select_albums(catalog, &album_paths, subset);

        let writer = OutputWriter::new(dest).with_placement(self.placement);
        let mut run = RunContext {
            catalog,
            writer: writer.clone(),
            images: ImageReferenceCache::new(self.renderer, writer),
        };

        self.pages.pre_generation(&mut run, catalog.album(root))?;

        let order = generation_order(catalog, &album_paths, &selected);
        tracing::info!(
            root = %catalog.album(root).tag,
            reachable = album_paths.len(),
            selected = order.len(),
            "generating"
        );

        let limits = self.pages.asset_limits();
        if !limits.is_empty() {
            let mut requests = Vec::new();
            for id in &order {
                for child in catalog.children(*id) {
                    if let Child::Image(image_id) = child {
                        let image = catalog.image(image_id)?;
                        requests.extend(limits.iter().map(|&(w, h)| (image, w, h)));
                    }
                }
            }
            let count = run.images.warm(&requests)?;
            self.emit(GenerateEvent::AssetsWarmed { count });
        }

        let total = order.len();
        let mut image_pages = 0;
        for (position, id) in order.iter().enumerate() {
            let album = catalog.album(*id);
            let children = catalog.children(*id);

            let mut sub_albums = Vec::new();
            let mut images = Vec::new();
            for child in &children {
                match child {
                    Child::Album(a) => sub_albums.push(catalog.album(*a)),
                    Child::Image(i) => images.push(catalog.image(*i)?),
                }
            }

            self.emit(GenerateEvent::AlbumStarted {
                tag: album.tag.clone(),
                position: position + 1,
                total,
                children: children.len(),
            });
            tracing::debug!(album = %album.tag, sub_albums = sub_albums.len(), images = images.len(), "album page");

            let paths = &album_paths[id];
            self.pages
                .generate_album(&mut run, album, &sub_albums, &images, paths)?;
            for (index, image) in images.iter().enumerate() {
                self.pages
                    .generate_image(&mut run, album, image, &images, index, paths)?;
            }
            image_pages += images.len();
        }

        self.pages.post_generation(&mut run, catalog.album(root))?;

        let summary = GenerateSummary {
            albums: total,
            image_pages,
            assets: run.images.len(),
        };
        tracing::info!(?summary, "generation finished");
        self.emit(GenerateEvent::Finished(summary.clone()));
        Ok(summary)
    }
}

/// Albums to generate. Empty `subset` means every album reachable from the
/// root. Otherwise each subset album contributes itself, all its
/// descendants and all its ancestors. Both closures tolerate cycles.
pub fn select_albums(
    catalog: &Catalog,
    album_paths: &AlbumPaths,
    subset: &[AlbumId],
) -> HashSet<AlbumId> {
    if subset.is_empty() {
        return album_paths.keys().copied().collect();
    }

    let mut selected = HashSet::new();
    let mut stack: Vec<AlbumId> = subset.to_vec();
    while let Some(id) = stack.pop() {
        if selected.insert(id) {
            stack.extend(catalog.album_children(id));
        }
    }

    let mut ancestors = HashSet::new();
    let mut stack: Vec<AlbumId> = subset.to_vec();
    while let Some(id) = stack.pop() {
        for parent in catalog.album_parents(id) {
            if ancestors.insert(parent) {
                stack.push(parent);
            }
        }
    }

    selected.extend(ancestors);
    selected
}

/// Reachable albums that are also selected, sorted by tag.
fn generation_order(
    catalog: &Catalog,
    album_paths: &AlbumPaths,
    selected: &HashSet<AlbumId>,
) -> Vec<AlbumId> {
    let mut order: Vec<AlbumId> = album_paths
        .keys()
        .copied()
        .filter(|id| selected.contains(id))
        .collect();
    order.sort_by(|a, b| catalog.album(*a).tag.cmp(&catalog.album(*b).tag));
    order
}
