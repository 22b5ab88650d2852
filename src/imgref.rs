//! Per-run memo of published image variants.
//!
//! Pages ask for an image at a size and get back a reference relative to the
//! output root (`@images/2005/03/20050315_100000-640x640.jpg`) plus the real
//! pixel dimensions. The first request for a `(hash, width, height)` key
//! renders, names, claims and places the file; every later request, from any
//! album or page, returns the stored answer untouched.
//!
//! Keying on the content hash rather than the image id means two catalog
//! entries pointing at identical files share one published asset.
//!
//! [`ImageReferenceCache::warm`] front-loads the expensive part: renders for
//! all missing keys run in parallel on the rayon pool, then naming and
//! placement happen one by one in request order, so claimed names are the
//! same as if every request had gone through [`get`](ImageReferenceCache::get).

use crate::catalog::Image;
use crate::imaging::{ImageRenderer, RenderError, Rendered};
use crate::naming::{NameRegistry, preferred_name};
use crate::writer::OutputWriter;
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};

/// Directory below the output root that holds every rendered asset.
pub const IMAGES_DIR: &str = "@images";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey {
    pub hash: String,
    pub width_limit: u32,
    pub height_limit: u32,
}

impl AssetKey {
    pub fn new(image: &Image, width_limit: u32, height_limit: u32) -> Self {
        Self {
            hash: image.hash.clone(),
            width_limit,
            height_limit,
        }
    }
}

/// A published asset: output-relative path with `/` separators, and the
/// dimensions actually rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub reference: String,
    pub width: u32,
    pub height: u32,
}

pub struct ImageReferenceCache<'a> {
    renderer: &'a dyn ImageRenderer,
    writer: OutputWriter,
    registry: NameRegistry,
    refs: HashMap<AssetKey, ImageReference>,
}

impl<'a> ImageReferenceCache<'a> {
    pub fn new(renderer: &'a dyn ImageRenderer, writer: OutputWriter) -> Self {
        Self {
            renderer,
            writer,
            registry: NameRegistry::new(),
            refs: HashMap::new(),
        }
    }

    /// Reference for `image` within the given limits, rendering and
    /// publishing it on first request.
    pub fn get(
        &mut self,
        image: &Image,
        width_limit: u32,
        height_limit: u32,
    ) -> Result<ImageReference, RenderError> {
        let key = AssetKey::new(image, width_limit, height_limit);
        if let Some(found) = self.refs.get(&key) {
            return Ok(found.clone());
        }
        let rendered = self.renderer.render(image, width_limit, height_limit)?;
        self.publish(key, image, rendered)
    }

    /// Render every not-yet-published request in parallel, then publish them
    /// serially in request order. Returns how many assets were published.
    pub fn warm(&mut self, requests: &[(&Image, u32, u32)]) -> Result<usize, RenderError> {
        let mut seen = HashSet::new();
        let pending: Vec<(AssetKey, &Image, u32, u32)> = requests
            .iter()
            .filter_map(|&(image, w, h)| {
                let key = AssetKey::new(image, w, h);
                (!self.refs.contains_key(&key) && seen.insert(key.clone()))
                    .then_some((key, image, w, h))
            })
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let renderer = self.renderer;
        let rendered: Vec<Result<Rendered, RenderError>> = pending
            .par_iter()
            .map(|(_, image, w, h)| renderer.render(image, *w, *h))
            .collect();

        let count = pending.len();
        for ((key, image, _, _), result) in pending.into_iter().zip(rendered) {
            self.publish(key, image, result?)?;
        }
        tracing::debug!(count, "warmed image references");
        Ok(count)
    }

    /// Number of distinct assets published so far.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    fn publish(
        &mut self,
        key: AssetKey,
        image: &Image,
        rendered: Rendered,
    ) -> Result<ImageReference, RenderError> {
        let preferred = preferred_name(image, key.width_limit, key.height_limit);
        let name = self.registry.claim(&format!("{IMAGES_DIR}/{preferred}"));
        if let Some((dir, _)) = name.rsplit_once('/') {
            self.writer.make_directory(dir)?;
        }
        self.writer.symlink_file(&rendered.path, &name)?;
        tracing::debug!(image = %image.id, asset = %name, "published asset");

        let reference = ImageReference {
            reference: name,
            width: rendered.width,
            height: rendered.height,
        };
        self.refs.insert(key, reference.clone());
        Ok(reference)
    }
}
