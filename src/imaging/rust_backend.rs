//! Pure Rust renderer backed by an on-disk cache.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` with guessed format |
//! | Rotate | `DynamicImage::rotate90` / `rotate180` / `rotate270` |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Cache hit | `image::image_dimensions` (header only) |
//!
//! Variants are written to a temporary name first and renamed into place, so
//! an interrupted run never leaves a truncated file under a valid cache name.

use super::backend::{ImageRenderer, RenderError, Rendered};
use super::calculations::fit_within;
use super::params::{Orientation, Quality};
use crate::cache::{CacheStats, cache_file_name};
use crate::catalog::Image;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Renders JPEG variants into `cache_dir`, reusing files from earlier runs.
pub struct RustRenderer {
    cache_dir: PathBuf,
    quality: Quality,
    stats: Mutex<CacheStats>,
    scratch: AtomicUsize,
}

impl RustRenderer {
    /// Creates the cache directory if needed. The stored path is absolute so
    /// rendered paths stay valid as symlink targets.
    pub fn new(cache_dir: &Path, quality: Quality) -> Result<Self, RenderError> {
        fs::create_dir_all(cache_dir)?;
        let cache_dir = fs::canonicalize(cache_dir)?;
        Ok(Self {
            cache_dir,
            quality,
            stats: Mutex::new(CacheStats::default()),
            scratch: AtomicUsize::new(0),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Hits and misses since construction.
    pub fn stats(&self) -> CacheStats {
        self.lock_stats().clone()
    }

    fn lock_stats(&self) -> std::sync::MutexGuard<'_, CacheStats> {
        self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn encode(&self, img: &DynamicImage, dest: &Path) -> Result<(), RenderError> {
        let n = self.scratch.fetch_add(1, Ordering::Relaxed);
        let tmp = dest.with_extension(format!("tmp{}-{n}", std::process::id()));
        let file = fs::File::create(&tmp)?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), self.quality.value() as u8);
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        if let Err(e) = rgb.write_with_encoder(encoder) {
            let _ = fs::remove_file(&tmp);
            return Err(RenderError::ProcessingFailed(format!(
                "JPEG encode failed for {}: {e}",
                dest.display()
            )));
        }
        fs::rename(&tmp, dest)?;
        Ok(())
    }
}

fn load_image(path: &Path) -> Result<DynamicImage, RenderError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| RenderError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

impl ImageRenderer for RustRenderer {
    fn render(
        &self,
        image: &Image,
        width_limit: u32,
        height_limit: u32,
    ) -> Result<Rendered, RenderError> {
        let orientation = Orientation::from_attribute(image.attribute("orientation"));
        let path = self.cache_dir.join(cache_file_name(
            &image.hash,
            width_limit,
            height_limit,
            orientation,
        ));

        if path.is_file() {
            let (width, height) =
                image::image_dimensions(&path).map_err(|e| RenderError::Decode {
                    path: path.clone(),
                    message: e.to_string(),
                })?;
            self.lock_stats().hit();
            tracing::debug!(image = %image.id, file = %path.display(), "render cache hit");
            return Ok(Rendered {
                path,
                width,
                height,
            });
        }

        let original = orientation.apply(load_image(&image.location)?);
        let (width, height) = fit_within(
            (original.width(), original.height()),
            (width_limit, height_limit),
        );
        let resized = if (width, height) == (original.width(), original.height()) {
            original
        } else {
            original.resize_exact(width, height, FilterType::Lanczos3)
        };
        self.encode(&resized, &path)?;
        self.lock_stats().miss();
        tracing::debug!(
            image = %image.id,
            width,
            height,
            file = %path.display(),
            "rendered variant"
        );

        Ok(Rendered {
            path,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ImageId;
    use crate::test_helpers::ShelfBuilder;
    use image::{ImageEncoder, RgbImage};
    use tempfile::TempDir;

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = fs::File::create(path).unwrap();
        let writer = BufWriter::new(file);
        JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn catalog_with(source: &Path, orientation: Option<&str>) -> crate::catalog::Catalog {
        let mut builder = ShelfBuilder::new("root")
            .album("root", &[])
            .image(1, source.to_str().unwrap(), None);
        if let Some(o) = orientation {
            builder = builder.image_attr(1, "orientation", o);
        }
        builder.build()
    }

    #[test]
    fn renders_within_limits_and_caches() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("source.jpg");
        create_test_jpeg(&source, 400, 300);
        let catalog = catalog_with(&source, None);
        let image = catalog.image(ImageId(1)).unwrap();

        let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::new(80)).unwrap();
        let first = renderer.render(image, 100, 100).unwrap();
        assert_eq!((first.width, first.height), (100, 75));
        assert!(first.path.is_absolute());
        assert_eq!(image::image_dimensions(&first.path).unwrap(), (100, 75));
        assert_eq!(renderer.stats(), CacheStats { hits: 0, misses: 1 });

        let second = renderer.render(image, 100, 100).unwrap();
        assert_eq!(first, second);
        assert_eq!(renderer.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[test]
    fn never_upscales_small_originals() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("small.jpg");
        create_test_jpeg(&source, 60, 40);
        let catalog = catalog_with(&source, None);
        let image = catalog.image(ImageId(1)).unwrap();

        let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::default()).unwrap();
        let rendered = renderer.render(image, 640, 640).unwrap();
        assert_eq!((rendered.width, rendered.height), (60, 40));
    }

    #[test]
    fn rotated_originals_swap_dimensions() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("sideways.jpg");
        create_test_jpeg(&source, 200, 100);
        let catalog = catalog_with(&source, Some("right"));
        let image = catalog.image(ImageId(1)).unwrap();

        let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::default()).unwrap();
        let rendered = renderer.render(image, 50, 50).unwrap();
        assert_eq!((rendered.width, rendered.height), (25, 50));
        assert!(
            rendered
                .path
                .file_name()
                .unwrap()
                .to_string_lossy()
                .ends_with("-50x50-right.jpg")
        );
    }

    #[test]
    fn missing_original_is_error() {
        let tmp = TempDir::new().unwrap();
        let catalog = catalog_with(&tmp.path().join("absent.jpg"), None);
        let image = catalog.image(ImageId(1)).unwrap();

        let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::default()).unwrap();
        assert!(matches!(
            renderer.render(image, 10, 10),
            Err(RenderError::Io(_))
        ));
    }

    #[test]
    fn undecodable_original_is_decode_error() {
        let tmp = TempDir::new().unwrap();
        let source = tmp.path().join("garbage.jpg");
        fs::write(&source, b"definitely not an image").unwrap();
        let catalog = catalog_with(&source, None);
        let image = catalog.image(ImageId(1)).unwrap();

        let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::default()).unwrap();
        assert!(matches!(
            renderer.render(image, 10, 10),
            Err(RenderError::Decode { .. })
        ));
        // No partial file left behind
        assert_eq!(fs::read_dir(renderer.cache_dir()).unwrap().count(), 0);
    }
}
