//! Image rendering collaborator trait and shared types.
//!
//! The [`ImageRenderer`] trait is the only thing the generation engine knows
//! about pixels: given an image and a bounding box, produce a file somewhere
//! on disk and report its real dimensions. Those may be smaller than the
//! limits, since aspect ratio is preserved and originals are never upscaled.
//!
//! The production implementation is
//! [`RustRenderer`](super::rust_backend::RustRenderer), pure Rust with its
//! own on-disk cache.

use crate::catalog::Image;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {message}")]
    Decode { path: PathBuf, message: String },
    #[error("Rendering failed: {0}")]
    ProcessingFailed(String),
}

/// A materialized variant of an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Absolute path of the rendered file.
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Renders an image bounded by a width/height limit.
///
/// Implementations must be idempotent for identical inputs. `Sync` so
/// independent renders can be fanned out with rayon.
pub trait ImageRenderer: Sync {
    fn render(
        &self,
        image: &Image,
        width_limit: u32,
        height_limit: u32,
    ) -> Result<Rendered, RenderError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::catalog::ImageId;
    use crate::imaging::calculations::fit_within;
    use std::path::Path;
    use std::sync::Mutex;

    /// Mock renderer that records calls and writes a small placeholder file
    /// per variant into its directory.
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    pub struct MockRenderer {
        dir: PathBuf,
        /// Dimensions reported for every original.
        pub original: (u32, u32),
        pub failing: Option<ImageId>,
        pub calls: Mutex<Vec<RecordedRender>>,
    }

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRender {
        pub image: ImageId,
        pub width_limit: u32,
        pub height_limit: u32,
    }

    impl MockRenderer {
        pub fn new(dir: &Path) -> Self {
            Self {
                dir: dir.to_path_buf(),
                original: (1600, 1200),
                failing: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_on(dir: &Path, image: ImageId) -> Self {
            Self {
                failing: Some(image),
                ..Self::new(dir)
            }
        }

        pub fn get_calls(&self) -> Vec<RecordedRender> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageRenderer for MockRenderer {
        fn render(
            &self,
            image: &Image,
            width_limit: u32,
            height_limit: u32,
        ) -> Result<Rendered, RenderError> {
            self.calls.lock().unwrap().push(RecordedRender {
                image: image.id,
                width_limit,
                height_limit,
            });
            if self.failing == Some(image.id) {
                return Err(RenderError::Decode {
                    path: image.location.clone(),
                    message: "corrupt".into(),
                });
            }
            let (width, height) = fit_within(self.original, (width_limit, height_limit));
            let path = self
                .dir
                .join(format!("{}-{}x{}.jpg", image.hash, width_limit, height_limit));
            std::fs::write(&path, format!("{width}x{height}"))?;
            Ok(Rendered {
                path,
                width,
                height,
            })
        }
    }

    #[test]
    fn mock_records_and_fits() {
        let tmp = tempfile::TempDir::new().unwrap();
        let catalog = crate::test_helpers::ShelfBuilder::new("root")
            .album("root", &[])
            .image(1, "a.jpg", None)
            .build();
        let image = catalog.image(ImageId(1)).unwrap();
        let renderer = MockRenderer::new(tmp.path());

        let rendered = renderer.render(image, 100, 100).unwrap();
        assert_eq!((rendered.width, rendered.height), (100, 75));
        assert!(rendered.path.exists());
        assert_eq!(
            renderer.get_calls(),
            vec![RecordedRender {
                image: ImageId(1),
                width_limit: 100,
                height_limit: 100
            }]
        );
    }

    #[test]
    fn mock_failure() {
        let tmp = tempfile::TempDir::new().unwrap();
        let catalog = crate::test_helpers::ShelfBuilder::new("root")
            .album("root", &[])
            .image(1, "a.jpg", None)
            .build();
        let image = catalog.image(ImageId(1)).unwrap();
        let renderer = MockRenderer::failing_on(tmp.path(), ImageId(1));
        assert!(matches!(
            renderer.render(image, 10, 10),
            Err(RenderError::Decode { .. })
        ));
    }
}
