//! Image rendering in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify (cache hit)** | `image::image_dimensions` |
//! | **EXIF (register)** | `kamadak-exif` capture time, orientation, camera |
//! | **Orient** | quarter-turn rotations from the `orientation` attribute |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: [`Quality`] and [`Orientation`]
//! - **Backend**: [`ImageRenderer`] trait + [`RustRenderer`]
//! - **EXIF**: [`read_exif_attributes`] for the register command

pub mod backend;
mod calculations;
mod metadata;
mod params;
pub mod rust_backend;

pub use backend::{ImageRenderer, RenderError, Rendered};
pub use calculations::fit_within;
pub use metadata::read_exif_attributes;
pub use params::{Orientation, Quality};
pub use rust_backend::RustRenderer;
