//! Parameter types for image rendering.
//!
//! - [`Quality`]: JPEG encoding quality (1–100, default 90). Clamped on construction.
//! - [`Orientation`]: how an original must be rotated to display upright,
//!   read from the image's `orientation` attribute.

use image::DynamicImage;
use std::fmt;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Which side of the original is the top of the picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Up,
    Down,
    Left,
    Right,
}

impl Orientation {
    /// Unknown or missing values are treated as `up`.
    pub fn from_attribute(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("down") => Orientation::Down,
            Some("left") => Orientation::Left,
            Some("right") => Orientation::Right,
            _ => Orientation::Up,
        }
    }

    /// Map an EXIF `Orientation` value. Mirrored variants keep their top
    /// edge and count as `up`; values outside 1..=8 are not orientations.
    pub fn from_exif(value: u32) -> Option<Self> {
        match value {
            1 | 2 | 4 | 5 | 7 => Some(Orientation::Up),
            3 => Some(Orientation::Down),
            6 => Some(Orientation::Left),
            8 => Some(Orientation::Right),
            _ => None,
        }
    }

    /// Rotate a decoded original so it displays upright.
    ///
    /// `right` turns 90° counter-clockwise, `left` 90° clockwise.
    pub fn apply(self, img: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Up => img,
            Orientation::Down => img.rotate180(),
            Orientation::Left => img.rotate90(),
            Orientation::Right => img.rotate270(),
        }
    }

    /// Whether width and height trade places after [`apply`](Self::apply).
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::Left | Orientation::Right)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Up => "up",
            Orientation::Down => "down",
            Orientation::Left => "left",
            Orientation::Right => "right",
        };
        f.write_str(name)
    }
}
