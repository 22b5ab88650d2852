//! Output names for rendered image assets.
//!
//! Every rendered variant lands under `@images/` with a name derived from the
//! image alone, so an unchanged shelf always produces the same file names.
//!
//! ## Dated images
//!
//! When the `captured` attribute starts with `YEAR-MONTH`, assets are grouped
//! by year and month and named after the full timestamp:
//!
//! - `"2005-03-15 10:00:00"` at 100×100 → `2005/03/20050315_100000-100x100.jpg`
//!
//! ## Undated images
//!
//! Everything else falls back to the original file name plus the image id,
//! which keeps two `IMG_0001.jpg` files from different cameras apart:
//!
//! - `/photos/IMG_0001.JPG`, id 17, at 640×480 → `undated/IMG_0001-640x480-17.JPG`
//!
//! ## Collisions
//!
//! Two images captured in the same second still want the same name. The
//! [`NameRegistry`] hands out `-1`, `-2`, … suffixes before the extension to
//! every claim after the first.

use crate::catalog::Image;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static CAPTURED_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)").expect("static regex must compile"));

/// The parts of a `captured` timestamp used for naming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedStamp {
    /// Year digits as written (e.g. `"2005"`).
    pub year: String,
    /// Month digits as written, leading zero preserved (e.g. `"03"`).
    pub month: String,
    /// Whole timestamp with spaces turned into `_` and `-`/`:` removed.
    pub compact: String,
}

/// Best-effort parse of a free-text `captured` attribute.
///
/// - `"2005-03-15 10:00:00"` → year `2005`, month `03`, compact `20050315_100000`
/// - `"2005-03"` → year `2005`, month `03`, compact `200503`
/// - `"March 2005"`, `"2005"`, `""` → `None`
pub fn parse_captured(captured: &str) -> Option<CapturedStamp> {
    let caps = CAPTURED_PREFIX.captures(captured)?;
    let compact = captured.replace(' ', "_").replace([':', '-'], "");
    Some(CapturedStamp {
        year: caps[1].to_string(),
        month: caps[2].to_string(),
        compact,
    })
}

/// Preferred relative name (below `@images/`) for an image rendered within
/// `width_limit × height_limit`. Pure: depends only on image attributes.
pub fn preferred_name(image: &Image, width_limit: u32, height_limit: u32) -> String {
    if let Some(stamp) = image.captured().and_then(parse_captured) {
        return format!(
            "{}/{}/{}-{}x{}.jpg",
            stamp.year, stamp.month, stamp.compact, width_limit, height_limit
        );
    }
    let stem = image
        .location
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = image
        .location
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    format!(
        "undated/{}-{}x{}-{}{}",
        stem, width_limit, height_limit, image.id, ext
    )
}

/// Split a `/`-separated name into (everything before the extension,
/// extension with its dot). Dots in directory components are ignored.
fn split_extension(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => name.split_at(file_start + dot),
        _ => (name, ""),
    }
}

/// Names already handed out during one generation run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    claimed: HashSet<String>,
}

impl NameRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `preferred`, or the first free `{stem}-{n}{ext}` with n = 1, 2, …
    /// The suffix always counts from the preferred name, so a file that
    /// already ends in `-<digit>` keeps its own digits.
    pub fn claim(&mut self, preferred: &str) -> String {
        if self.claimed.insert(preferred.to_string()) {
            return preferred.to_string();
        }
        let (stem, ext) = split_extension(preferred);
        let mut n = 1u32;
        loop {
            let candidate = format!("{stem}-{n}{ext}");
            if self.claimed.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }

    pub fn is_claimed(&self, name: &str) -> bool {
        self.claimed.contains(name)
    }

    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
