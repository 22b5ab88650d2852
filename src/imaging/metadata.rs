//! EXIF tags imported when a directory is registered.
//!
//! | Attribute | EXIF tag |
//! |---|---|
//! | `captured` | `DateTimeDigitized`, else `DateTimeOriginal`, else `DateTime` |
//! | `orientation` | `Orientation`, mirrored variants as `up` |
//! | `cameramake`, `cameramodel` | `Make`, `Model` |
//! | `exposuretime`, `fnumber`, `focallength`, `flash` | same, with units |
//!
//! `captured` is stored as `YYYY-MM-DD HH:MM:SS`, the form asset naming
//! parses. Unparseable timestamps are dropped.

use super::params::Orientation;
use exif::{Exif, In, Reader, Tag, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// Later tags win.
const CAPTURE_TAGS: &[Tag] = &[Tag::DateTime, Tag::DateTimeOriginal, Tag::DateTimeDigitized];

const CAMERA_TAGS: &[(Tag, &str)] = &[
    (Tag::Make, "cameramake"),
    (Tag::Model, "cameramodel"),
    (Tag::ExposureTime, "exposuretime"),
    (Tag::FNumber, "fnumber"),
    (Tag::FocalLength, "focallength"),
    (Tag::Flash, "flash"),
];

/// Image attributes from the EXIF block of `path`.
///
/// Only failing to open the file is an error. A file without EXIF data, or
/// with a block that does not parse, yields no attributes.
pub fn read_exif_attributes(path: &Path) -> io::Result<BTreeMap<String, String>> {
    let mut reader = BufReader::new(File::open(path)?);
    match Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(exif_attributes(&exif)),
        Err(e) => {
            tracing::debug!(file = %path.display(), error = %e, "no EXIF data");
            Ok(BTreeMap::new())
        }
    }
}

fn exif_attributes(exif: &Exif) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    for tag in CAPTURE_TAGS {
        if let Some(stamp) = exif
            .get_field(*tag, In::PRIMARY)
            .and_then(|field| timestamp(&field.value))
        {
            attributes.insert("captured".to_string(), stamp);
        }
    }

    for (tag, name) in CAMERA_TAGS {
        let Some(field) = exif.get_field(*tag, In::PRIMARY) else {
            continue;
        };
        let value = match &field.value {
            Value::Ascii(parts) => parts.first().map(|p| ascii(p)).unwrap_or_default(),
            _ => field.display_value().with_unit(exif).to_string(),
        };
        if !value.is_empty() {
            attributes.insert(name.to_string(), value);
        }
    }

    if let Some(orientation) = exif
        .get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .and_then(Orientation::from_exif)
    {
        attributes.insert("orientation".to_string(), orientation.to_string());
    }

    attributes
}

fn ascii(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_matches(|c: char| c == '\0' || c.is_whitespace())
        .to_string()
}

/// `YYYY:MM:DD HH:MM:SS` as `YYYY-MM-DD HH:MM:SS`.
fn timestamp(value: &Value) -> Option<String> {
    let Value::Ascii(parts) = value else {
        return None;
    };
    let dt = exif::DateTime::from_ascii(parts.first()?).ok()?;
    Some(format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        dt.year, dt.month, dt.day, dt.hour, dt.minute, dt.second
    ))
}
