//! Gallery configuration.
//!
//! A single optional `config.toml` is merged over stock defaults. Files are
//! sparse: override only the values you care about. Unknown keys are rejected
//! to catch typos early.
//!
//! ```toml
//! [gallery]
//! title = "Gallery"           # Shown on every page
//!
//! [images]
//! thumbnail = [128, 128]      # Album grid bounding box
//! display = [640, 640]        # Image page bounding box
//! sizes = [[640, 640], [1280, 1280]]  # Extra sizes linked from image pages
//! quality = 90                # JPEG quality (1-100)
//!
//! [output]
//! symlink = true              # false copies assets for a self-contained site
//!
//! [cache]
//! dir = ".shelf-gal-cache"    # Render cache, relative to the shelf file
//!
//! [colors.light]
//! background = "#ffffff"
//! # text, text_muted, border, link, link_hover
//!
//! [colors.dark]
//! background = "#0a0a0a"
//!
//! [processing]
//! max_processes = 4           # Omit for auto = CPU cores
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Bounding box as `[width, height]`.
pub type Limit = [u32; 2];

/// Gallery configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub gallery: GalleryConfig,
    pub images: ImagesConfig,
    pub output: OutputConfig,
    pub cache: CacheConfig,
    pub colors: ColorConfig,
    pub processing: ProcessingConfig,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        let named = [
            ("images.thumbnail", &self.images.thumbnail),
            ("images.display", &self.images.display),
        ];
        let sizes = self.images.sizes.iter().map(|s| ("images.sizes", s));
        for (name, limit) in named.into_iter().chain(sizes) {
            if limit[0] == 0 || limit[1] == 0 {
                return Err(ConfigError::Validation(format!(
                    "{name} values must be non-zero"
                )));
            }
        }
        if self.cache.dir.trim().is_empty() {
            return Err(ConfigError::Validation("cache.dir must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Every bounding box a generation run renders at, deduplicated, in
    /// thumbnail, display, sizes order.
    pub fn render_limits(&self) -> Vec<(u32, u32)> {
        let mut limits: Vec<(u32, u32)> = Vec::new();
        let all = [self.images.thumbnail, self.images.display]
            .into_iter()
            .chain(self.images.sizes.iter().copied());
        for [w, h] in all {
            if !limits.contains(&(w, h)) {
                limits.push((w, h));
            }
        }
        limits
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    pub title: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            title: "Gallery".to_string(),
        }
    }
}

/// Rendered image sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Thumbnail bounding box used on album pages.
    pub thumbnail: Limit,
    /// Bounding box of the image shown on image pages.
    pub display: Limit,
    /// Additional sizes linked from each image page.
    pub sizes: Vec<Limit>,
    /// JPEG encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            thumbnail: [128, 128],
            display: [640, 640],
            sizes: vec![[640, 640], [1280, 1280]],
            quality: 90,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Symlink assets into the render cache instead of copying them.
    pub symlink: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { symlink: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Render cache directory. Relative paths resolve against the shelf file.
    pub dir: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: ".shelf-gal-cache".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel render workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

/// Color configuration for light and dark modes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorConfig {
    pub light: ColorScheme,
    pub dark: ColorScheme,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            light: ColorScheme::default_light(),
            dark: ColorScheme::default_dark(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColorScheme {
    pub background: String,
    pub text: String,
    /// Breadcrumbs, captions and the attribute table.
    pub text_muted: String,
    pub border: String,
    pub link: String,
    pub link_hover: String,
}

impl ColorScheme {
    pub fn default_light() -> Self {
        Self {
            background: "#ffffff".to_string(),
            text: "#111111".to_string(),
            text_muted: "#666666".to_string(),
            border: "#e0e0e0".to_string(),
            link: "#333333".to_string(),
            link_hover: "#000000".to_string(),
        }
    }

    pub fn default_dark() -> Self {
        Self {
            background: "#0a0a0a".to_string(),
            text: "#eeeeee".to_string(),
            text_muted: "#999999".to_string(),
            border: "#333333".to_string(),
            link: "#cccccc".to_string(),
            link_hover: "#ffffff".to_string(),
        }
    }

    fn variables(&self) -> [(&'static str, &str); 6] {
        [
            ("--color-bg", self.background.as_str()),
            ("--color-text", self.text.as_str()),
            ("--color-text-muted", self.text_muted.as_str()),
            ("--color-border", self.border.as_str()),
            ("--color-link", self.link.as_str()),
            ("--color-link-hover", self.link_hover.as_str()),
        ]
    }
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self::default_light()
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// Tables merge key by key; any other overlay value replaces the base value.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                let merged = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, merged);
            }
            toml::Value::Table(table)
        }
        (_, overlay) => overlay,
    }
}

/// Parse a config document, merge it over the stock defaults and validate.
pub fn parse_config(content: &str) -> Result<SiteConfig, ConfigError> {
    let overlay: toml::Value = toml::from_str(content)?;
    let config: SiteConfig = merge_toml(stock_defaults_value(), overlay).try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load a config file. A missing file yields the stock defaults.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(SiteConfig::default());
    }
    parse_config(&fs::read_to_string(path)?)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# shelf-gal configuration
# =======================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

[gallery]
# Shown in the header of every page.
title = "Gallery"

# ---------------------------------------------------------------------------
# Rendered sizes, as [width, height] bounding boxes.
# Images keep their aspect ratio and are never upscaled.
# ---------------------------------------------------------------------------
[images]
thumbnail = [128, 128]
display = [640, 640]
# Extra sizes linked from every image page.
sizes = [[640, 640], [1280, 1280]]
# JPEG quality (1 = worst, 100 = best).
quality = 90

[output]
# Link published images into the render cache. Set to false to copy them,
# which makes the output directory self-contained.
symlink = true

[cache]
# Where rendered variants are kept between runs.
# Relative paths resolve against the directory of the shelf file.
dir = ".shelf-gal-cache"

# ---------------------------------------------------------------------------
# Colors - Light mode (prefers-color-scheme: light)
# ---------------------------------------------------------------------------
[colors.light]
background = "#ffffff"
text = "#111111"
text_muted = "#666666"    # Breadcrumbs, captions
border = "#e0e0e0"
link = "#333333"
link_hover = "#000000"

# ---------------------------------------------------------------------------
# Colors - Dark mode (prefers-color-scheme: dark)
# ---------------------------------------------------------------------------
[colors.dark]
background = "#0a0a0a"
text = "#eeeeee"
text_muted = "#999999"
border = "#333333"
link = "#cccccc"
link_hover = "#ffffff"

[processing]
# Maximum parallel render workers.
# Omit to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}

/// CSS custom properties for both color schemes.
pub fn generate_color_css(colors: &ColorConfig) -> String {
    let block = |scheme: &ColorScheme, indent: &str| {
        scheme
            .variables()
            .iter()
            .map(|(name, value)| format!("{indent}{name}: {value};\n"))
            .collect::<String>()
    };
    format!(
        ":root {{\n{}}}\n\n@media (prefers-color-scheme: dark) {{\n    :root {{\n{}    }}\n}}\n",
        block(&colors.light, "    "),
        block(&colors.dark, "        "),
    )
}
