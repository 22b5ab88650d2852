//! End-to-end generation: real shelf file, real JPEGs, real renderer.

use image::RgbImage;
use shelf_gal::catalog::Catalog;
use shelf_gal::config::{SiteConfig, parse_config};
use shelf_gal::generate::{GenerateEvent, GenerationPipeline};
use shelf_gal::html::HtmlRenderer;
use shelf_gal::imaging::{Quality, RustRenderer};
use shelf_gal::paths::resolve_paths;
use shelf_gal::writer::PlacementMode;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SHELF: &str = r#"
root = "root"

[[album]]
tag = "root"
children = ["travel", "family", "all"]
[album.attributes]
title = "Everything"

[[album]]
tag = "travel"
children = ["summer", 1, 2]
[album.attributes]
description = "Trips *abroad*"

[[album]]
tag = "family"
children = ["summer", "root"]

[[album]]
tag = "summer"
children = [3, 1]

[[album]]
tag = "all"
type = "allalbums"

[[album]]
tag = "drafts"
children = [4]

[[image]]
id = 1
location = "photos/dawn.jpg"
[image.attributes]
captured = "2005-03-15 10:00:00"

[[image]]
id = 2
location = "photos/sideways.jpg"
[image.attributes]
captured = "2005-03-15 10:00:00"
orientation = "left"

[[image]]
id = 3
location = "photos/beach.png"

[[image]]
id = 4
location = "photos/unused.jpg"
"#;

fn write_image(path: &Path, width: u32, height: u32) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
    })
    .save(path)
    .unwrap();
}

fn setup() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write_image(&tmp.path().join("photos/dawn.jpg"), 400, 300);
    write_image(&tmp.path().join("photos/sideways.jpg"), 300, 200);
    write_image(&tmp.path().join("photos/beach.png"), 60, 40);
    write_image(&tmp.path().join("photos/unused.jpg"), 10, 10);
    fs::write(tmp.path().join("shelf.toml"), SHELF).unwrap();
    tmp
}

fn small_config() -> SiteConfig {
    parse_config(
        r#"
[gallery]
title = "Test gallery"

[images]
thumbnail = [50, 50]
display = [200, 200]
sizes = [[200, 200], [300, 300]]
quality = 80
"#,
    )
    .unwrap()
}

fn generate(
    tmp: &TempDir,
    out: &str,
    placement: PlacementMode,
    subset: &[&str],
) -> Vec<GenerateEvent> {
    let config = small_config();
    let catalog = Catalog::load(&tmp.path().join("shelf.toml")).unwrap();
    let renderer = RustRenderer::new(&tmp.path().join("cache"), Quality::new(80)).unwrap();
    let subset: Vec<_> = subset
        .iter()
        .map(|t| catalog.album_by_tag(t).unwrap())
        .collect();
    let (tx, rx) = std::sync::mpsc::channel();
    GenerationPipeline::new(&catalog, &renderer, HtmlRenderer::new(&config))
        .with_placement(placement)
        .with_events(tx)
        .generate(catalog.root(), &subset, &tmp.path().join(out))
        .unwrap();
    rx.try_iter().collect()
}

/// Dimensions from file contents; published names keep the original's
/// extension, which need not match the encoded format.
fn dimensions(path: &Path) -> (u32, u32) {
    image::ImageReader::open(path)
        .unwrap()
        .with_guessed_format()
        .unwrap()
        .into_dimensions()
        .unwrap()
}

fn started_albums(events: &[GenerateEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            GenerateEvent::AlbumStarted { tag, .. } => Some(tag.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn full_site_from_cyclic_shelf() {
    let tmp = setup();
    let events = generate(&tmp, "site", PlacementMode::Symlink, &[]);
    let out = tmp.path().join("site");

    // Every reachable album, sorted by tag. drafts is only reachable
    // through the allalbums album.
    assert_eq!(
        started_albums(&events),
        vec!["all", "drafts", "family", "root", "summer", "travel"]
    );
    assert!(out.join("albums/drafts/1.html").is_file());

    for page in [
        "index.html",
        "style.css",
        "albums/all.html",
        "albums/root.html",
        "albums/travel/1.html",
        "albums/travel/2.html",
        "albums/summer/1.html",
        "albums/summer/2.html",
    ] {
        assert!(out.join(page).is_file(), "missing {page}");
    }

    // Same-second captures: the second claimant gets a suffix
    assert!(out.join("@images/2005/03/20050315_100000-200x200.jpg").exists());
    assert!(out.join("@images/2005/03/20050315_100000-200x200-1.jpg").exists());
    assert!(out.join("@images/undated/beach-50x50-3.png").exists());

    // Symlinks point into the render cache
    #[cfg(unix)]
    {
        let link = out.join("@images/undated/beach-50x50-3.png");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert!(fs::read_link(&link).unwrap().starts_with(fs::canonicalize(tmp.path().join("cache")).unwrap()));
    }
}

#[test]
fn summer_has_a_breadcrumb_per_route() {
    let tmp = setup();
    generate(&tmp, "site", PlacementMode::Copy, &[]);
    let html = fs::read_to_string(tmp.path().join("site/albums/summer.html")).unwrap();

    // root › family › summer, root › travel › summer, root › all › summer, ...
    assert!(html.matches("<li>").count() >= 3);
    assert!(html.contains(r#"href="family.html""#));
    assert!(html.contains(r#"href="travel.html""#));
    assert!(html.contains(r#"href="all.html""#));
}

#[test]
fn rendered_sizes_respect_limits_and_orientation() {
    let tmp = setup();
    generate(&tmp, "site", PlacementMode::Copy, &[]);
    let images = tmp.path().join("site/@images");

    // 400x300 into 200x200
    let dawn = images.join("2005/03/20050315_100000-200x200.jpg");
    assert_eq!(dimensions(&dawn), (200, 150));

    // 300x200 turned a quarter: 200x300, then into 200x200
    let sideways = images.join("2005/03/20050315_100000-200x200-1.jpg");
    assert_eq!(dimensions(&sideways), (133, 200));

    // 60x40 never upscaled
    let beach = images.join("undated/beach-300x300-3.png");
    assert_eq!(dimensions(&beach), (60, 40));

    // Copy placement leaves no links behind
    assert!(!fs::symlink_metadata(&dawn).unwrap().file_type().is_symlink());
}

#[test]
fn second_run_reuses_cache_and_names() {
    let tmp = setup();
    generate(&tmp, "first", PlacementMode::Copy, &[]);
    let cached: Vec<_> = fs::read_dir(tmp.path().join("cache")).unwrap().collect();

    generate(&tmp, "second", PlacementMode::Copy, &[]);
    let again: Vec<_> = fs::read_dir(tmp.path().join("cache")).unwrap().collect();
    assert_eq!(cached.len(), again.len());

    let first = fs::read_to_string(tmp.path().join("first/albums/travel/2.html")).unwrap();
    let second = fs::read_to_string(tmp.path().join("second/albums/travel/2.html")).unwrap();
    assert_eq!(first, second);
}

#[test]
fn subset_generates_descendants_and_ancestors_only() {
    let tmp = setup();
    let events = generate(&tmp, "site", PlacementMode::Copy, &["summer"]);

    // summer's ancestors: travel, family, root (via family → root cycle too)
    assert_eq!(
        started_albums(&events),
        vec!["family", "root", "summer", "travel"]
    );
    assert!(!tmp.path().join("site/albums/all.html").exists());
}

#[test]
fn paths_terminate_on_cycles() {
    let tmp = setup();
    let catalog = Catalog::load(&tmp.path().join("shelf.toml")).unwrap();
    let paths = resolve_paths(&catalog, catalog.root());

    for (album, routes) in &paths {
        for route in routes {
            let mut seen = std::collections::HashSet::new();
            assert!(route.albums().iter().all(|a| seen.insert(*a)));
            assert_eq!(route.target(), *album);
        }
    }
    let summer = catalog.album_by_tag("summer").unwrap();
    assert!(paths[&summer].len() >= 3);
}
