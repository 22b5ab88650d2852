//! Static HTML pages.
//!
//! [`HtmlRenderer`] is the [`PageRenderer`] used by the command-line tool.
//!
//! ## Output Structure
//!
//! ```text
//! site/
//! ├── index.html          # Redirect to the root album page
//! ├── style.css           # Stock styles + configured colors
//! ├── albums/
//! │   ├── root.html       # One page per album, named by slug
//! │   ├── travel.html
//! │   └── travel/
//! │       ├── 1.html      # One page per image, 1-based within the album
//! │       └── 2.html
//! └── @images/
//!     ├── 2005/03/20050315_100000-128x128.jpg
//!     └── undated/scan-640x640-17.jpg
//! ```
//!
//! Page file names come from [`album_slug`], so any tag (`index`, `a/b`,
//! `..`) maps to a single file inside `albums/`. Every `href` and `src` is
//! percent-encoded per path segment.
//!
//! An image that belongs to several albums gets a page in each, but all of
//! them share the same published assets.
//!
//! ## HTML Generation
//!
//! Uses [maud](https://maud.lambda.xyz/) for compile-time HTML templating.
//! Album descriptions are Markdown, rendered with pulldown-cmark.

use crate::catalog::{Album, Catalog, Child, Image};
use crate::config::{self, SiteConfig};
use crate::generate::{GenerateError, PageRenderer, RunContext};
use crate::imgref::IMAGES_DIR;
use crate::paths::AlbumPath;
use maud::{DOCTYPE, Markup, PreEscaped, html};
use pulldown_cmark::{Parser, html as md_html};

const CSS_STATIC: &str = include_str!("../static/style.css");

/// Directory below the destination that holds album and image pages.
pub const ALBUMS_DIR: &str = "albums";

/// File name stem for an album's pages: the tag percent-encoded, dots
/// included. Distinct tags give distinct slugs and a slug is always one
/// plain path segment.
pub fn album_slug(tag: &str) -> String {
    urlencoding::encode(tag).replace('.', "%2E")
}

/// Percent-encode one URL path segment. `@` is legal in a segment and stays
/// readable.
fn url_segment(segment: &str) -> String {
    urlencoding::encode(segment).replace("%40", "@")
}

fn url_path(path: &str) -> String {
    path.split('/').map(url_segment).collect::<Vec<_>>().join("/")
}

/// Link to an album page from inside `albums/`.
fn album_href(tag: &str) -> String {
    format!("{}.html", url_segment(&album_slug(tag)))
}

pub struct HtmlRenderer {
    title: String,
    thumbnail: (u32, u32),
    display: (u32, u32),
    sizes: Vec<(u32, u32)>,
    limits: Vec<(u32, u32)>,
    css: String,
    pages_written: usize,
}

impl HtmlRenderer {
    pub fn new(config: &SiteConfig) -> Self {
        let [tw, th] = config.images.thumbnail;
        let [dw, dh] = config.images.display;
        Self {
            title: config.gallery.title.clone(),
            thumbnail: (tw, th),
            display: (dw, dh),
            sizes: config.images.sizes.iter().map(|[w, h]| (*w, *h)).collect(),
            limits: config.render_limits(),
            css: format!(
                "{}\n\n{}",
                config::generate_color_css(&config.colors),
                CSS_STATIC
            ),
            pages_written: 0,
        }
    }

    /// Album and image pages written so far.
    pub fn pages_written(&self) -> usize {
        self.pages_written
    }

    fn write_page(
        &mut self,
        run: &RunContext<'_>,
        name: &str,
        page: Markup,
    ) -> Result<(), GenerateError> {
        run.writer.write_file(name, &page.into_string())?;
        self.pages_written += 1;
        tracing::debug!(page = name, "wrote page");
        Ok(())
    }
}

impl PageRenderer for HtmlRenderer {
    fn pre_generation(
        &mut self,
        run: &mut RunContext<'_>,
        _root: &Album,
    ) -> Result<(), GenerateError> {
        run.writer.make_directory(IMAGES_DIR)?;
        run.writer.write_file("style.css", &self.css)?;
        Ok(())
    }

    fn generate_album(
        &mut self,
        run: &mut RunContext<'_>,
        album: &Album,
        sub_albums: &[&Album],
        images: &[&Image],
        paths: &[AlbumPath],
    ) -> Result<(), GenerateError> {
        let mut cards = Vec::with_capacity(sub_albums.len());
        for sub in sub_albums {
            let cover = match first_image(run.catalog, sub)? {
                Some(image) => Some(run.image_reference(image, self.thumbnail)?),
                None => None,
            };
            cards.push((*sub, cover));
        }
        let mut thumbs = Vec::with_capacity(images.len());
        for image in images {
            thumbs.push(run.image_reference(image, self.thumbnail)?);
        }

        let slug = album_slug(&album.tag);
        let content = html! {
            (site_header(&self.title, "../", breadcrumbs(run.catalog, paths, "", None)))
            main.album-page {
                h1 { (album.title()) }
                @if let Some(desc) = album.attribute("description") {
                    div.album-description { (markdown(desc)) }
                }
                @if !cards.is_empty() {
                    div.album-grid {
                        @for (sub, cover) in &cards {
                            a.album-card href=(album_href(&sub.tag)) {
                                @if let Some(c) = cover {
                                    img src={ "../" (url_path(&c.reference)) } width=(c.width) height=(c.height) alt=(sub.title());
                                } @else {
                                    div.placeholder {}
                                }
                                span { (sub.title()) }
                            }
                        }
                    }
                }
                @if !thumbs.is_empty() {
                    div.thumbnail-grid {
                        @for (idx, (image, thumb)) in images.iter().zip(&thumbs).enumerate() {
                            a.thumb-link href={ (url_segment(&slug)) "/" (idx + 1) ".html" } {
                                img src={ "../" (url_path(&thumb.reference)) } width=(thumb.width) height=(thumb.height)
                                    alt=(image_alt(image, idx)) loading="lazy";
                            }
                        }
                    }
                }
            }
        };

        let page = base_document(album.title(), "../", content);
        self.write_page(run, &format!("{ALBUMS_DIR}/{slug}.html"), page)
    }

    fn generate_image(
        &mut self,
        run: &mut RunContext<'_>,
        album: &Album,
        image: &Image,
        images: &[&Image],
        index: usize,
        paths: &[AlbumPath],
    ) -> Result<(), GenerateError> {
        let shown = run.image_reference(image, self.display)?;
        let mut variants = Vec::with_capacity(self.sizes.len());
        for limit in &self.sizes {
            variants.push(run.image_reference(image, *limit)?);
        }

        let album_page = format!("../{}", album_href(&album.tag));
        let prev = if index > 0 {
            format!("{}.html", index)
        } else {
            album_page.clone()
        };
        let next = if index + 1 < images.len() {
            format!("{}.html", index + 2)
        } else {
            album_page.clone()
        };
        let position = format!("{} / {}", index + 1, images.len());

        let content = html! {
            (site_header(&self.title, "../../", breadcrumbs(run.catalog, paths, "../", Some(&position))))
            main.image-page {
                nav.image-nav {
                    a.prev href=(prev) { "‹ Previous" }
                    a.up href=(album_page) { (album.title()) }
                    a.next href=(next) { "Next ›" }
                }
                figure {
                    img src={ "../../" (url_path(&shown.reference)) } width=(shown.width) height=(shown.height)
                        alt=(image_alt(image, index));
                }
                @if !variants.is_empty() {
                    p.sizes {
                        "Sizes: "
                        @for (i, v) in variants.iter().enumerate() {
                            @if i > 0 { " · " }
                            a href={ "../../" (url_path(&v.reference)) } { (v.width) "×" (v.height) }
                        }
                    }
                }
                @if !image.attributes.is_empty() {
                    table.attributes {
                        @for (name, value) in &image.attributes {
                            tr { th { (name) } td { (value) } }
                        }
                    }
                }
            }
        };

        let title = format!("{} - {}", album.title(), index + 1);
        let page = base_document(&title, "../../", content);
        let name = format!("{ALBUMS_DIR}/{}/{}.html", album_slug(&album.tag), index + 1);
        self.write_page(run, &name, page)
    }

    fn post_generation(
        &mut self,
        run: &mut RunContext<'_>,
        root: &Album,
    ) -> Result<(), GenerateError> {
        let target = format!("{ALBUMS_DIR}/{}", album_href(&root.tag));
        let page = html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="UTF-8";
                    meta http-equiv="refresh" content={ "0; url=" (target) };
                    title { (self.title) }
                }
                body {
                    a href=(target) { (root.title()) }
                }
            }
        };
        run.writer.write_file("index.html", &page.into_string())?;
        Ok(())
    }

    fn asset_limits(&self) -> Vec<(u32, u32)> {
        self.limits.clone()
    }
}

fn first_image<'c>(catalog: &'c Catalog, album: &Album) -> Result<Option<&'c Image>, GenerateError> {
    match catalog.children(album.id).into_iter().find(|c| !c.is_album()) {
        Some(Child::Image(id)) => Ok(Some(catalog.image(id)?)),
        _ => Ok(None),
    }
}

fn image_alt(image: &Image, index: usize) -> String {
    image
        .attribute("title")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Image {}", index + 1))
}

/// Render Markdown to HTML.
fn markdown(source: &str) -> PreEscaped<String> {
    let mut out = String::new();
    md_html::push_html(&mut out, Parser::new(source));
    PreEscaped(out)
}

fn base_document(title: &str, prefix: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                link rel="stylesheet" href={ (prefix) "style.css" };
            }
            body {
                (content)
            }
        }
    }
}

fn site_header(title: &str, prefix: &str, crumbs: Markup) -> Markup {
    html! {
        header.site-header {
            a.site-title href={ (prefix) "index.html" } { (title) }
            (crumbs)
        }
    }
}

/// One breadcrumb line per path, sorted by the tags along the path.
///
/// Without `tail` the last album is the current page and is not linked.
/// With `tail` every album is linked and `tail` closes the line.
fn breadcrumbs(catalog: &Catalog, paths: &[AlbumPath], prefix: &str, tail: Option<&str>) -> Markup {
    let mut trails: Vec<Vec<&Album>> = paths
        .iter()
        .map(|p| p.albums().iter().map(|id| catalog.album(*id)).collect())
        .collect();
    trails.sort_by(|a, b| {
        a.iter()
            .map(|x| x.tag.as_str())
            .cmp(b.iter().map(|x| x.tag.as_str()))
    });

    html! {
        ul.breadcrumbs {
            @for trail in &trails {
                li {
                    @for (i, album) in trail.iter().enumerate() {
                        @if i > 0 { " › " }
                        @if tail.is_none() && i + 1 == trail.len() {
                            span.current { (album.title()) }
                        } @else {
                            a href={ (prefix) (album_href(&album.tag)) } { (album.title()) }
                        }
                    }
                    @if let Some(t) = tail {
                        " › " span.current { (t) }
                    }
                }
            }
        }
    }
}
