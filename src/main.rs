use clap::{Parser, Subcommand};
use shelf_gal::catalog::{AlbumId, Catalog, CatalogError};
use shelf_gal::generate::GenerationPipeline;
use shelf_gal::html::HtmlRenderer;
use shelf_gal::imaging::{Quality, RustRenderer};
use shelf_gal::paths::resolve_paths;
use shelf_gal::writer::PlacementMode;
use shelf_gal::{cache, config, output, register};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shelf-gal")]
#[command(version)]
#[command(about = "Static photo gallery generator for album graphs")]
#[command(long_about = "\
Static photo gallery generator for album graphs

Albums and images are listed in a shelf file. An album may belong to several
parent albums and may even contain its own ancestors; every route from the
root album becomes a breadcrumb.

Shelf file:

  root = \"root\"

  [[album]]
  tag = \"root\"
  children = [\"travel\", 1]     # strings are album tags, integers image ids

  [[album]]
  tag = \"all\"
  type = \"allalbums\"           # or allimages, orphans

  [[image]]
  id = 1
  location = \"photos/dawn.jpg\"
  [image.attributes]
  captured = \"2005-03-15 10:00:00\"

Run 'shelf-gal register photos/' to create a shelf from a directory tree and
'shelf-gal gen-config' to generate a documented config.toml.")]
struct Cli {
    /// Shelf file listing albums and images
    #[arg(long, default_value = "shelf.toml", global = true)]
    shelf: PathBuf,

    /// Config file (optional)
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the static site
    Generate {
        /// Root album tag (defaults to the shelf's root)
        #[arg(long)]
        root: Option<String>,
        /// Output directory
        #[arg(long, default_value = "site")]
        output: PathBuf,
        /// Only generate these albums, their descendants and their ancestors
        albums: Vec<String>,
    },
    /// Print every breadcrumb path to every reachable album
    Paths {
        /// Root album tag (defaults to the shelf's root)
        #[arg(long)]
        root: Option<String>,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate the shelf and config without generating
    Check,
    /// Create a shelf file from a directory of photos
    Register {
        /// Directory to scan
        dir: PathBuf,
        /// Tag of the root album
        #[arg(long, default_value = "root")]
        root: String,
    },
    /// Remove render cache entries no catalog image uses
    CleanCache,
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Generate {
            root,
            output: dest,
            albums,
        } => {
            let site_config = config::load_config(&cli.config)?;
            init_thread_pool(&site_config.processing);
            let catalog = Catalog::load(&cli.shelf)?;
            let root = resolve_root(&catalog, root.as_deref())?;
            let subset = albums
                .iter()
                .map(|tag| catalog.album_by_tag(tag))
                .collect::<Result<Vec<AlbumId>, _>>()?;

            let renderer = RustRenderer::new(
                &cache_dir(&cli.shelf, &site_config),
                Quality::new(site_config.images.quality),
            )?;
            let placement = if site_config.output.symlink {
                PlacementMode::Symlink
            } else {
                PlacementMode::Copy
            };

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_generate_event(&event);
                }
            });
            let pages = HtmlRenderer::new(&site_config);
            let result = GenerationPipeline::new(&catalog, &renderer, pages)
                .with_placement(placement)
                .with_events(tx)
                .generate(root, &subset, &dest);
            // The pipeline (and its sender) is dropped here, ending the printer loop.
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            result?;
            for line in output::format_cache_stats(&renderer.stats()) {
                println!("{}", line);
            }
        }
        Command::Paths { root, json } => {
            let catalog = Catalog::load(&cli.shelf)?;
            let root = resolve_root(&catalog, root.as_deref())?;
            let paths = resolve_paths(&catalog, root);
            if json {
                let value = output::format_paths_json(&catalog, &paths);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                output::print_paths_output(&catalog, &paths);
            }
        }
        Command::Check => {
            config::load_config(&cli.config)?;
            let catalog = Catalog::load(&cli.shelf)?;
            let paths = resolve_paths(&catalog, catalog.root());
            output::print_check_output(&catalog, &paths);
        }
        Command::Register { dir, root } => {
            let summary = register::register(&dir, &root, &cli.shelf)?;
            output::print_register_output(&summary);
        }
        Command::CleanCache => {
            let site_config = config::load_config(&cli.config)?;
            let catalog = Catalog::load(&cli.shelf)?;
            let keep = cache::expected_cache_names(&catalog, &site_config.render_limits());
            let removed = cache::prune(&cache_dir(&cli.shelf, &site_config), &keep)?;
            output::print_clean_cache_output(removed, keep.len());
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `RUST_LOG` wins when set; otherwise warnings, or debug with `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "shelf_gal=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; config can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn resolve_root(catalog: &Catalog, tag: Option<&str>) -> Result<AlbumId, CatalogError> {
    match tag {
        Some(tag) => catalog.album_by_tag(tag),
        None => Ok(catalog.root()),
    }
}

/// Render cache location; relative config paths resolve against the shelf.
fn cache_dir(shelf: &Path, site_config: &config::SiteConfig) -> PathBuf {
    let dir = Path::new(&site_config.cache.dir);
    if dir.is_absolute() {
        return dir.to_path_buf();
    }
    shelf
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(dir)
}
