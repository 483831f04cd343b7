//! # STRATA Renderer
//!
//! Generates a seeded fractal height-field tile by tile and writes it out
//! as an image.
//!
//! ```bash
//! # Stock 500x500 world, random seed
//! ./strata
//!
//! # Fixed seed, four generation threads, two-color output
//! ./strata --seed 42 --workers 4 --palette binary -o map.png
//!
//! # Show walk progress from the library
//! RUST_LOG=strata_procedural=info ./strata
//!
//! # Everything from a config file
//! ./strata --config world.toml
//! ```

mod canvas;
mod cli;

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use strata_procedural::{ProceduralError, WorldConfig};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::cli::Args;

/// Everything that can stop a run.
#[derive(Debug, Error)]
enum CliError {
    /// Bad configuration or parameters.
    #[error(transparent)]
    Procedural(#[from] ProceduralError),

    /// File could not be read or written.
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No seed given and the OS could not supply one.
    #[error("no entropy for a random seed: {0}")]
    Entropy(String),

    /// World too large to hold as one image.
    #[error("a {width} x {height} canvas does not fit in memory")]
    CanvasTooLarge { width: u32, height: u32 },

    /// Image could not be encoded or written.
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Log level when `RUST_LOG` is unset or unparsable.
const DEFAULT_LOG_FILTER: &str = "warn";

fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn main() {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(&args) {
        eprintln!("   ✗ FATAL: {e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            WorldConfig::from_toml_str(&text)?
        }
        None => WorldConfig::default(),
    };
    args.apply(&mut config);

    let entropy = if config.seed.is_some() {
        0
    } else {
        getrandom::u64().map_err(|e| CliError::Entropy(e.to_string()))?
    };
    let seed = config.resolve_seed(entropy);

    let palette = config.palette()?;
    let walker = config.build_walker(seed)?;
    let world = walker.world();

    println!("═══════════════════════════════════════════════════════════════════");
    println!("                    STRATA v{}", env!("CARGO_PKG_VERSION"));
    println!("═══════════════════════════════════════════════════════════════════");
    println!();
    println!("  Seed:     {}", seed.value());
    println!("  World:    {} x {}", world.width(), world.height());
    println!("  Chunks:   {} ({} x {} cells)", walker.tile_count(), walker.chunk_size(), walker.chunk_size());
    println!("  Workers:  {}", walker.workers());
    println!();

    let mut heightmap = canvas::blank(world.width(), world.height())?;
    let start = Instant::now();
    let summary = walker.walk(|chunk| canvas::draw_chunk(&mut heightmap, &chunk, &palette))?;
    println!("   ✓ {} tiles generated in {:?}", summary.delivered, start.elapsed());

    heightmap.save(&args.output)?;
    println!("   ✓ Wrote {}", args.output.display());

    Ok(())
}
