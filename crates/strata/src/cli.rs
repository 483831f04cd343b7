//! Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use strata_procedural::{PaletteConfig, WorldConfig};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "Chunked fractal Perlin height-field renderer", long_about = None)]
pub struct Args {
    /// TOML configuration file (flags below override it)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// World seed (random in 10..=10000 when omitted)
    #[arg(long)]
    pub seed: Option<u64>,

    /// World width in cells
    #[arg(long, value_name = "CELLS")]
    pub width: Option<u32>,

    /// World height in cells
    #[arg(long, value_name = "CELLS")]
    pub height: Option<u32>,

    /// Tile side length in cells
    #[arg(long, value_name = "CELLS")]
    pub chunk_size: Option<u32>,

    /// Generation threads
    #[arg(long)]
    pub workers: Option<usize>,

    /// Value-to-color banding
    #[arg(long, value_enum)]
    pub palette: Option<PaletteArg>,

    /// Output image; the extension picks the format (png, ppm, bmp, ...)
    #[arg(short, long, value_name = "PATH", default_value = "heightmap.png")]
    pub output: PathBuf,
}

/// Palette presets selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PaletteArg {
    /// Gray ramp with black highlands
    Terrain,
    /// White below 45, black above
    Binary,
}

impl Args {
    /// Overlays the flags that were given onto `config`.
    pub fn apply(&self, config: &mut WorldConfig) {
        if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        if let Some(width) = self.width {
            config.world.width = width;
        }
        if let Some(height) = self.height {
            config.world.height = height;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.world.chunk_size = chunk_size;
        }
        if let Some(workers) = self.workers {
            config.generation.workers = workers;
        }
        match self.palette {
            Some(PaletteArg::Terrain) => config.palette = PaletteConfig::Terrain,
            Some(PaletteArg::Binary) => {
                config.palette = PaletteConfig::Binary {
                    threshold: strata_procedural::ColorBanding::DEFAULT_THRESHOLD,
                };
            }
            None => {}
        }
    }
}
