use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pfb::Grid;

use super::helpers;

/// Read a rectangular sub-region (spanning the full z-range) and write it as a new PFB file.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input PFB file.
    input: PathBuf,
    /// Lower x bound of the clip rectangle.
    #[arg(long)]
    x0: i32,
    /// Lower y bound of the clip rectangle.
    #[arg(long)]
    y0: i32,
    /// Width of the clip rectangle along x.
    #[arg(long)]
    nx: i32,
    /// Height of the clip rectangle along y.
    #[arg(long)]
    ny: i32,
    /// Path of the clipped PFB file.
    output: PathBuf,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        let clip = Grid::load_clip_of_data(&self.input, self.x0, self.y0, self.nx, self.ny)?;
        helpers::write_grid(&self.output, &clip)
    }
}
