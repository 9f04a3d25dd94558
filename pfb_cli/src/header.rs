use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use super::helpers;

/// Print origin, extent, spacing, partition, and subgrid count.
#[derive(Parser)]
pub struct Opts {
    /// Path to the PFB file.
    input: PathBuf,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        let grid = helpers::read_header(&self.input)?;
        let geometry = grid.geometry();

        let (ox, oy, oz) = geometry.origin();
        let (nx, ny, nz) = geometry.extent();
        let (dx, dy, dz) = geometry.spacing();
        let (p, q, r) = geometry.partition();

        println!("origin:    ({ox}, {oy}, {oz})");
        println!("extent:    ({nx}, {ny}, {nz})");
        println!("spacing:   ({dx}, {dy}, {dz})");
        println!("partition: ({p}, {q}, {r})");
        println!("subgrids:  {}", geometry.num_subgrids());

        Ok(())
    }
}
