use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use pfb::Grid;
use prettytable::{cell, row};

use super::helpers;

/// Print the P*Q*R subgrid table: origin, extent, refinement, and byte offset.
#[derive(Parser)]
pub struct Opts {
    /// Path to the PFB file.
    input: PathBuf,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        let grid = Grid::load_pqr(&self.input)?;
        let table = grid
            .subgrids()
            .expect("load_pqr always populates the subgrid table");

        let mut output = helpers::create_table();
        output.set_titles(row![c => "origin", "extent", "refinement", "byte offset"]);

        for descriptor in table.descriptors() {
            let row = output.add_empty_row();
            row.add_cell(cell!(l->&format!("{:?}", descriptor.origin)));
            row.add_cell(cell!(l->&format!("{:?}", descriptor.extent)));
            row.add_cell(cell!(l->&format!("{:?}", descriptor.refinement)));
            row.add_cell(cell!(r->&descriptor.byte_offset));
        }

        output.printstd();
        Ok(())
    }
}
