use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use super::helpers;

/// Re-partition a PFB file into P*Q*R subgrids, emitting `<output>` and `<output>.dist`.
#[derive(Parser)]
pub struct Opts {
    /// Path to the input PFB file.
    input: PathBuf,
    /// New partition counts, comma-separated: `P,Q,R`.
    #[arg(long, value_delimiter = ',', num_args = 3)]
    pqr: Vec<i32>,
    /// Path of the distributed PFB file.
    output: PathBuf,
}

impl Opts {
    pub fn run(&self) -> Result<()> {
        let &[p, q, r] = &self.pqr[..] else {
            anyhow::bail!("--pqr requires exactly three comma-separated values");
        };

        let grid = helpers::read_grid(&self.input)?;
        grid.dist_file(p, q, r, &self.output).context(format!(
            "unable to distribute '{}' into '{}'",
            self.input.display(),
            self.output.display()
        ))
    }
}
