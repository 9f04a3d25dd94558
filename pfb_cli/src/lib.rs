//! Library half of the `pfb` command line wrapper.
//!
//! Split out from the `pfb` binary so `xtask` can generate man pages from the same `clap`
//! definition the binary parses at runtime, without re-declaring the subcommand tree.

pub mod clip;
pub mod diff;
pub mod distribute;
pub mod header;
pub mod helpers;
pub mod subgrids;

use clap::Parser;

#[derive(Parser)]
pub enum SubCommand {
    Header(header::Opts),
    Subgrids(subgrids::Opts),
    Distribute(distribute::Opts),
    Clip(clip::Opts),
    Diff(diff::Opts),
}

/// Inspect, distribute, clip, and diff ParFlow Binary (PFB) files.
#[derive(Parser)]
#[command(name = "pfb", version)]
pub struct Opts {
    #[command(subcommand)]
    pub subcommand: SubCommand,
}
