//! `cargo xtask` applet: repository automation that doesn't belong in the library or CLI
//! crates themselves. Currently just man-page generation; invoke with `cargo xtask man`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use pfb_cli::Opts;

#[derive(Parser)]
enum Task {
    /// Render the `pfb` CLI's man page from its `clap` definition into `target/man/pfb.1`.
    Man {
        /// Directory to write the rendered man page into.
        #[arg(long, default_value = "target/man")]
        out_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    match Task::parse() {
        Task::Man { out_dir } => render_man_page(&out_dir),
    }
}

fn render_man_page(out_dir: &Path) -> Result<()> {
    let command = Opts::command();
    let man = clap_mangen::Man::new(command);

    let mut rendered = Vec::new();
    man.render(&mut rendered)?;

    fs::create_dir_all(out_dir)
        .with_context(|| format!("unable to create '{}'", out_dir.display()))?;
    let path = out_dir.join("pfb.1");
    fs::write(&path, rendered).with_context(|| format!("unable to write '{}'", path.display()))?;

    println!("wrote {}", path.display());
    Ok(())
}
