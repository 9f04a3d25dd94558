use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pfb_cli::{Opts, SubCommand};

fn main() -> ExitCode {
    env_logger::init();

    let opts = Opts::parse();
    let result: Result<ExitCode> = match &opts.subcommand {
        SubCommand::Header(opts) => opts.run().map(|()| ExitCode::SUCCESS),
        SubCommand::Subgrids(opts) => opts.run().map(|()| ExitCode::SUCCESS),
        SubCommand::Distribute(opts) => opts.run().map(|()| ExitCode::SUCCESS),
        SubCommand::Clip(opts) => opts.run().map(|()| ExitCode::SUCCESS),
        SubCommand::Diff(opts) => opts.run(),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
