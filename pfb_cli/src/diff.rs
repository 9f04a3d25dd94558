use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use pfb::Difference;

use super::helpers;

/// Compare two PFB files and print the first divergence, if any.
#[derive(Parser)]
pub struct Opts {
    a: PathBuf,
    b: PathBuf,
}

impl Opts {
    pub fn run(&self) -> Result<ExitCode> {
        let a = helpers::read_grid(&self.a)?;
        let b = helpers::read_grid(&self.b)?;

        match a.compare(&b) {
            Difference::None => {
                println!("no differences");
                Ok(ExitCode::SUCCESS)
            }
            other => {
                println!("{}", describe(other));
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn describe(difference: Difference) -> String {
    match difference {
        Difference::None => "no differences".to_string(),
        Difference::X => "origin x differs".to_string(),
        Difference::Y => "origin y differs".to_string(),
        Difference::Z => "origin z differs".to_string(),
        Difference::Dx => "spacing dx differs".to_string(),
        Difference::Dy => "spacing dy differs".to_string(),
        Difference::Dz => "spacing dz differs".to_string(),
        Difference::Nx => "extent nx differs".to_string(),
        Difference::Ny => "extent ny differs".to_string(),
        Difference::Nz => "extent nz differs".to_string(),
        Difference::P => "partition P differs".to_string(),
        Difference::Q => "partition Q differs".to_string(),
        Difference::R => "partition R differs".to_string(),
        Difference::Data { z, y, x } => format!("first data mismatch at (z={z}, y={y}, x={x})"),
    }
}
