use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use pfb::{Grid, GridGeometry};
use predicates::prelude::*;

fn write_synthetic_pfb(path: &std::path::Path, extent: (i32, i32, i32), seed: f64) {
    let geometry =
        GridGeometry::new((0.0, 0.0, 0.0), extent, (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
    let mut buffer = Vec::with_capacity(geometry.num_cells());
    for z in 0..extent.2 {
        for y in 0..extent.1 {
            for x in 0..extent.0 {
                buffer.push(seed + f64::from(x + y * 100 + z * 10000));
            }
        }
    }
    let grid = Grid::from_buffer(geometry, buffer).unwrap();
    grid.write_file(path).unwrap();
}

#[test]
fn diff_reports_no_differences_for_identical_files() {
    let dir = TempDir::new().unwrap();
    let a = dir.child("a.pfb");
    let b = dir.child("b.pfb");
    write_synthetic_pfb(a.path(), (4, 4, 2), 0.0);
    write_synthetic_pfb(b.path(), (4, 4, 2), 0.0);

    Command::cargo_bin("pfb")
        .unwrap()
        .args(["diff", a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("no differences"));
}

#[test]
fn diff_reports_first_data_mismatch() {
    let dir = TempDir::new().unwrap();
    let a = dir.child("a.pfb");
    let b = dir.child("b.pfb");
    write_synthetic_pfb(a.path(), (4, 4, 2), 0.0);
    write_synthetic_pfb(b.path(), (4, 4, 2), 1.0);

    Command::cargo_bin("pfb")
        .unwrap()
        .args(["diff", a.path().to_str().unwrap(), b.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("data mismatch at (z=0, y=0, x=0)"));
}

#[test]
fn clip_extracts_expected_sub_rectangle() {
    let dir = TempDir::new().unwrap();
    let source = dir.child("source.pfb");
    write_synthetic_pfb(source.path(), (10, 9, 3), 0.0);

    let clipped = dir.child("clip.pfb");
    Command::cargo_bin("pfb")
        .unwrap()
        .args([
            "clip",
            source.path().to_str().unwrap(),
            "--x0",
            "4",
            "--y0",
            "3",
            "--nx",
            "3",
            "--ny",
            "2",
            clipped.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    let full = Grid::load_data(source.path()).unwrap();
    let clip = Grid::load_data(clipped.path()).unwrap();
    assert_eq!(clip.geometry().extent(), (3, 2, 3));
    for z in 0..3 {
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(
                    clip.at(x, y, z).unwrap(),
                    full.at(x + 4, y + 3, z).unwrap()
                );
            }
        }
    }
}
