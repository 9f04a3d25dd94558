use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use pfb::{Grid, GridGeometry};
use predicates::prelude::*;

fn write_synthetic_pfb(path: &std::path::Path, extent: (i32, i32, i32)) {
    let geometry =
        GridGeometry::new((0.0, 0.0, 0.0), extent, (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
    let mut buffer = Vec::with_capacity(geometry.num_cells());
    for z in 0..extent.2 {
        for y in 0..extent.1 {
            for x in 0..extent.0 {
                buffer.push(f64::from(x + y * 100 + z * 10000));
            }
        }
    }
    let grid = Grid::from_buffer(geometry, buffer).unwrap();
    grid.write_file(path).unwrap();
}

#[test]
fn distribute_then_header_reports_new_partition() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("source.pfb");
    write_synthetic_pfb(input.path(), (10, 10, 4));

    let output = dir.child("distributed.pfb");
    Command::cargo_bin("pfb")
        .unwrap()
        .args([
            "distribute",
            input.path().to_str().unwrap(),
            "--pqr",
            "2,2,1",
            output.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    output.assert(predicate::path::exists());
    dir.child("distributed.pfb.dist")
        .assert(predicate::path::exists());

    Command::cargo_bin("pfb")
        .unwrap()
        .args(["header", output.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("partition: (2, 2, 1)"));
}

#[test]
fn dist_sidecar_has_pqr_plus_one_lines() {
    let dir = TempDir::new().unwrap();
    let input = dir.child("source.pfb");
    write_synthetic_pfb(input.path(), (8, 8, 2));

    let output = dir.child("distributed.pfb");
    Command::cargo_bin("pfb")
        .unwrap()
        .args([
            "distribute",
            input.path().to_str().unwrap(),
            "--pqr",
            "2,2,1",
            output.path().to_str().unwrap(),
        ])
        .assert()
        .success();

    let sidecar = std::fs::read_to_string(dir.child("distributed.pfb.dist").path()).unwrap();
    assert_eq!(sidecar.lines().count(), 2 * 2 * 1 + 1);
    assert_eq!(sidecar.lines().next().unwrap(), "0");
}
