use std::path::Path;

use anyhow::{Context, Result};
use pfb::Grid;

/// Opens and fully reads a PFB file, wrapping the underlying error with the path that
/// failed so a user sees which file was at fault.
pub fn read_grid(input: &Path) -> Result<Grid> {
    Grid::load_data(input).context(format!("unable to read '{}'", input.display()))
}

/// Reads a PFB file's header and subgrid table, without allocating cell storage. Walking the
/// subgrid headers (rather than stopping at the file header) is what lets the caller report
/// the file's true `(P, Q, R)` partition, since the file header itself does not store it.
pub fn read_header(input: &Path) -> Result<Grid> {
    Grid::load_pqr(input).context(format!("unable to read header of '{}'", input.display()))
}

/// Writes `grid` to `output`, refusing to silently overwrite an existing file.
pub fn write_grid(output: &Path, grid: &Grid) -> Result<()> {
    if output.exists() {
        anyhow::bail!("refusing to overwrite existing file '{}'", output.display());
    }
    grid.write_file(output)
        .context(format!("unable to write '{}'", output.display()))
}

pub fn create_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();
    table.set_format(
        prettytable::format::FormatBuilder::new()
            .column_separator(' ')
            .separator(
                prettytable::format::LinePosition::Title,
                prettytable::format::LineSeparator::new('-', '+', ' ', ' '),
            )
            .build(),
    );
    table
}
