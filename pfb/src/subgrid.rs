//! Subgrid decomposition: the plan of P·Q·R rectangular tiles that partition a
//! [`GridGeometry`], and the table of their on-disk byte offsets.

use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};
use crate::geometry::{partition_lengths, partition_origins, GridGeometry};
use crate::header::{read_subgrid_header, FILE_HEADER_BYTES, SUBGRID_HEADER_BYTES};

/// One tile of the global grid: its logical origin and extent, its (currently unexercised)
/// refinement levels, and the byte offset at which its header begins in the owning file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubgridDescriptor {
    /// Logical `(ix, iy, iz)` origin within the global grid.
    pub origin: (i32, i32, i32),
    /// Extents `(snx, sny, snz)`.
    pub extent: (i32, i32, i32),
    /// Refinement levels `(rx, ry, rz)`; always zero when freshly planned, preserved
    /// verbatim when read from a file.
    pub refinement: (i32, i32, i32),
    /// Byte offset of this subgrid's header within the file. Zero until placed into a
    /// [`SubgridTable`].
    pub byte_offset: u64,
}

impl SubgridDescriptor {
    /// Number of cells this subgrid covers.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.extent.0 as usize * self.extent.1 as usize * self.extent.2 as usize
    }

    /// Byte offset of the first cell value, i.e. just past this subgrid's own header.
    #[must_use]
    pub fn data_offset(&self) -> u64 {
        self.byte_offset + SUBGRID_HEADER_BYTES
    }

    /// Total on-disk size of this subgrid: its header plus its cell payload.
    #[must_use]
    pub fn byte_len(&self) -> u64 {
        SUBGRID_HEADER_BYTES + 8 * self.num_cells() as u64
    }
}

/// The full set of subgrid descriptors for a grid, in canonical order (z-partition slowest,
/// then y-partition, then x-partition fastest).
#[derive(Debug, Clone, PartialEq)]
pub struct SubgridTable {
    descriptors: Vec<SubgridDescriptor>,
}

impl SubgridTable {
    /// Plans a fresh decomposition of `geometry` into `P * Q * R` subgrids using the
    /// front-loaded-remainder rule (§3), with refinement levels set to zero. This is what
    /// `writeFile` and `distribute` use to lay out an output file.
    #[must_use]
    pub fn plan(geometry: &GridGeometry) -> Self {
        let (nx, ny, nz) = geometry.extent();
        let (p, q, r) = geometry.partition();

        let x_lengths = partition_lengths(nx, p);
        let y_lengths = partition_lengths(ny, q);
        let z_lengths = partition_lengths(nz, r);
        let x_origins = partition_origins(&x_lengths);
        let y_origins = partition_origins(&y_lengths);
        let z_origins = partition_origins(&z_lengths);

        let mut descriptors = Vec::with_capacity((p * q * r) as usize);
        let mut byte_offset = FILE_HEADER_BYTES;

        for iz in 0..r as usize {
            for iy in 0..q as usize {
                for ix in 0..p as usize {
                    let descriptor = SubgridDescriptor {
                        origin: (x_origins[ix], y_origins[iy], z_origins[iz]),
                        extent: (x_lengths[ix], y_lengths[iy], z_lengths[iz]),
                        refinement: (0, 0, 0),
                        byte_offset,
                    };
                    byte_offset += descriptor.byte_len();
                    descriptors.push(descriptor);
                }
            }
        }

        Self { descriptors }
    }

    /// Builds a table directly from already-read descriptors, e.g. the ones a sequential
    /// reader accumulates while it streams subgrid payloads it has no further use for a
    /// separate header-only pass to re-derive.
    #[must_use]
    pub fn from_descriptors(descriptors: Vec<SubgridDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Walks every subgrid header in `reader` (a stream positioned at the start of the file),
    /// skipping each payload by seeking, and returns the resulting table. This is what
    /// `loadPQR` does: it trusts the bytes actually on disk rather than assuming they match
    /// [`SubgridTable::plan`], since some producers are known to write layouts that diverge
    /// from the canonical rule.
    pub fn read_from_file(reader: &mut (impl Read + Seek), geometry: &GridGeometry) -> Result<Self> {
        let num_subgrids = geometry.num_subgrids();
        let mut descriptors = Vec::with_capacity(num_subgrids as usize);
        let mut offset = FILE_HEADER_BYTES;

        reader.seek(SeekFrom::Start(offset))?;
        for _ in 0..num_subgrids {
            let mut descriptor = read_subgrid_header(reader)?;
            descriptor.byte_offset = offset;
            offset += descriptor.byte_len();
            reader.seek(SeekFrom::Start(offset))?;
            descriptors.push(descriptor);
        }

        let table = Self { descriptors };
        table.check_tiling(geometry)?;
        Ok(table)
    }

    /// Descriptors in canonical (file) order.
    #[must_use]
    pub fn descriptors(&self) -> &[SubgridDescriptor] {
        &self.descriptors
    }

    /// Number of subgrids in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the table has no subgrids (never true for a table built from a valid
    /// geometry, since partition counts are at least 1).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Byte offset one past the last subgrid, i.e. the total file length.
    #[must_use]
    pub fn end_offset(&self) -> u64 {
        self.descriptors
            .last()
            .map_or(FILE_HEADER_BYTES, |d| d.byte_offset + d.byte_len())
    }

    /// The `.dist` sidecar contents: `P*Q*R + 1` entries in total.
    ///
    /// By the on-disk convention this crate's producers and consumers agree on, the first
    /// entry is always `0` rather than the true byte offset of subgrid 0 (every reader
    /// already knows the first subgrid's header immediately follows the fixed file header,
    /// so the sidecar does not bother recording it); entries `1..n` give the byte offset of
    /// subgrids `1..n`, and the final entry is the total file length.
    #[must_use]
    pub fn dist_offsets(&self) -> Vec<u64> {
        let mut offsets = Vec::with_capacity(self.descriptors.len() + 1);
        offsets.push(0);
        offsets.extend(self.descriptors.iter().skip(1).map(|d| d.byte_offset));
        offsets.push(self.end_offset());
        offsets
    }

    /// Recovers the `(P, Q, R)` decomposition this table's subgrid origins imply: the count
    /// of distinct origins along each axis. The file header does not store `(P, Q, R)`
    /// directly, so this is how a reader reconstructs it after walking the actual subgrid
    /// headers. Assumes the table forms a clean grid product, which holds for anything this
    /// crate itself writes via [`SubgridTable::plan`].
    #[must_use]
    pub fn inferred_partition(&self) -> (i32, i32, i32) {
        let mut xs: Vec<i32> = self.descriptors.iter().map(|d| d.origin.0).collect();
        let mut ys: Vec<i32> = self.descriptors.iter().map(|d| d.origin.1).collect();
        let mut zs: Vec<i32> = self.descriptors.iter().map(|d| d.origin.2).collect();
        xs.sort_unstable();
        xs.dedup();
        ys.sort_unstable();
        ys.dedup();
        zs.sort_unstable();
        zs.dedup();
        (xs.len() as i32, ys.len() as i32, zs.len() as i32)
    }

    /// Checks that the subgrids tile `geometry` exactly: their cell counts sum to
    /// `nx*ny*nz` along every axis span they claim to cover.
    fn check_tiling(&self, geometry: &GridGeometry) -> Result<()> {
        let total_cells: usize = self.descriptors.iter().map(SubgridDescriptor::num_cells).sum();
        if total_cells != geometry.num_cells() {
            return Err(Error::Format(format!(
                "subgrids cover {total_cells} cells, expected {}",
                geometry.num_cells()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_tiles_exactly() {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), (41, 41, 50), (1.0, 1.0, 1.0), (2, 2, 1))
                .unwrap();
        let table = SubgridTable::plan(&geometry);
        assert_eq!(table.len(), 4);
        let total: usize = table.descriptors().iter().map(SubgridDescriptor::num_cells).sum();
        assert_eq!(total, geometry.num_cells());
    }

    #[test]
    fn plan_offsets_are_monotonic_and_front_loaded() {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), (10, 10, 10), (1.0, 1.0, 1.0), (2, 1, 1))
                .unwrap();
        let table = SubgridTable::plan(&geometry);
        let offsets: Vec<u64> = table.descriptors().iter().map(|d| d.byte_offset).collect();
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));

        // nx=10 split 2 ways: first subgrid gets 5 columns, second gets 5 (no remainder).
        assert_eq!(table.descriptors()[0].extent.0, 5);
        assert_eq!(table.descriptors()[1].extent.0, 5);
    }

    #[test]
    fn inferred_partition_recovers_planned_pqr() {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), (41, 41, 50), (1.0, 1.0, 1.0), (2, 2, 1))
                .unwrap();
        let table = SubgridTable::plan(&geometry);
        assert_eq!(table.inferred_partition(), (2, 2, 1));
    }

    #[test]
    fn dist_offsets_has_pqr_plus_one_entries() {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), (4, 4, 4), (1.0, 1.0, 1.0), (2, 2, 1)).unwrap();
        let table = SubgridTable::plan(&geometry);
        let offsets = table.dist_offsets();
        assert_eq!(offsets.len(), 2 * 2 * 1 + 1);
        assert_eq!(offsets[0], 0);
        assert_eq!(offsets[1], table.descriptors()[1].byte_offset);
        assert_eq!(*offsets.last().unwrap(), table.end_offset());
    }
}
