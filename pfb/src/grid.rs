//! [`Grid`]: the in-memory dense buffer of a PFB grid, and the sequential, threaded, and
//! clip readers that populate one from disk.

use std::fs::File;
use std::io::{BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::OnceLock;

use crate::codec::{checked_offset, read_f64_be_bulk, write_f64_be_bulk};
use crate::error::{Error, Result};
use crate::geometry::GridGeometry;
use crate::header::{
    read_file_header, read_subgrid_header, write_file_header, write_subgrid_header,
    FILE_HEADER_BYTES,
};
use crate::subgrid::{SubgridDescriptor, SubgridTable};

/// In-memory storage order of a [`Grid`]'s cells.
///
/// `Zyx` is the only order `writeFile` accepts; `Xyz` exists purely as a read-only
/// transposed view for callers that want x varying slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    /// Canonical order: linear index `z*ny*nx + y*nx + x`.
    Zyx,
    /// Transposed view: linear index `x*ny*nz + y*nz + z`. Never written to disk.
    Xyz,
}

/// A dense, cell-centered 3D scalar grid plus the geometry and (optional) subgrid table that
/// describe it.
#[derive(Debug, Clone)]
pub struct Grid {
    geometry: GridGeometry,
    storage: Option<Vec<f64>>,
    order: Order,
    subgrids: Option<SubgridTable>,
}

impl Grid {
    /// Builds an empty grid with no storage allocated (the `loadHeader` state).
    #[must_use]
    pub fn empty(geometry: GridGeometry) -> Self {
        Self {
            geometry,
            storage: None,
            order: Order::Zyx,
            subgrids: None,
        }
    }

    /// Builds a grid from an already-populated buffer in canonical zyx order. Returns
    /// [`Error::Format`] if `buffer.len()` does not match `geometry.num_cells()`.
    pub fn from_buffer(geometry: GridGeometry, buffer: Vec<f64>) -> Result<Self> {
        if buffer.len() != geometry.num_cells() {
            return Err(Error::Format(format!(
                "buffer has {} cells, geometry expects {}",
                buffer.len(),
                geometry.num_cells()
            )));
        }
        Ok(Self {
            geometry,
            storage: Some(buffer),
            order: Order::Zyx,
            subgrids: None,
        })
    }

    /// This grid's geometry.
    #[must_use]
    pub const fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// This grid's current storage order.
    #[must_use]
    pub const fn order(&self) -> Order {
        self.order
    }

    /// The subgrid table, if one has been populated by [`Grid::load_pqr`] or a reader.
    #[must_use]
    pub const fn subgrids(&self) -> Option<&SubgridTable> {
        self.subgrids.as_ref()
    }

    /// Borrows the storage buffer, or `None` if storage is absent (empty grid, or after
    /// [`Grid::move_data_array`]).
    #[must_use]
    pub fn view_data_array(&self) -> Option<&[f64]> {
        self.storage.as_deref()
    }

    /// Returns a fresh copy of the storage buffer, or `None` if storage is absent.
    #[must_use]
    pub fn copy_data_array(&self) -> Option<Vec<f64>> {
        self.storage.clone()
    }

    /// Transfers ownership of the storage buffer out of this grid, leaving it empty.
    pub fn move_data_array(&mut self) -> Option<Vec<f64>> {
        self.storage.take()
    }

    /// Releases storage, returning the grid to the `loadHeader` state.
    pub fn close(&mut self) {
        self.storage = None;
        self.subgrids = None;
    }

    /// Returns a new grid holding a transposed copy of this grid's storage in the requested
    /// order. Requesting the order this grid is already in returns a plain clone.
    pub fn to_order(&self, order: Order) -> Result<Self> {
        let Some(storage) = &self.storage else {
            return Err(Error::InvalidState(
                "cannot reorder a grid with no storage".to_string(),
            ));
        };
        if order == self.order {
            return Ok(self.clone());
        }

        let (nx, ny, nz) = self.geometry.extent();
        let (nx, ny, nz) = (nx as usize, ny as usize, nz as usize);
        let mut transposed = vec![0.0; storage.len()];
        match (self.order, order) {
            (Order::Zyx, Order::Xyz) => {
                for z in 0..nz {
                    for y in 0..ny {
                        for x in 0..nx {
                            let zyx = (z * ny + y) * nx + x;
                            let xyz = (x * ny + y) * nz + z;
                            transposed[xyz] = storage[zyx];
                        }
                    }
                }
            }
            (Order::Xyz, Order::Zyx) => {
                for x in 0..nx {
                    for y in 0..ny {
                        for z in 0..nz {
                            let xyz = (x * ny + y) * nz + z;
                            let zyx = (z * ny + y) * nx + x;
                            transposed[zyx] = storage[xyz];
                        }
                    }
                }
            }
            _ => unreachable!("order equality handled above"),
        }

        Ok(Self {
            geometry: self.geometry,
            storage: Some(transposed),
            order,
            subgrids: self.subgrids.clone(),
        })
    }

    /// Reads the cell value at `(x, y, z)`. Requires `Zyx` order and populated storage.
    pub fn at(&self, x: i32, y: i32, z: i32) -> Result<f64> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            Error::InvalidState("grid has no storage; call a load method first".to_string())
        })?;
        if self.order != Order::Zyx {
            return Err(Error::InvalidState(
                "cell access requires zyx order".to_string(),
            ));
        }
        let index = self.geometry.cell_index(x, y, z)?;
        Ok(storage[index])
    }

    /// Opens `path` and reads the file header only: origin, extent, spacing, and the subgrid
    /// count. Storage is not allocated, and no subgrid header is read, so the geometry's
    /// partition is a nominal `(numSubgrids, 1, 1)` placeholder rather than the file's true
    /// `(P, Q, R)` — recovering that requires walking the subgrid headers via
    /// [`Grid::load_pqr`] or a full [`Grid::load_data`].
    pub fn load_header(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let (geometry, _) = read_file_header(&mut reader)?;
        Ok(Self::empty(geometry))
    }

    /// Opens `path`, reads the file header, then walks every subgrid header to populate the
    /// subgrid table and recover the true `(P, Q, R)` partition. Storage is not allocated.
    /// Required before [`Grid::load_data_threaded`] when the caller cannot assume the
    /// on-disk layout matches [`SubgridTable::plan`].
    pub fn load_pqr(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let (geometry, num_subgrids) = read_file_header(&mut reader)?;
        let subgrids = SubgridTable::read_from_file(&mut reader, &geometry)?;
        let partition = subgrids.inferred_partition();
        let (p, q, r) = partition;
        if p * q * r != num_subgrids {
            return Err(Error::Format(format!(
                "file header records {num_subgrids} subgrids but the decomposition implies {}",
                p * q * r
            )));
        }
        let geometry = geometry.with_partition(partition)?;
        log::debug!(
            "loaded subgrid table for {:?}: {} subgrids, partition {:?}",
            path.as_ref(),
            subgrids.len(),
            partition
        );
        Ok(Self {
            geometry,
            storage: None,
            order: Order::Zyx,
            subgrids: Some(subgrids),
        })
    }

    /// Sequential single-pass read: allocates storage and fills it subgrid by subgrid, in
    /// file order. Aborts and discards partial storage on the first error.
    pub fn load_data(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let (geometry, num_subgrids) = read_file_header(&mut reader)?;

        let (nx, ny, _) = geometry.extent();
        let (nx, ny) = (nx as usize, ny as usize);
        let mut storage = vec![0.0; geometry.num_cells()];
        let mut descriptors = Vec::with_capacity(num_subgrids as usize);
        let mut offset = FILE_HEADER_BYTES;

        for _ in 0..num_subgrids {
            reader.seek(SeekFrom::Start(offset))?;
            let mut descriptor = read_subgrid_header(&mut reader)?;
            descriptor.byte_offset = offset;

            let (ix, iy, iz) = descriptor.origin;
            let (snx, sny, snz) = descriptor.extent;
            let cells = read_f64_be_bulk(&mut reader, descriptor.num_cells())?;

            let mut cursor = 0;
            for z in 0..snz {
                for y in 0..sny {
                    for x in 0..snx {
                        let gz = (iz + z) as usize;
                        let gy = (iy + y) as usize;
                        let gx = (ix + x) as usize;
                        storage[(gz * ny + gy) * nx + gx] = cells[cursor];
                        cursor += 1;
                    }
                }
            }

            offset = descriptor.data_offset() + 8 * descriptor.num_cells() as u64;
            descriptors.push(descriptor);
        }

        let subgrids = SubgridTable::from_descriptors(descriptors);
        let (p, q, r) = subgrids.inferred_partition();
        if p * q * r != num_subgrids {
            return Err(Error::Format(format!(
                "file header records {num_subgrids} subgrids but the decomposition implies {}",
                p * q * r
            )));
        }
        let geometry = geometry.with_partition((p, q, r))?;

        Ok(Self {
            geometry,
            storage: Some(storage),
            order: Order::Zyx,
            subgrids: Some(subgrids),
        })
    }

    /// Parallel read across a fixed-size worker pool. Requires [`Grid::load_pqr`]-quality
    /// subgrid offsets; this implementation re-derives them itself so it can be called
    /// directly from a path.
    ///
    /// Workers share the destination buffer but write to cell-disjoint regions, so no
    /// synchronization guards the writes themselves; the first error any worker observes is
    /// recorded in a write-once slot and surfaced to the caller once every worker has
    /// finished.
    pub fn load_data_threaded(path: impl AsRef<Path>, num_workers: usize) -> Result<Self> {
        let path = path.as_ref();
        let with_table = Self::load_pqr(path)?;
        let geometry = with_table.geometry;
        let subgrids = with_table
            .subgrids
            .expect("load_pqr always populates the subgrid table");

        let (nx, ny, _) = geometry.extent();
        let (nx, ny) = (nx as usize, ny as usize);
        let total_cells = geometry.num_cells();
        let mut storage = vec![0.0; total_cells];

        let effective_workers = if num_workers == 0 {
            1
        } else {
            num_workers.min(subgrids.len().max(1))
        };
        log::debug!(
            "loadDataThreaded: {} subgrids across {} workers",
            subgrids.len(),
            effective_workers
        );

        // SAFETY: `storage` is sliced into cell-disjoint regions per subgrid per the
        // tiling invariant enforced when the table was built; each worker only ever
        // dereferences the cells belonging to its own subgrids, and the pool below joins
        // every worker before this function returns, so the aliasing raw pointer never
        // outlives the borrow it stands in for.
        let storage_ptr = SendPtr(storage.as_mut_ptr());
        let first_error: OnceLock<Error> = OnceLock::new();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(effective_workers)
            .build()
            .map_err(|err| Error::Unsupported(format!("failed to build worker pool: {err}")))?;

        // Sorted by file-offset ascending to favor read coalescing, per the ordering policy.
        let mut ordered: Vec<&SubgridDescriptor> = subgrids.descriptors().iter().collect();
        ordered.sort_by_key(|d| d.byte_offset);

        pool.scope(|scope| {
            for descriptor in ordered {
                let storage_ptr = storage_ptr;
                let first_error = &first_error;
                scope.spawn(move |_| {
                    if let Err(err) = load_one_subgrid(path, descriptor, storage_ptr.0, nx, ny) {
                        let _ = first_error.set(err);
                    }
                });
            }
        });

        if let Some(err) = first_error.into_inner() {
            return Err(err);
        }

        Ok(Self {
            geometry,
            storage: Some(storage),
            order: Order::Zyx,
            subgrids: Some(subgrids),
        })
    }

    /// Reads a rectangular sub-region `(x0..x0+clip_nx, y0..y0+clip_ny)` spanning the full
    /// z-range, without materializing the whole source grid.
    pub fn load_clip_of_data(
        path: impl AsRef<Path>,
        x0: i32,
        y0: i32,
        clip_nx: i32,
        clip_ny: i32,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = BufReader::new(File::open(path)?);
        let (geometry, num_subgrids) = read_file_header(&mut reader)?;
        let clip_geometry = geometry.clipped(x0, y0, clip_nx, clip_ny)?;

        let (_, _, nz) = geometry.extent();
        let (clip_nx, clip_ny) = (clip_nx as usize, clip_ny as usize);
        let mut storage = vec![0.0; clip_geometry.num_cells()];
        let mut offset = FILE_HEADER_BYTES;

        for _ in 0..num_subgrids {
            reader.seek(SeekFrom::Start(offset))?;
            let mut descriptor = read_subgrid_header(&mut reader)?;
            descriptor.byte_offset = offset;
            let data_offset = descriptor.data_offset();
            offset = data_offset + 8 * descriptor.num_cells() as u64;

            let (ix, iy, _iz) = descriptor.origin;
            let (snx, sny, snz) = descriptor.extent;

            let row_x0 = x0.max(ix);
            let row_x1 = (x0 + clip_nx as i32).min(ix + snx);
            if row_x0 >= row_x1 {
                continue;
            }
            let row_y0 = y0.max(iy);
            let row_y1 = (y0 + clip_ny as i32).min(iy + sny);
            if row_y0 >= row_y1 {
                continue;
            }

            let run_len = (row_x1 - row_x0) as usize;
            for z in 0..snz {
                for y in row_y0..row_y1 {
                    let local_y = (y - iy) as u64;
                    let local_x = (row_x0 - ix) as u64;
                    let local_z = z as u64;
                    let cell_offset = (local_z * sny as u64 + local_y) * snx as u64 + local_x;
                    let seek_pos = checked_offset(
                        u128::from(data_offset) + 8 * u128::from(cell_offset),
                    )?;
                    reader.seek(SeekFrom::Start(seek_pos))?;
                    let run = read_f64_be_bulk(&mut reader, run_len)?;

                    let gz = z as usize;
                    let gy = (y - y0) as usize;
                    let gx0 = (row_x0 - x0) as usize;
                    let base = (gz * clip_ny + gy) * clip_nx + gx0;
                    storage[base..base + run_len].copy_from_slice(&run);
                }
            }
        }
        let _ = nz;

        Ok(Self {
            geometry: clip_geometry,
            storage: Some(storage),
            order: Order::Zyx,
            subgrids: None,
        })
    }

    /// Serializes this grid under its current subgrid table (planning one from `P, Q, R` on
    /// this grid's own partition if none has been set) to `path`. Fails if storage is not in
    /// `zyx` order.
    pub fn write_file(&self, path: impl AsRef<Path>) -> Result<()> {
        if self.order != Order::Zyx {
            return Err(Error::InvalidState(
                "writeFile requires zyx storage order".to_string(),
            ));
        }
        let storage = self.storage.as_ref().ok_or_else(|| {
            Error::InvalidState("cannot write a grid with no storage".to_string())
        })?;

        let table = match &self.subgrids {
            Some(table) => table.clone(),
            None => SubgridTable::plan(&self.geometry),
        };

        let mut writer = BufWriter::new(File::create(path)?);
        write_file_header(&mut writer, &self.geometry)?;

        let (nx, ny, _) = self.geometry.extent();
        let (nx, ny) = (nx as usize, ny as usize);

        for descriptor in table.descriptors() {
            write_subgrid_header(&mut writer, descriptor)?;
            let (ix, iy, iz) = descriptor.origin;
            let (snx, sny, snz) = descriptor.extent;
            let mut cells = Vec::with_capacity(descriptor.num_cells());
            for z in 0..snz {
                for y in 0..sny {
                    for x in 0..snx {
                        let gz = (iz + z) as usize;
                        let gy = (iy + y) as usize;
                        let gx = (ix + x) as usize;
                        cells.push(storage[(gz * ny + gy) * nx + gx]);
                    }
                }
            }
            write_f64_be_bulk(&mut writer, &cells)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Rebuilds the subgrid table for `(p, q, r)`, writes the result to `out_path`, and
    /// emits the `out_path.dist` sidecar alongside it.
    pub fn dist_file(&self, p: i32, q: i32, r: i32, out_path: impl AsRef<Path>) -> Result<()> {
        let out_path = out_path.as_ref();
        let retargeted_geometry = self.geometry.with_partition((p, q, r))?;
        let retargeted = Self {
            geometry: retargeted_geometry,
            storage: self.storage.clone(),
            order: self.order,
            subgrids: Some(SubgridTable::plan(&retargeted_geometry)),
        };
        retargeted.write_file(out_path)?;

        let table = retargeted.subgrids.as_ref().expect("just set above");
        let offsets = table.dist_offsets();
        let mut dist_path = out_path.to_path_buf();
        let extended = match dist_path.extension() {
            Some(ext) => format!("{}.dist", ext.to_string_lossy()),
            None => "dist".to_string(),
        };
        dist_path.set_extension(extended);

        let mut sidecar = String::new();
        for offset in &offsets {
            sidecar.push_str(&offset.to_string());
            sidecar.push('\n');
        }
        std::fs::write(&dist_path, sidecar)?;
        log::debug!(
            "distFile wrote {} subgrids and {} offsets to {:?}",
            table.len(),
            offsets.len(),
            dist_path
        );
        Ok(())
    }

    /// Structural and cell-wise comparison against `other`; see [`crate::differ::compare`].
    #[must_use]
    pub fn compare(&self, other: &Self) -> crate::differ::Difference {
        crate::differ::compare(self, other)
    }

    pub(crate) fn zyx_storage(&self) -> Option<&[f64]> {
        if self.order == Order::Zyx {
            self.storage.as_deref()
        } else {
            None
        }
    }
}

/// Reads one subgrid's header and payload from its own file handle and writes its cells
/// directly into the shared destination buffer at `dest`. Used by the worker pool spawned
/// from [`Grid::load_data_threaded`].
fn load_one_subgrid(
    path: &Path,
    descriptor: &SubgridDescriptor,
    dest: *mut f64,
    nx: usize,
    ny: usize,
) -> Result<()> {
    let mut reader = BufReader::new(File::open(path)?);
    reader.seek(SeekFrom::Start(descriptor.data_offset()))?;
    let cells = read_f64_be_bulk(&mut reader, descriptor.num_cells())?;

    let (ix, iy, iz) = descriptor.origin;
    let (snx, sny, snz) = descriptor.extent;
    let mut cursor = 0;
    for z in 0..snz {
        for y in 0..sny {
            for x in 0..snx {
                let gz = (iz + z) as usize;
                let gy = (iy + y) as usize;
                let gx = (ix + x) as usize;
                let index = (gz * ny + gy) * nx + gx;
                // SAFETY: each subgrid owns a cell-disjoint slice of the destination
                // buffer, so this write can never race with another worker's write.
                unsafe {
                    *dest.add(index) = cells[cursor];
                }
                cursor += 1;
            }
        }
    }
    Ok(())
}

/// Wraps a raw pointer so it can be captured into a `rayon::Scope` closure that must be
/// `Send`; the pointer is only ever dereferenced within the cell-disjoint region its
/// originating subgrid owns.
#[derive(Clone, Copy)]
struct SendPtr(*mut f64);

// SAFETY: see the safety comment on `load_data_threaded`'s use of `storage_ptr`.
unsafe impl Send for SendPtr {}
unsafe impl Sync for SendPtr {}

#[cfg(test)]
mod tests {
    use super::*;

    fn synthetic_grid(extent: (i32, i32, i32), partition: (i32, i32, i32)) -> Grid {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), extent, (1.0, 1.0, 1.0), partition).unwrap();
        let mut buffer = Vec::with_capacity(geometry.num_cells());
        for z in 0..extent.2 {
            for y in 0..extent.1 {
                for x in 0..extent.0 {
                    buffer.push(f64::from(x + y * 1000 + z * 1_000_000));
                }
            }
        }
        Grid::from_buffer(geometry, buffer).unwrap()
    }

    #[test]
    fn write_then_load_data_round_trips() {
        let grid = synthetic_grid((6, 5, 4), (2, 2, 1));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pfb");
        grid.write_file(&path).unwrap();

        let loaded = Grid::load_data(&path).unwrap();
        assert_eq!(loaded.geometry(), grid.geometry());
        assert_eq!(loaded.view_data_array(), grid.view_data_array());
    }

    #[test]
    fn threaded_load_matches_sequential_load() {
        let grid = synthetic_grid((8, 6, 3), (2, 3, 1));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pfb");
        grid.write_file(&path).unwrap();

        let sequential = Grid::load_data(&path).unwrap();
        for workers in [1, 4, 40] {
            let threaded = Grid::load_data_threaded(&path, workers).unwrap();
            assert!(matches!(
                threaded.compare(&sequential),
                crate::differ::Difference::None
            ));
        }
    }

    #[test]
    fn clip_read_matches_full_read() {
        let grid = synthetic_grid((10, 9, 3), (2, 2, 1));
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pfb");
        grid.write_file(&path).unwrap();

        let clip = Grid::load_clip_of_data(&path, 4, 3, 3, 2).unwrap();
        assert_eq!(clip.geometry().extent(), (3, 2, 3));
        for z in 0..3 {
            for y in 0..2 {
                for x in 0..3 {
                    assert_eq!(
                        clip.at(x, y, z).unwrap(),
                        grid.at(x + 4, y + 3, z).unwrap()
                    );
                }
            }
        }
    }

    #[test]
    fn move_data_array_empties_grid() {
        let mut grid = synthetic_grid((2, 2, 2), (1, 1, 1));
        assert!(grid.view_data_array().is_some());
        let moved = grid.move_data_array();
        assert!(moved.is_some());
        assert!(grid.view_data_array().is_none());
    }

    #[test]
    fn write_file_rejects_xyz_order() {
        let grid = synthetic_grid((3, 3, 3), (1, 1, 1));
        let xyz = grid.to_order(Order::Xyz).unwrap();
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            xyz.write_file(dir.path().join("out.pfb")),
            Err(Error::InvalidState(_))
        ));
    }

    #[test]
    fn to_order_round_trips() {
        let grid = synthetic_grid((4, 3, 2), (1, 1, 1));
        let xyz = grid.to_order(Order::Xyz).unwrap();
        let back = xyz.to_order(Order::Zyx).unwrap();
        assert_eq!(back.view_data_array(), grid.view_data_array());
    }

    #[test]
    fn dist_file_emits_expected_offset_count() {
        let grid = synthetic_grid((10, 10, 4), (1, 1, 1));
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.pfb");
        grid.dist_file(2, 2, 1, &out).unwrap();

        let sidecar = std::fs::read_to_string(dir.path().join("out.pfb.dist")).unwrap();
        let lines: Vec<&str> = sidecar.lines().collect();
        assert_eq!(lines.len(), 2 * 2 * 1 + 1);
        assert_eq!(lines[0], "0");
    }
}
