//! [`GridGeometry`]: the integer/real domain descriptor shared by every subgrid and the Grid
//! that contains them.

use crate::error::{Error, Result};

/// Origin, extents, spacing, and partition counts of a PFB grid.
///
/// Origins and spacings are not range-checked (ParFlow grids can sit anywhere in space);
/// extents must be positive and partition counts must be at least one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    origin: (f64, f64, f64),
    extent: (i32, i32, i32),
    spacing: (f64, f64, f64),
    partition: (i32, i32, i32),
}

impl GridGeometry {
    /// Builds a new geometry, validating extents and partition counts.
    pub fn new(
        origin: (f64, f64, f64),
        extent: (i32, i32, i32),
        spacing: (f64, f64, f64),
        partition: (i32, i32, i32),
    ) -> Result<Self> {
        if extent.0 <= 0 || extent.1 <= 0 || extent.2 <= 0 {
            return Err(Error::Format(format!(
                "extents must be positive, got {extent:?}"
            )));
        }
        if spacing.0 <= 0.0 || spacing.1 <= 0.0 || spacing.2 <= 0.0 {
            return Err(Error::Format(format!(
                "spacing must be positive, got {spacing:?}"
            )));
        }
        if partition.0 < 1 || partition.1 < 1 || partition.2 < 1 {
            return Err(Error::Unsupported(format!(
                "partition counts must be at least 1, got {partition:?}"
            )));
        }
        Ok(Self {
            origin,
            extent,
            spacing,
            partition,
        })
    }

    /// Origin `(x, y, z)`.
    #[must_use]
    pub const fn origin(&self) -> (f64, f64, f64) {
        self.origin
    }

    /// Extents `(nx, ny, nz)`.
    #[must_use]
    pub const fn extent(&self) -> (i32, i32, i32) {
        self.extent
    }

    /// Spacing `(dx, dy, dz)`.
    #[must_use]
    pub const fn spacing(&self) -> (f64, f64, f64) {
        self.spacing
    }

    /// Partition counts `(P, Q, R)`.
    #[must_use]
    pub const fn partition(&self) -> (i32, i32, i32) {
        self.partition
    }

    /// Total number of subgrids, `P * Q * R`.
    #[must_use]
    pub fn num_subgrids(&self) -> i32 {
        self.partition.0 * self.partition.1 * self.partition.2
    }

    /// Total number of cells, `nx * ny * nz`.
    #[must_use]
    pub fn num_cells(&self) -> usize {
        self.extent.0 as usize * self.extent.1 as usize * self.extent.2 as usize
    }

    /// Replaces the partition counts, keeping origin/extent/spacing fixed. Used by
    /// `distribute` to retarget a geometry at a new (P, Q, R) without re-validating extents.
    pub fn with_partition(&self, partition: (i32, i32, i32)) -> Result<Self> {
        Self::new(self.origin, self.extent, self.spacing, partition)
    }

    /// Returns a geometry for the rectangular clip `(x0, y0, nx', ny')` spanning the full
    /// z-range, with origin shifted to match the clip's lower corner.
    pub fn clipped(&self, x0: i32, y0: i32, clip_nx: i32, clip_ny: i32) -> Result<Self> {
        if clip_nx <= 0 || clip_ny <= 0 {
            return Err(Error::OutOfBounds(
                "clip extents must be positive".to_string(),
            ));
        }
        if x0 < 0 || y0 < 0 || x0 + clip_nx > self.extent.0 || y0 + clip_ny > self.extent.1 {
            return Err(Error::OutOfBounds(format!(
                "clip rectangle ({x0}..{}, {y0}..{}) does not fit inside extents {:?}",
                x0 + clip_nx,
                y0 + clip_ny,
                self.extent
            )));
        }
        let (dx, dy, dz) = self.spacing;
        let (ox, oy, oz) = self.origin;
        Self::new(
            (ox + f64::from(x0) * dx, oy + f64::from(y0) * dy, oz),
            (clip_nx, clip_ny, self.extent.2),
            (dx, dy, dz),
            (1, 1, 1),
        )
    }

    /// Converts a logical `(x, y, z)` coordinate to a linear index in canonical z-major
    /// ("zyx") storage order.
    pub fn cell_index(&self, x: i32, y: i32, z: i32) -> Result<usize> {
        self.check_bounds(x, y, z)?;
        let (nx, ny, _) = self.extent;
        Ok((z as usize * ny as usize + y as usize) * nx as usize + x as usize)
    }

    /// Inverse of [`GridGeometry::cell_index`]: recovers `(x, y, z)` from a linear index.
    pub fn coord(&self, linear: usize) -> Result<(i32, i32, i32)> {
        let (nx, ny, nz) = self.extent;
        let plane = nx as usize * ny as usize;
        if linear >= plane * nz as usize {
            return Err(Error::OutOfBounds(format!(
                "linear index {linear} is outside a grid of {} cells",
                self.num_cells()
            )));
        }
        let z = linear / plane;
        let rem = linear % plane;
        let y = rem / nx as usize;
        let x = rem % nx as usize;
        Ok((x as i32, y as i32, z as i32))
    }

    fn check_bounds(&self, x: i32, y: i32, z: i32) -> Result<()> {
        let (nx, ny, nz) = self.extent;
        if x < 0 || y < 0 || z < 0 || x >= nx || y >= ny || z >= nz {
            return Err(Error::OutOfBounds(format!(
                "coordinate ({x}, {y}, {z}) is outside extents {:?}",
                self.extent
            )));
        }
        Ok(())
    }
}

/// Splits a global extent `n` into `f` partition lengths following the PFB decomposition
/// rule: the first `n % f` partitions get `n / f + 1` cells, the rest get `n / f`.
///
/// Front-loading the remainder this way is load-bearing: every producer and consumer of a
/// `.dist` sidecar must agree on it, or subgrid byte offsets will diverge.
#[must_use]
pub fn partition_lengths(n: i32, f: i32) -> Vec<i32> {
    let base = n / f;
    let rem = n % f;
    (0..f)
        .map(|i| if i < rem { base + 1 } else { base })
        .collect()
}

/// Returns the prefix-sum origins corresponding to [`partition_lengths`].
#[must_use]
pub fn partition_origins(lengths: &[i32]) -> Vec<i32> {
    let mut origins = Vec::with_capacity(lengths.len());
    let mut acc = 0;
    for &len in lengths {
        origins.push(acc);
        acc += len;
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_extent() {
        assert!(GridGeometry::new((0.0, 0.0, 0.0), (0, 1, 1), (1.0, 1.0, 1.0), (1, 1, 1)).is_err());
    }

    #[test]
    fn rejects_zero_partition() {
        assert!(GridGeometry::new((0.0, 0.0, 0.0), (1, 1, 1), (1.0, 1.0, 1.0), (0, 1, 1)).is_err());
    }

    #[test]
    fn cell_index_round_trips_with_coord() {
        let geom = GridGeometry::new((0.0, 0.0, 0.0), (41, 41, 50), (1.0, 1.0, 1.0), (1, 1, 1))
            .unwrap();
        for (x, y, z) in [(0, 0, 0), (40, 0, 0), (0, 1, 45), (22, 1, 0)] {
            let linear = geom.cell_index(x, y, z).unwrap();
            assert_eq!(geom.coord(linear).unwrap(), (x, y, z));
        }
    }

    #[test]
    fn out_of_bounds_coordinate_errors() {
        let geom =
            GridGeometry::new((0.0, 0.0, 0.0), (4, 4, 4), (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
        assert!(matches!(
            geom.cell_index(4, 0, 0),
            Err(Error::OutOfBounds(_))
        ));
    }

    #[test]
    fn partition_lengths_front_loads_remainder() {
        assert_eq!(partition_lengths(41, 2), vec![21, 20]);
        assert_eq!(partition_lengths(10, 3), vec![4, 3, 3]);
        assert_eq!(partition_origins(&partition_lengths(10, 3)), vec![0, 4, 7]);
    }
}
