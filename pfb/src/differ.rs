//! Structural and cell-wise comparison of two [`Grid`]s.

use crate::grid::Grid;

/// The result of [`compare`]: either the grids agree, or the first point of disagreement
/// found while checking geometry scalars (in a fixed order) then cells (in canonical order).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Difference {
    /// Geometries and every cell agree.
    None,
    /// Origin x differs.
    X,
    /// Origin y differs.
    Y,
    /// Origin z differs.
    Z,
    /// Spacing dx differs.
    Dx,
    /// Spacing dy differs.
    Dy,
    /// Spacing dz differs.
    Dz,
    /// Extent nx differs.
    Nx,
    /// Extent ny differs.
    Ny,
    /// Extent nz differs.
    Nz,
    /// Partition P differs.
    P,
    /// Partition Q differs.
    Q,
    /// Partition R differs.
    R,
    /// The first cell (in z-outer, y-middle, x-inner order) whose value differs, located at
    /// `(z, y, x)`.
    Data {
        /// Zero-based z coordinate of the first differing cell.
        z: i32,
        /// Zero-based y coordinate of the first differing cell.
        y: i32,
        /// Zero-based x coordinate of the first differing cell.
        x: i32,
    },
}

/// Compares `a` and `b`, checking geometry scalars before cell data. Never fails: a Grid
/// without storage simply compares unequal to one that has it, surfaced as the geometry
/// mismatch (if any) or as an `InvalidState`-free "no data to compare" report folded into the
/// first cell position.
#[must_use]
pub fn compare(a: &Grid, b: &Grid) -> Difference {
    let (ax, ay, az) = a.geometry().origin();
    let (bx, by, bz) = b.geometry().origin();
    if ax != bx {
        return Difference::X;
    }
    if ay != by {
        return Difference::Y;
    }
    if az != bz {
        return Difference::Z;
    }

    let (adx, ady, adz) = a.geometry().spacing();
    let (bdx, bdy, bdz) = b.geometry().spacing();
    if adx != bdx {
        return Difference::Dx;
    }
    if ady != bdy {
        return Difference::Dy;
    }
    if adz != bdz {
        return Difference::Dz;
    }

    let (anx, any, anz) = a.geometry().extent();
    let (bnx, bny, bnz) = b.geometry().extent();
    if anx != bnx {
        return Difference::Nx;
    }
    if any != bny {
        return Difference::Ny;
    }
    if anz != bnz {
        return Difference::Nz;
    }

    let (ap, aq, ar) = a.geometry().partition();
    let (bp, bq, br) = b.geometry().partition();
    if ap != bp {
        return Difference::P;
    }
    if aq != bq {
        return Difference::Q;
    }
    if ar != br {
        return Difference::R;
    }

    // Geometries agree, including extents, so both storages (if present) are the same
    // length and indexed identically in canonical order.
    let a_cells = a.zyx_storage();
    let b_cells = b.zyx_storage();
    if let (Some(a_cells), Some(b_cells)) = (a_cells, b_cells) {
        let (nx, ny, _) = a.geometry().extent();
        let (nx, ny) = (nx as usize, ny as usize);
        for (index, (&av, &bv)) in a_cells.iter().zip(b_cells.iter()).enumerate() {
            if av != bv {
                let z = index / (nx * ny);
                let rem = index % (nx * ny);
                let y = rem / nx;
                let x = rem % nx;
                return Difference::Data {
                    z: z as i32,
                    y: y as i32,
                    x: x as i32,
                };
            }
        }
    }

    Difference::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridGeometry;

    fn grid_of(values: &[f64], extent: (i32, i32, i32)) -> Grid {
        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), extent, (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
        Grid::from_buffer(geometry, values.to_vec()).unwrap()
    }

    #[test]
    fn identical_grids_compare_none() {
        let a = grid_of(&[1.0, 2.0, 3.0, 4.0], (2, 2, 1));
        let b = grid_of(&[1.0, 2.0, 3.0, 4.0], (2, 2, 1));
        assert_eq!(compare(&a, &b), Difference::None);
    }

    #[test]
    fn geometry_mismatch_reported_before_data() {
        let a = GridGeometry::new((0.0, 0.0, 0.0), (2, 2, 1), (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
        let b = GridGeometry::new((1.0, 0.0, 0.0), (2, 2, 1), (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
        let grid_a = Grid::from_buffer(a, vec![0.0, 0.0, 0.0, 0.0]).unwrap();
        let grid_b = Grid::from_buffer(b, vec![9.0, 9.0, 9.0, 9.0]).unwrap();
        assert_eq!(compare(&grid_a, &grid_b), Difference::X);
    }

    #[test]
    fn first_cell_difference_reports_zyx_coordinate() {
        let a = grid_of(&[1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0], (2, 2, 2));
        let mut b_values = vec![1.0; 8];
        b_values[5] = 2.0; // index 5 => z=1, y=0, x=1 for a 2x2 grid
        let b = grid_of(&b_values, (2, 2, 2));
        assert_eq!(compare(&a, &b), Difference::Data { z: 1, y: 0, x: 1 });
    }
}
