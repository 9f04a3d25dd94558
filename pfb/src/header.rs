//! Reads and writes the PFB file header and per-subgrid headers (§4.4 of the format).

use std::io::{Read, Write};

use crate::codec::{read_f64_be, read_i32_be, write_f64_be, write_i32_be};
use crate::error::{Error, Result};
use crate::geometry::GridGeometry;
use crate::subgrid::SubgridDescriptor;

/// Size in bytes of the fixed file header.
pub const FILE_HEADER_BYTES: u64 = 64;

/// Size in bytes of each fixed subgrid header.
pub const SUBGRID_HEADER_BYTES: u64 = 36;

/// Reads the 64-byte file header: origin, extent, spacing, and the subgrid count. The
/// on-disk header carries no `(P, Q, R)` partition field — a PFB producer is free to write
/// any set of subgrids that tiles the extent, not necessarily a clean grid product, so the
/// true partition can only be recovered by walking the subgrid headers themselves (see
/// [`crate::subgrid::SubgridTable::inferred_partition`]). The geometry returned here carries
/// a nominal `(num_subgrids, 1, 1)` partition as a placeholder that satisfies
/// `GridGeometry`'s invariants; callers that have read the subgrid table should replace it
/// via [`GridGeometry::with_partition`].
pub fn read_file_header(reader: &mut impl Read) -> Result<(GridGeometry, i32)> {
    let origin = (
        read_f64_be(reader)?,
        read_f64_be(reader)?,
        read_f64_be(reader)?,
    );
    let extent = (
        read_i32_be(reader)?,
        read_i32_be(reader)?,
        read_i32_be(reader)?,
    );
    let spacing = (
        read_f64_be(reader)?,
        read_f64_be(reader)?,
        read_f64_be(reader)?,
    );
    let num_subgrids = read_i32_be(reader)?;

    if num_subgrids <= 0 {
        return Err(Error::Format(format!(
            "file header records {num_subgrids} subgrids"
        )));
    }
    let geometry = GridGeometry::new(origin, extent, spacing, (num_subgrids, 1, 1))?;
    Ok((geometry, num_subgrids))
}

/// Writes the 64-byte file header: origin, extent, spacing, and `geometry.num_subgrids()`.
/// `geometry`'s partition counts themselves are not written; see [`read_file_header`].
pub fn write_file_header(writer: &mut impl Write, geometry: &GridGeometry) -> Result<()> {
    let (ox, oy, oz) = geometry.origin();
    let (nx, ny, nz) = geometry.extent();
    let (dx, dy, dz) = geometry.spacing();

    write_f64_be(writer, ox)?;
    write_f64_be(writer, oy)?;
    write_f64_be(writer, oz)?;
    write_i32_be(writer, nx)?;
    write_i32_be(writer, ny)?;
    write_i32_be(writer, nz)?;
    write_f64_be(writer, dx)?;
    write_f64_be(writer, dy)?;
    write_f64_be(writer, dz)?;
    write_i32_be(writer, geometry.num_subgrids())?;
    Ok(())
}

/// Reads one subgrid header (origin, extent, refinement). The caller is responsible for
/// filling in `byte_offset`, since that is a property of *where* this header was read from,
/// not of the header bytes themselves.
pub fn read_subgrid_header(reader: &mut impl Read) -> Result<SubgridDescriptor> {
    let origin = (
        read_i32_be(reader)?,
        read_i32_be(reader)?,
        read_i32_be(reader)?,
    );
    let extent = (
        read_i32_be(reader)?,
        read_i32_be(reader)?,
        read_i32_be(reader)?,
    );
    let refinement = (
        read_i32_be(reader)?,
        read_i32_be(reader)?,
        read_i32_be(reader)?,
    );

    if extent.0 <= 0 || extent.1 <= 0 || extent.2 <= 0 {
        return Err(Error::Format(format!(
            "subgrid at {origin:?} has non-positive extent {extent:?}"
        )));
    }

    Ok(SubgridDescriptor {
        origin,
        extent,
        refinement,
        byte_offset: 0,
    })
}

/// Writes one subgrid header.
pub fn write_subgrid_header(writer: &mut impl Write, descriptor: &SubgridDescriptor) -> Result<()> {
    let (ix, iy, iz) = descriptor.origin;
    let (snx, sny, snz) = descriptor.extent;
    let (rx, ry, rz) = descriptor.refinement;

    write_i32_be(writer, ix)?;
    write_i32_be(writer, iy)?;
    write_i32_be(writer, iz)?;
    write_i32_be(writer, snx)?;
    write_i32_be(writer, sny)?;
    write_i32_be(writer, snz)?;
    write_i32_be(writer, rx)?;
    write_i32_be(writer, ry)?;
    write_i32_be(writer, rz)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn file_header_round_trips() {
        let geometry = GridGeometry::new(
            (1.5, 2.5, 0.0),
            (4, 3, 2),
            (10.0, 10.0, 1.0),
            (2, 1, 1),
        )
        .unwrap();

        let mut buf = Vec::new();
        write_file_header(&mut buf, &geometry).unwrap();
        assert_eq!(buf.len() as u64, FILE_HEADER_BYTES);

        // The partition itself is not on disk, so only origin/extent/spacing/num_subgrids
        // round-trip through the raw header; the nominal partition this returns is a
        // placeholder a caller with subgrid headers in hand is expected to replace.
        let (read_back, num_subgrids) = read_file_header(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read_back.origin(), geometry.origin());
        assert_eq!(read_back.extent(), geometry.extent());
        assert_eq!(read_back.spacing(), geometry.spacing());
        assert_eq!(num_subgrids, 2);
    }

    #[test]
    fn subgrid_header_round_trips() {
        let descriptor = SubgridDescriptor {
            origin: (2, 0, 0),
            extent: (2, 3, 4),
            refinement: (0, 0, 0),
            byte_offset: 0,
        };
        let mut buf = Vec::new();
        write_subgrid_header(&mut buf, &descriptor).unwrap();
        assert_eq!(buf.len() as u64, SUBGRID_HEADER_BYTES);

        let read_back = read_subgrid_header(&mut Cursor::new(buf)).unwrap();
        assert_eq!(read_back.origin, descriptor.origin);
        assert_eq!(read_back.extent, descriptor.extent);
        assert_eq!(read_back.refinement, descriptor.refinement);
    }

    #[test]
    fn rejects_non_positive_subgrid_extent() {
        let mut buf = Vec::new();
        write_i32_be(&mut buf, 0).unwrap(); // ix
        write_i32_be(&mut buf, 0).unwrap(); // iy
        write_i32_be(&mut buf, 0).unwrap(); // iz
        write_i32_be(&mut buf, 0).unwrap(); // snx (invalid)
        write_i32_be(&mut buf, 1).unwrap(); // sny
        write_i32_be(&mut buf, 1).unwrap(); // snz
        write_i32_be(&mut buf, 0).unwrap(); // rx
        write_i32_be(&mut buf, 0).unwrap(); // ry
        write_i32_be(&mut buf, 0).unwrap(); // rz

        assert!(matches!(
            read_subgrid_header(&mut Cursor::new(buf)),
            Err(Error::Format(_))
        ));
    }
}
