//! Big-endian encode/decode of the primitive types that make up a PFB file.
//!
//! Every on-disk integer is a signed 32-bit big-endian value; every on-disk real is an
//! IEEE-754 binary64 big-endian value. Nothing here is specific to the PFB layout itself
//! (see [`crate::header`] for that) — this module is the thin byte-level adapter.

use std::io::{Read, Write};

use crate::error::{Error, Result};

/// Reads a single big-endian `i32`.
pub fn read_i32_be(reader: &mut impl Read) -> Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_be_bytes(buf))
}

/// Writes a single big-endian `i32`.
pub fn write_i32_be(writer: &mut impl Write, value: i32) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Reads a single big-endian `f64`.
pub fn read_f64_be(reader: &mut impl Read) -> Result<f64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(f64::from_be_bytes(buf))
}

/// Writes a single big-endian `f64`.
pub fn write_f64_be(writer: &mut impl Write, value: f64) -> Result<()> {
    writer.write_all(&value.to_be_bytes())?;
    Ok(())
}

/// Reads `count` contiguous big-endian `f64` values.
///
/// The on-disk layout is a straight big-endian stride with no interleaving, so this is a
/// single bulk read followed by per-element byte reversal rather than `count` individual
/// reads.
pub fn read_f64_be_bulk(reader: &mut impl Read, count: usize) -> Result<Vec<f64>> {
    let mut bytes = vec![0u8; count * 8];
    reader.read_exact(&mut bytes)?;

    let mut values = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(8) {
        let mut buf = [0u8; 8];
        buf.copy_from_slice(chunk);
        values.push(f64::from_be_bytes(buf));
    }
    Ok(values)
}

/// Writes a contiguous run of `f64` values as big-endian bytes.
pub fn write_f64_be_bulk(writer: &mut impl Write, values: &[f64]) -> Result<()> {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for value in values {
        bytes.extend_from_slice(&value.to_be_bytes());
    }
    writer.write_all(&bytes)?;
    Ok(())
}

/// Checks that a byte position fits an on-disk `u64` offset without overflow, returning a
/// [`Error::Format`] if the file is implausibly large for a PFB (which has no 64-bit length
/// fields for individual subgrids).
pub fn checked_offset(offset: u128) -> Result<u64> {
    u64::try_from(offset)
        .map_err(|_| Error::Format(format!("byte offset {offset} overflows a 64-bit position")))
}
