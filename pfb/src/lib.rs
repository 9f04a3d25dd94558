//! ParFlow Binary (PFB) codec and in-memory grid representation.
//!
//! A PFB file encodes a regular 3D cell-centered grid of big-endian `f64` values, partitioned
//! into rectangular subgrids that mirror the process decomposition used to produce it. This
//! crate reads, writes, clips, redistributes, and diffs that format; [`Grid`] is the
//! entry point for all of it.

pub mod codec;
pub mod differ;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod header;
pub mod subgrid;

pub use differ::Difference;
pub use error::{Error, Result};
pub use geometry::GridGeometry;
pub use grid::{Grid, Order};
pub use subgrid::{SubgridDescriptor, SubgridTable};
