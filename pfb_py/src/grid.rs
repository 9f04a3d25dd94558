//! PyO3 wrapper exposing [`pfb::Grid`] as a Python class backed by a zero-copy NumPy array.

use std::path::PathBuf;

use ndarray::Array3;
use numpy::{IntoPyArray, PyArray3};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use pfb::{Difference, Grid, Order};

fn to_py_err(err: pfb::Error) -> PyErr {
    match err {
        pfb::Error::Io(_) => PyIOError::new_err(err.to_string()),
        pfb::Error::OutOfBounds(_) | pfb::Error::Format(_) => {
            PyValueError::new_err(err.to_string())
        }
        pfb::Error::InvalidState(_) | pfb::Error::Unsupported(_) => {
            PyRuntimeError::new_err(err.to_string())
        }
    }
}

/// PyO3 wrapper to :rustdoc:`pfb::Grid <grid/struct.Grid.html>`, the dense 3D scalar grid
/// read from (or written to) a ParFlow Binary file.
#[pyclass(name = "Grid")]
#[repr(transparent)]
pub struct PyGrid {
    pub(crate) grid: Grid,
}

#[pymethods]
impl PyGrid {
    /// Reads only the file header, without allocating cell storage.
    ///
    /// Parameters
    /// ----------
    /// path : str
    ///     path to the PFB file
    #[staticmethod]
    pub fn load_header(path: PathBuf) -> PyResult<Self> {
        Ok(Self {
            grid: Grid::load_header(path).map_err(to_py_err)?,
        })
    }

    /// Sequentially reads the whole grid into memory.
    ///
    /// Parameters
    /// ----------
    /// path : str
    ///     path to the PFB file
    #[staticmethod]
    pub fn load_data(path: PathBuf) -> PyResult<Self> {
        Ok(Self {
            grid: Grid::load_data(path).map_err(to_py_err)?,
        })
    }

    /// Reads the whole grid using a fixed-size worker pool.
    ///
    /// Parameters
    /// ----------
    /// path : str
    ///     path to the PFB file
    /// num_workers : int
    ///     number of OS threads to read with; capped at the subgrid count
    #[staticmethod]
    pub fn load_data_threaded(path: PathBuf, num_workers: usize) -> PyResult<Self> {
        Ok(Self {
            grid: Grid::load_data_threaded(path, num_workers).map_err(to_py_err)?,
        })
    }

    /// Reads a rectangular sub-region spanning the full z-range, without materializing the
    /// whole source grid.
    ///
    /// Parameters
    /// ----------
    /// path : str
    ///     path to the PFB file
    /// x0 : int
    /// y0 : int
    /// nx : int
    /// ny : int
    #[staticmethod]
    pub fn load_clip_of_data(path: PathBuf, x0: i32, y0: i32, nx: i32, ny: i32) -> PyResult<Self> {
        Ok(Self {
            grid: Grid::load_clip_of_data(path, x0, y0, nx, ny).map_err(to_py_err)?,
        })
    }

    /// Serializes this grid to `path` under its current subgrid table.
    pub fn write_file(&self, path: PathBuf) -> PyResult<()> {
        self.grid.write_file(path).map_err(to_py_err)
    }

    /// Re-partitions this grid into `p * q * r` subgrids, writing the result to `out_path`
    /// and emitting `out_path.dist` alongside it.
    pub fn distribute(&self, p: i32, q: i32, r: i32, out_path: PathBuf) -> PyResult<()> {
        self.grid.dist_file(p, q, r, out_path).map_err(to_py_err)
    }

    /// Cell data as a zero-copy `numpy.ndarray` of shape `(nz, ny, nx)`, matching the
    /// canonical z-major storage order.
    pub fn data<'py>(&self, py: Python<'py>) -> PyResult<&'py PyArray3<f64>> {
        if self.grid.order() != Order::Zyx {
            return Err(PyRuntimeError::new_err(
                "data() requires zyx storage order",
            ));
        }
        let (nx, ny, nz) = self.grid.geometry().extent();
        let values = self.grid.copy_data_array().ok_or_else(|| {
            PyRuntimeError::new_err("grid has no storage; call a load method first")
        })?;
        let array = Array3::from_shape_vec((nz as usize, ny as usize, nx as usize), values)
            .map_err(|err| PyRuntimeError::new_err(err.to_string()))?;
        Ok(array.into_pyarray(py))
    }

    /// Extents `(nx, ny, nz)`.
    pub fn extent(&self) -> (i32, i32, i32) {
        self.grid.geometry().extent()
    }

    /// Origin `(x, y, z)`.
    pub fn origin(&self) -> (f64, f64, f64) {
        self.grid.geometry().origin()
    }

    /// Spacing `(dx, dy, dz)`.
    pub fn spacing(&self) -> (f64, f64, f64) {
        self.grid.geometry().spacing()
    }

    /// Partition counts `(P, Q, R)`.
    pub fn partition(&self) -> (i32, i32, i32) {
        self.grid.geometry().partition()
    }

    /// Reads the cell value at `(x, y, z)`.
    pub fn at(&self, x: i32, y: i32, z: i32) -> PyResult<f64> {
        self.grid.at(x, y, z).map_err(to_py_err)
    }

    /// Compares this grid against `other`, returning `None` if they agree cell-for-cell or a
    /// short description of the first divergence otherwise.
    pub fn compare(&self, other: &Self) -> Option<String> {
        match self.grid.compare(&other.grid) {
            Difference::None => None,
            Difference::X => Some("x".to_string()),
            Difference::Y => Some("y".to_string()),
            Difference::Z => Some("z".to_string()),
            Difference::Dx => Some("dx".to_string()),
            Difference::Dy => Some("dy".to_string()),
            Difference::Dz => Some("dz".to_string()),
            Difference::Nx => Some("nx".to_string()),
            Difference::Ny => Some("ny".to_string()),
            Difference::Nz => Some("nz".to_string()),
            Difference::P => Some("p".to_string()),
            Difference::Q => Some("q".to_string()),
            Difference::R => Some("r".to_string()),
            Difference::Data { z, y, x } => Some(format!("data({z}, {y}, {x})")),
        }
    }
}
