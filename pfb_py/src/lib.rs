//! Python bindings to `pfb`, exposing [`grid::PyGrid`] as a `pfb.Grid` class.

use pyo3::prelude::*;

mod grid;

/// PyO3 extension module registered as `pfb` (see `[package.metadata.maturin]`).
#[pymodule]
fn pfb(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<grid::PyGrid>()?;
    Ok(())
}
