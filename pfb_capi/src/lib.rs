//! C ABI for the `pfb` crate: opaque handles, a thread-local last-error slot, and
//! `c_int` 0/non-zero return codes in place of `Result`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_double, c_int};
use std::ptr;

use pfb::{Difference, Grid, Order};

thread_local!(static LAST_ERROR: RefCell<CString> = RefCell::new(CString::new("").unwrap()));

fn set_last_error(err: pfb::Error) {
    let message = err.to_string();
    LAST_ERROR.with(|slot| {
        slot.replace(CString::new(message).unwrap_or_else(|_| CString::new("unknown error").unwrap()));
    });
}

/// Returns the last error message set by a failing call on this thread, or an empty string
/// if none has occurred yet.
#[no_mangle]
pub extern "C" fn pfb_last_error() -> *const c_char {
    LAST_ERROR.with(|slot| slot.borrow().as_ptr())
}

pub const PFB_OK: c_int = 0;
pub const PFB_ERR: c_int = 1;

/// Opaque handle wrapping a [`pfb::Grid`].
pub struct PfbGrid {
    inner: Grid,
}

fn path_from_c(c_path: *const c_char) -> Result<std::path::PathBuf, ()> {
    if c_path.is_null() {
        return Err(());
    }
    let cstr = unsafe { CStr::from_ptr(c_path) };
    cstr.to_str().map(std::path::PathBuf::from).map_err(|_| ())
}

/// Reads a whole PFB file into a new grid. Returns null on failure; call
/// [`pfb_last_error`] for the reason.
#[no_mangle]
pub extern "C" fn pfb_grid_load_data(c_path: *const c_char) -> *mut PfbGrid {
    let Ok(path) = path_from_c(c_path) else {
        return ptr::null_mut();
    };
    match Grid::load_data(path) {
        Ok(inner) => Box::into_raw(Box::new(PfbGrid { inner })),
        Err(err) => {
            set_last_error(err);
            ptr::null_mut()
        }
    }
}

/// Reads only the file header into a new grid, without allocating storage. Returns null on
/// failure; call [`pfb_last_error`] for the reason.
#[no_mangle]
pub extern "C" fn pfb_grid_load_header(c_path: *const c_char) -> *mut PfbGrid {
    let Ok(path) = path_from_c(c_path) else {
        return ptr::null_mut();
    };
    match Grid::load_header(path) {
        Ok(inner) => Box::into_raw(Box::new(PfbGrid { inner })),
        Err(err) => {
            set_last_error(err);
            ptr::null_mut()
        }
    }
}

/// Reads a whole PFB file using `num_workers` worker threads. Returns null on failure; call
/// [`pfb_last_error`] for the reason.
#[no_mangle]
pub extern "C" fn pfb_grid_load_data_threaded(
    c_path: *const c_char,
    num_workers: usize,
) -> *mut PfbGrid {
    let Ok(path) = path_from_c(c_path) else {
        return ptr::null_mut();
    };
    match Grid::load_data_threaded(path, num_workers) {
        Ok(inner) => Box::into_raw(Box::new(PfbGrid { inner })),
        Err(err) => {
            set_last_error(err);
            ptr::null_mut()
        }
    }
}

/// Reads a rectangular clip spanning the full z-range. Returns null on failure; call
/// [`pfb_last_error`] for the reason.
#[no_mangle]
pub extern "C" fn pfb_grid_load_clip(
    c_path: *const c_char,
    x0: c_int,
    y0: c_int,
    nx: c_int,
    ny: c_int,
) -> *mut PfbGrid {
    let Ok(path) = path_from_c(c_path) else {
        return ptr::null_mut();
    };
    match Grid::load_clip_of_data(path, x0, y0, nx, ny) {
        Ok(inner) => Box::into_raw(Box::new(PfbGrid { inner })),
        Err(err) => {
            set_last_error(err);
            ptr::null_mut()
        }
    }
}

/// Deletes a grid handle. A null pointer is accepted and ignored.
#[no_mangle]
pub extern "C" fn pfb_grid_delete(c_ptr: *mut PfbGrid) {
    if !c_ptr.is_null() {
        unsafe {
            let _ = Box::from_raw(c_ptr);
        }
    }
}

/// Writes a grid to `c_path`. Returns [`PFB_OK`] on success, [`PFB_ERR`] otherwise.
#[no_mangle]
pub extern "C" fn pfb_grid_write_file(c_ptr: *const PfbGrid, c_path: *const c_char) -> c_int {
    assert!(!c_ptr.is_null(), "null grid pointer");
    let Ok(path) = path_from_c(c_path) else {
        return PFB_ERR;
    };
    let grid: &PfbGrid = unsafe { &*c_ptr };
    match grid.inner.write_file(path) {
        Ok(()) => PFB_OK,
        Err(err) => {
            set_last_error(err);
            PFB_ERR
        }
    }
}

/// Rebuilds the subgrid table for `(p, q, r)`, writes it to `out_path`, and emits the
/// `.dist` sidecar. Returns [`PFB_OK`] on success, [`PFB_ERR`] otherwise.
#[no_mangle]
pub extern "C" fn pfb_grid_dist_file(
    c_ptr: *const PfbGrid,
    p: c_int,
    q: c_int,
    r: c_int,
    c_out_path: *const c_char,
) -> c_int {
    assert!(!c_ptr.is_null(), "null grid pointer");
    let Ok(out_path) = path_from_c(c_out_path) else {
        return PFB_ERR;
    };
    let grid: &PfbGrid = unsafe { &*c_ptr };
    match grid.inner.dist_file(p, q, r, out_path) {
        Ok(()) => PFB_OK,
        Err(err) => {
            set_last_error(err);
            PFB_ERR
        }
    }
}

/// Returns the extents `(nx, ny, nz)` via out-parameters.
#[no_mangle]
pub extern "C" fn pfb_grid_extent(
    c_ptr: *const PfbGrid,
    nx: *mut c_int,
    ny: *mut c_int,
    nz: *mut c_int,
) {
    assert!(!c_ptr.is_null(), "null grid pointer");
    let grid: &PfbGrid = unsafe { &*c_ptr };
    let (gnx, gny, gnz) = grid.inner.geometry().extent();
    unsafe {
        if !nx.is_null() {
            *nx = gnx;
        }
        if !ny.is_null() {
            *ny = gny;
        }
        if !nz.is_null() {
            *nz = gnz;
        }
    }
}

/// Returns the cell value at `(x, y, z)`. Writes `NAN` to `*out` and returns [`PFB_ERR`] if
/// the coordinate is out of bounds or storage is absent.
#[no_mangle]
pub extern "C" fn pfb_grid_at(
    c_ptr: *const PfbGrid,
    x: c_int,
    y: c_int,
    z: c_int,
    out: *mut c_double,
) -> c_int {
    assert!(!c_ptr.is_null(), "null grid pointer");
    assert!(!out.is_null(), "null output pointer");
    let grid: &PfbGrid = unsafe { &*c_ptr };
    match grid.inner.at(x, y, z) {
        Ok(value) => {
            unsafe {
                *out = value;
            }
            PFB_OK
        }
        Err(err) => {
            unsafe {
                *out = f64::NAN;
            }
            set_last_error(err);
            PFB_ERR
        }
    }
}

/// Compares two grids. Writes one of the `PFB_DIFF_*` constants to `*out_kind` and, for a
/// data mismatch, the cell coordinate to `*out_z`/`*out_y`/`*out_x`. Always returns
/// [`PFB_OK`]; the Differ never fails.
#[no_mangle]
pub extern "C" fn pfb_grid_compare(
    a_ptr: *const PfbGrid,
    b_ptr: *const PfbGrid,
    out_kind: *mut c_int,
    out_z: *mut c_int,
    out_y: *mut c_int,
    out_x: *mut c_int,
) -> c_int {
    assert!(!a_ptr.is_null(), "null grid pointer");
    assert!(!b_ptr.is_null(), "null grid pointer");
    let a: &PfbGrid = unsafe { &*a_ptr };
    let b: &PfbGrid = unsafe { &*b_ptr };
    let difference = a.inner.compare(&b.inner);

    let (kind, z, y, x) = match difference {
        Difference::None => (PFB_DIFF_NONE, 0, 0, 0),
        Difference::X => (PFB_DIFF_X, 0, 0, 0),
        Difference::Y => (PFB_DIFF_Y, 0, 0, 0),
        Difference::Z => (PFB_DIFF_Z, 0, 0, 0),
        Difference::Dx => (PFB_DIFF_DX, 0, 0, 0),
        Difference::Dy => (PFB_DIFF_DY, 0, 0, 0),
        Difference::Dz => (PFB_DIFF_DZ, 0, 0, 0),
        Difference::Nx => (PFB_DIFF_NX, 0, 0, 0),
        Difference::Ny => (PFB_DIFF_NY, 0, 0, 0),
        Difference::Nz => (PFB_DIFF_NZ, 0, 0, 0),
        Difference::P => (PFB_DIFF_P, 0, 0, 0),
        Difference::Q => (PFB_DIFF_Q, 0, 0, 0),
        Difference::R => (PFB_DIFF_R, 0, 0, 0),
        Difference::Data { z, y, x } => (PFB_DIFF_DATA, z, y, x),
    };

    unsafe {
        if !out_kind.is_null() {
            *out_kind = kind;
        }
        if !out_z.is_null() {
            *out_z = z;
        }
        if !out_y.is_null() {
            *out_y = y;
        }
        if !out_x.is_null() {
            *out_x = x;
        }
    }
    PFB_OK
}

pub const PFB_DIFF_NONE: c_int = 0;
pub const PFB_DIFF_X: c_int = 1;
pub const PFB_DIFF_Y: c_int = 2;
pub const PFB_DIFF_Z: c_int = 3;
pub const PFB_DIFF_DX: c_int = 4;
pub const PFB_DIFF_DY: c_int = 5;
pub const PFB_DIFF_DZ: c_int = 6;
pub const PFB_DIFF_NX: c_int = 7;
pub const PFB_DIFF_NY: c_int = 8;
pub const PFB_DIFF_NZ: c_int = 9;
pub const PFB_DIFF_P: c_int = 10;
pub const PFB_DIFF_Q: c_int = 11;
pub const PFB_DIFF_R: c_int = 12;
pub const PFB_DIFF_DATA: c_int = 13;

/// Returns `true` if the grid's storage order is the canonical `zyx` layout writable to
/// disk.
#[no_mangle]
pub extern "C" fn pfb_grid_is_zyx(c_ptr: *const PfbGrid) -> bool {
    assert!(!c_ptr.is_null(), "null grid pointer");
    let grid: &PfbGrid = unsafe { &*c_ptr };
    matches!(grid.inner.order(), Order::Zyx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn load_data_of_missing_file_returns_null_and_sets_error() {
        let path = CString::new("/nonexistent/path/to/nowhere.pfb").unwrap();
        let handle = pfb_grid_load_data(path.as_ptr());
        assert!(handle.is_null());
        let message = unsafe { CStr::from_ptr(pfb_last_error()) };
        assert!(!message.to_str().unwrap().is_empty());
    }

    #[test]
    fn write_then_load_round_trips_through_the_c_abi() {
        use pfb::GridGeometry;

        let geometry =
            GridGeometry::new((0.0, 0.0, 0.0), (2, 2, 2), (1.0, 1.0, 1.0), (1, 1, 1)).unwrap();
        let grid = Grid::from_buffer(geometry, vec![1.0; 8]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grid.pfb");
        grid.write_file(&path).unwrap();

        let c_path = CString::new(path.to_str().unwrap()).unwrap();
        let handle = pfb_grid_load_data(c_path.as_ptr());
        assert!(!handle.is_null());

        let mut out = 0.0;
        let rc = pfb_grid_at(handle, 0, 0, 0, &mut out);
        assert_eq!(rc, PFB_OK);
        assert_eq!(out, 1.0);

        pfb_grid_delete(handle);
    }
}
