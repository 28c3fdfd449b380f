// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Loading of the DWDataReader shared library.

use std::{ffi::OsStr, path::Path, sync::Arc};

use crate::{Result, config};

/// The loaded library and its resolved entry points.
pub type DwApi = dwdat_sys::DWDataReaderLib;

/// Shared handle to the loaded library.
pub type DwApiHandle = Arc<DwApi>;

/// Loads the library at `path` and resolves every entry point.
///
/// # Errors
///
/// Returns [`crate::Error::LibLoading`] if the file cannot be loaded or a
/// symbol is missing (library older than 4.0.0.0).
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), dwdat::Error> {
/// let api = dwdat::load_api("/opt/dewe/DWDataReaderLib64.so")?;
/// # Ok(())
/// # }
/// ```
pub fn load_api<P: AsRef<OsStr>>(path: P) -> Result<DwApiHandle> {
    tracing::debug!("Loading DWDataReader library from {:?}", path.as_ref());
    // Safety: loading runs the library's initializers; the vendor library has
    // no load-time requirements beyond being the right architecture.
    let api = unsafe { DwApi::new(path)? };
    Ok(Arc::new(api))
}

/// Loads the library from the directory `lib_dir`, using the platform file name.
pub fn load_api_from_dir<P: AsRef<Path>>(lib_dir: P) -> Result<DwApiHandle> {
    load_api(config::lib_path(lib_dir))
}

/// Loads the library from the directory found by [`config::find_lib_dir`].
pub fn load_default_api() -> Result<DwApiHandle> {
    load_api_from_dir(config::find_lib_dir()?)
}
