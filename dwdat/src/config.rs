// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Runtime lookup of the DWDataReader library directory.
//!
//! The proprietary library is not shipped with this crate, so its location
//! comes from the environment:
//!
//! 1. The `DEWELIBDIR` environment variable, if set.
//! 2. Otherwise a config file named `dewelibdir` (or `dewelibdir.txt`,
//!    `dewelibdir.pth`) in `$XDG_CONFIG_HOME` or `~/.config` on Unix, or in the
//!    user profile directory on Windows.
//!
//! In the config file blank lines and lines starting with `#` are skipped. The
//! first other line is the directory path.
//!
//! ```text
//! # ~/.config/dewelibdir
//! /opt/dewesoft/DWDataReader
//! ```

use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Environment variable naming the library directory.
pub const LIB_DIR_ENV: &str = "DEWELIBDIR";

/// Base name of the config file holding the library directory.
pub const CONFIG_BASENAME: &str = "dewelibdir";

/// Extensions tried for the config file, in order.
const CONFIG_EXTENSIONS: [&str; 3] = ["", ".txt", ".pth"];

/// Returns the platform file name of the vendor library.
///
/// `DWDataReaderLib64.so` on 64-bit Linux, `DWDataReaderLib64.dll` on 64-bit
/// Windows, without the `64` suffix on 32-bit targets.
pub fn lib_file_name() -> &'static str {
    if cfg!(all(target_pointer_width = "64", windows)) {
        "DWDataReaderLib64.dll"
    } else if cfg!(windows) {
        "DWDataReaderLib.dll"
    } else if cfg!(target_pointer_width = "64") {
        "DWDataReaderLib64.so"
    } else {
        "DWDataReaderLib.so"
    }
}

/// Returns the path of the vendor library inside `lib_dir`.
pub fn lib_path<P: AsRef<Path>>(lib_dir: P) -> PathBuf {
    lib_dir.as_ref().join(lib_file_name())
}

/// Returns the directory searched for the config file.
///
/// # Errors
///
/// Returns [`Error::Other`] if the home directory cannot be determined.
pub fn config_dir() -> Result<PathBuf> {
    let home_var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    if !cfg!(windows)
        && let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty())
    {
        return Ok(PathBuf::from(xdg));
    }
    let home = std::env::var_os(home_var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| Error::Other(format!("{home_var} is not set.")))?;
    if cfg!(windows) {
        Ok(home)
    } else {
        Ok(home.join(".config"))
    }
}

/// Resolves the library directory from `DEWELIBDIR` or the user config file.
///
/// # Errors
///
/// - [`Error::LibDirNotFound`] if the configured directory does not exist
/// - [`Error::ConfigDirNotFound`] if `DEWELIBDIR` is unset and the config
///   directory does not exist
/// - [`Error::ConfigFileNotFound`] if no config file exists
/// - [`Error::NoLibDirInConfig`] if the config file holds no path
///
/// # Examples
///
/// ```no_run
/// # fn main() -> Result<(), dwdat::Error> {
/// let dir = dwdat::config::find_lib_dir()?;
/// let api = dwdat::load_api_from_dir(dir)?;
/// # Ok(())
/// # }
/// ```
pub fn find_lib_dir() -> Result<PathBuf> {
    LibDirLookup::from_env()?.resolve()
}

/// Explicit form of [`find_lib_dir`], without reading the process environment.
#[derive(Debug, Clone)]
pub struct LibDirLookup {
    /// Value of `DEWELIBDIR`, if set.
    pub env_value: Option<OsString>,
    /// Directory searched for the config file.
    pub config_dir: PathBuf,
    /// Base name of the config file, before the extensions are tried.
    pub config_basename: String,
}

impl LibDirLookup {
    /// Captures `DEWELIBDIR` and the default config directory.
    pub fn from_env() -> Result<Self> {
        let env_value = std::env::var_os(LIB_DIR_ENV).filter(|v| !v.is_empty());
        // The config directory is only needed when the variable is unset.
        let config_dir = match (&env_value, config_dir()) {
            (_, Ok(dir)) => dir,
            (Some(_), Err(_)) => PathBuf::new(),
            (None, Err(err)) => return Err(err),
        };
        Ok(Self {
            env_value,
            config_dir,
            config_basename: CONFIG_BASENAME.to_string(),
        })
    }

    /// Runs the lookup.
    pub fn resolve(&self) -> Result<PathBuf> {
        if let Some(value) = &self.env_value {
            let dir = PathBuf::from(value);
            return existing_dir(dir);
        }

        if !self.config_dir.exists() {
            return Err(Error::ConfigDirNotFound(self.config_dir.clone()));
        }

        let (config_file, contents) = self
            .read_config_file()?
            .ok_or_else(|| Error::ConfigFileNotFound(self.config_dir.clone()))?;

        match first_path_line(&contents) {
            Some(line) => existing_dir(bytes_to_path(line)),
            None => Err(Error::NoLibDirInConfig(config_file)),
        }
    }

    /// Reads the first config file found, trying each extension in order.
    fn read_config_file(&self) -> Result<Option<(PathBuf, Vec<u8>)>> {
        for ext in CONFIG_EXTENSIONS {
            let path = self
                .config_dir
                .join(format!("{}{}", self.config_basename, ext));
            match fs::read(&path) {
                Ok(contents) => {
                    tracing::debug!("Reading library directory from {}", path.display());
                    return Ok(Some((path, contents)));
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => continue,
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}

fn existing_dir(dir: PathBuf) -> Result<PathBuf> {
    if dir.exists() {
        Ok(dir)
    } else {
        Err(Error::LibDirNotFound(dir))
    }
}

/// Returns the first line that is neither blank nor a `#` comment, trimmed.
fn first_path_line(contents: &[u8]) -> Option<&[u8]> {
    contents
        .split(|&b| b == b'\n')
        .map(<[u8]>::trim_ascii)
        .find(|line| !line.is_empty() && !line.starts_with(b"#"))
}

/// Config files hold a path in the platform's byte encoding.
#[cfg(unix)]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
