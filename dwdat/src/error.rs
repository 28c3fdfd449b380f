// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Error types for DWDataReader operations.
//!
//! This module maps the library's `DWStatus` codes to Rust error variants and
//! adds the failures that happen on the Rust side of the boundary (library
//! lookup, loading, misuse of the open/close sequence).

use std::path::PathBuf;

/// Convenience result type using [`Error`] as the error variant.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors that can occur when using the DWDataReader API.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// `DWSTAT_ERROR`: the library reported an unspecified failure.
    #[error("DWDataReader error")]
    Generic,

    /// `DWSTAT_ERROR_FILE_CANNOT_OPEN`
    #[error("Data file cannot be opened")]
    FileCannotOpen,

    /// `DWSTAT_ERROR_FILE_ALREADY_IN_USE`
    #[error("Data file is already in use")]
    FileAlreadyInUse,

    /// `DWSTAT_ERROR_FILE_CORRUPT`
    #[error("Data file is corrupt")]
    FileCorrupt,

    /// `DWSTAT_ERROR_NO_MEMORY_ALLOC`
    #[error("Library failed to allocate memory")]
    NoMemoryAlloc,

    /// `DWSTAT_ERROR_CREATE_DEST_FILE`
    #[error("Cannot create destination file")]
    CreateDestFile,

    /// `DWSTAT_ERROR_EXTRACTING_FILE`
    #[error("Error extracting file")]
    ExtractingFile,

    /// `DWSTAT_ERROR_CANNOT_OPEN_EXTRACTED_FILE`
    #[error("Cannot open extracted file")]
    CannotOpenExtractedFile,

    /// A status code not known to this crate.
    #[error("Unknown status code: {0}")]
    Unknown(dwdat_sys::Status),

    /// A count query returned a negative value.
    #[error("{0} returned an invalid count ({1})")]
    InvalidCount(&'static str, i64),

    /// No channel matched the requested index or name.
    #[error("Channel {0} not found in data")]
    ChannelNotFound(String),

    /// An operation that needs `DWInit` was called before it, or by a reader
    /// that does not own the library.
    #[error("Library is not initialized")]
    NotInitialized,

    /// `init` was called while the library is initialized, by this or another reader.
    #[error("Library is already initialized")]
    AlreadyInitialized,

    /// An operation that needs an open data file was called without one.
    #[error("No data file is open")]
    NoFileOpen,

    /// A second data file was opened while one is still open.
    #[error("A data file is already open")]
    FileAlreadyOpen,

    /// Another [`crate::DataFile`] or reader holds the library in this process.
    #[error("Another data file session is active")]
    SessionActive,

    /// The library directory from `DEWELIBDIR` or the config file does not exist.
    #[error("Library directory not found: {}", .0.display())]
    LibDirNotFound(PathBuf),

    /// The configuration directory does not exist.
    #[error("Config directory not found: {}", .0.display())]
    ConfigDirNotFound(PathBuf),

    /// None of the candidate config files exist.
    #[error("No config file found in {}", .0.display())]
    ConfigFileNotFound(PathBuf),

    /// The config file exists but holds no library path.
    #[error("{} found but no library path in it", .0.display())]
    NoLibDirInConfig(PathBuf),

    /// A generic error for Rust-level failures not mapped to a status code.
    #[error("Other error: {0}")]
    Other(String),

    /// Failed to read a config file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to convert a file name to a C-compatible null-terminated string.
    #[error("Null string: {0}")]
    NulString(#[from] std::ffi::NulError),

    /// Failed to load the shared library or resolve one of its symbols.
    #[error("Loading library: {0}")]
    LibLoading(#[from] libloading::Error),
}

impl Error {
    /// Converts a `DWStatus` code to a Rust [`Result`].
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let status = unsafe { api.close_data_file() };
    /// Error::from_status(status)?;
    /// ```
    pub fn from_status(status: dwdat_sys::Status) -> Result<()> {
        match status {
            dwdat_sys::DWSTAT_OK => Ok(()),
            dwdat_sys::DWSTAT_ERROR => Err(Error::Generic),
            dwdat_sys::DWSTAT_ERROR_FILE_CANNOT_OPEN => Err(Error::FileCannotOpen),
            dwdat_sys::DWSTAT_ERROR_FILE_ALREADY_IN_USE => Err(Error::FileAlreadyInUse),
            dwdat_sys::DWSTAT_ERROR_FILE_CORRUPT => Err(Error::FileCorrupt),
            dwdat_sys::DWSTAT_ERROR_NO_MEMORY_ALLOC => Err(Error::NoMemoryAlloc),
            dwdat_sys::DWSTAT_ERROR_CREATE_DEST_FILE => Err(Error::CreateDestFile),
            dwdat_sys::DWSTAT_ERROR_EXTRACTING_FILE => Err(Error::ExtractingFile),
            dwdat_sys::DWSTAT_ERROR_CANNOT_OPEN_EXTRACTED_FILE => {
                Err(Error::CannotOpenExtractedFile)
            }
            other => Err(Error::Unknown(other)),
        }
    }

    /// Returns the vendor's name for the status this error came from, if any.
    pub fn status_name(&self) -> Option<&'static str> {
        Some(match self {
            Error::Generic => "DWSTAT_ERROR",
            Error::FileCannotOpen => "DWSTAT_ERROR_FILE_CANNOT_OPEN",
            Error::FileAlreadyInUse => "DWSTAT_ERROR_FILE_ALREADY_IN_USE",
            Error::FileCorrupt => "DWSTAT_ERROR_FILE_CORRUPT",
            Error::NoMemoryAlloc => "DWSTAT_ERROR_NO_MEMORY_ALLOC",
            Error::CreateDestFile => "DWSTAT_ERROR_CREATE_DEST_FILE",
            Error::ExtractingFile => "DWSTAT_ERROR_EXTRACTING_FILE",
            Error::CannotOpenExtractedFile => "DWSTAT_ERROR_CANNOT_OPEN_EXTRACTED_FILE",
            _ => return None,
        })
    }
}
