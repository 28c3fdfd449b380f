// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Scoped access to one data file.
//!
//! [`DataFile`] initializes the library and opens a file on creation, and
//! closes the file and de-initializes the library when dropped.

use std::{
    ops::Deref,
    path::{Path, PathBuf},
};

use crate::{DwDataReader, Error, FileInfo, Result, api::DwApiHandle};

/// An open data file, with the library initialized around it.
///
/// All read operations of [`DwDataReader`] are available through `Deref`.
/// The library holds one global state per process, so only one `DataFile`
/// can be alive at a time, and no [`DwDataReader`] can initialize the library
/// while it is.
///
/// # Examples
///
/// ```no_run
/// use dwdat::{DataFile, Reduction, TextEncoding, load_default_api};
///
/// # fn main() -> Result<(), dwdat::Error> {
/// let file = DataFile::open(load_default_api()?, "Test2.dxd")?;
/// println!("{:?}", file.file_info());
/// let channels = file.get_channel_list(TextEncoding::Latin1)?;
/// for ch in &channels {
///     // average value of each block
///     println!("{:?}", file.channel_reduced(ch, Reduction::Ave, TextEncoding::Latin1)?);
/// }
/// // time stamps of the blocks
/// let time = file.channel_reduced(channels[0].index, Reduction::TimeStamp, TextEncoding::Latin1)?;
/// file.close()?;
/// # Ok(())
/// # }
/// ```
pub struct DataFile {
    reader: DwDataReader,
    path: PathBuf,
    file_info: FileInfo,
}

impl DataFile {
    /// Initializes the library and opens `path`.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionActive`] if another `DataFile` or a reader holds the
    ///   library
    /// - any error from [`DwDataReader::init`] or [`DwDataReader::open_data_file`];
    ///   the library is de-initialized again when opening fails
    pub fn open<P: AsRef<Path>>(api: DwApiHandle, path: P) -> Result<Self> {
        let reader = DwDataReader::new(api);
        reader.init().map_err(|err| match err {
            Error::AlreadyInitialized => Error::SessionActive,
            other => other,
        })?;
        let path = path.as_ref().to_path_buf();
        let file_info = match reader.open_data_file(&path) {
            Ok(info) => info,
            Err(err) => {
                if let Err(de_init_err) = reader.de_init() {
                    tracing::error!(
                        "Failed to de-initialize DWDataReader after open error: {:?}",
                        de_init_err
                    );
                }
                return Err(err);
            }
        };
        Ok(Self {
            reader,
            path,
            file_info,
        })
    }

    /// Returns the file information reported when the file was opened.
    pub fn file_info(&self) -> &FileInfo {
        &self.file_info
    }

    /// Returns the path the file was opened with.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Closes the file and de-initializes the library, reporting failures.
    ///
    /// Dropping a `DataFile` does the same but can only log failures.
    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        let closed = if self.reader.is_file_open() {
            self.reader.close_data_file()
        } else {
            Ok(())
        };
        let de_initialized = if self.reader.is_initialized() {
            self.reader.de_init()
        } else {
            Ok(())
        };
        closed.and(de_initialized)
    }
}

impl Deref for DataFile {
    type Target = DwDataReader;

    fn deref(&self) -> &Self::Target {
        &self.reader
    }
}

impl Drop for DataFile {
    /// Closes the file and de-initializes the library if still needed.
    fn drop(&mut self) {
        if let Err(err) = self.close_inner() {
            tracing::error!(
                "Failed to close DWDataReader file \"{}\": {:?}",
                self.path.display(),
                err
            );
        }
    }
}
