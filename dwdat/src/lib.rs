// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! # dwdat - DWDataReader bindings
//!
//! Safe Rust wrappers around DEWESoft's proprietary `DWDataReaderLib` shared
//! library, a reader for DEWESoft measurement files (`.dxd`, `.d7d`).
//!
//! ## Overview
//!
//! All file interpretation happens inside the vendor library. This crate loads
//! the library at runtime ([`dwdat_sys`]), passes arguments across the C ABI,
//! copies the fixed-layout result structs into owned Rust records and maps
//! status codes to [`Error`].
//!
//! Get the library from DEWESoft's developer pages and point the crate at its
//! directory with the `DEWELIBDIR` environment variable or a `dewelibdir`
//! config file, see [`config`].
//!
//! ## Architecture
//!
//! ```text
//! config::find_lib_dir ──► load_api ──► DwApiHandle
//!                                          │
//!                                          ├─► DwDataReader   (one method per entry point)
//!                                          │
//!                                          └─► DataFile       (init + open ... close + de-init)
//!                                                └─ Deref ─► DwDataReader
//! ```
//!
//! ## Examples
//!
//! ```no_run
//! use dwdat::{DataFile, Reduction, TextEncoding, load_default_api};
//!
//! # fn main() -> Result<(), dwdat::Error> {
//! let file = DataFile::open(load_default_api()?, "Example_Drive01.d7d")?;
//! println!("sample rate: {} Hz", file.file_info().sample_rate);
//!
//! for ch in file.get_channel_list(TextEncoding::Latin1)? {
//!     let (count, block_size) = file.get_reduced_values_count(ch.index)?;
//!     println!("{} [{}]: {} blocks of {} s", ch.name, ch.unit, count, block_size);
//! }
//!
//! let max = file.channel_reduced("Speed", Reduction::Max, TextEncoding::Latin1)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! The vendor library has one global state per process. The crate tracks it in
//! a single process-wide slot: the first reader (or [`DataFile`]) to initialize
//! the library owns it until it de-initializes or is dropped, and every other
//! reader gets [`Error::NotInitialized`] or [`Error::AlreadyInitialized`].
//! Native calls are serialized on that slot, so [`DwDataReader`] and
//! [`DataFile`] are `Send` and `Sync`.

mod api;
mod data;
mod error;
mod reader;
mod session;

pub mod config;

pub use api::{DwApi, DwApiHandle, load_api, load_api_from_dir, load_default_api};
pub use data::{
    ArrayInfo, Channel, ChannelRef, DataType, Event, EventType, FileInfo, ReducedValue,
    Reduction, Sample, TextEncoding, find_channel,
};
pub use error::{Error, Result};
pub use reader::{DwDataReader, ScaledSamples};
pub use session::DataFile;
