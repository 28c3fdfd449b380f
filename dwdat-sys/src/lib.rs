// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! # dwdat-sys: Raw FFI declarations for DWDataReaderLib
//!
//! This crate mirrors the C ABI of the DEWESoft `DWDataReaderLib` shared library
//! (version 4.0.0.0 or later): status codes, enumerations, fixed-layout structs,
//! and a table of entry points resolved at runtime with `libloading`.
//!
//! ## Usage
//!
//! **Most users should NOT use this crate directly.** Use the safe [`dwdat`]
//! wrapper crate instead, which provides:
//! - Rust-idiomatic error handling with `Result`
//! - Owned, decoded records instead of raw `char` arrays
//! - An RAII session pairing init/open with close/de-init
//!
//! ## Safety
//!
//! All functions in this crate are `unsafe` and require the caller to uphold the
//! vendor library's invariants:
//! - `DWInit` must be called before any other entry point
//! - Only one data file may be open at a time (the library keeps global state)
//! - `DWCloseDataFile` must only be called while a file is open
//! - Output buffers must be large enough for the count the library reports
//!
//! The library is proprietary and is not shipped with this crate. It is loaded
//! from a path at runtime, see [`DWDataReaderLib::new`].
//!
//! [`dwdat`]: https://docs.rs/dwdat

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]
#![allow(clippy::too_many_arguments)]
#![allow(unsafe_op_in_unsafe_fn)]

extern crate libloading;

use std::os::raw::{c_char, c_double, c_int, c_uint, c_ulong};

/// Status code returned by most entry points.
pub type Status = c_int;
pub const DWSTAT_OK: Status = 0;
pub const DWSTAT_ERROR: Status = 1;
pub const DWSTAT_ERROR_FILE_CANNOT_OPEN: Status = 2;
pub const DWSTAT_ERROR_FILE_ALREADY_IN_USE: Status = 3;
pub const DWSTAT_ERROR_FILE_CORRUPT: Status = 4;
pub const DWSTAT_ERROR_NO_MEMORY_ALLOC: Status = 5;
pub const DWSTAT_ERROR_CREATE_DEST_FILE: Status = 6;
pub const DWSTAT_ERROR_EXTRACTING_FILE: Status = 7;
pub const DWSTAT_ERROR_CANNOT_OPEN_EXTRACTED_FILE: Status = 8;

pub type ChannelProps = c_int;
pub const DW_DATA_TYPE: ChannelProps = 0;
pub const DW_DATA_TYPE_LEN_BYTES: ChannelProps = 1;
pub const DW_CH_INDEX: ChannelProps = 2;
pub const DW_CH_INDEX_LEN: ChannelProps = 3;
pub const DW_CH_TYPE: ChannelProps = 4;
pub const DW_CH_SCALE: ChannelProps = 5;
pub const DW_CH_OFFSET: ChannelProps = 6;
pub const DW_CH_XML: ChannelProps = 7;
pub const DW_CH_XML_LEN: ChannelProps = 8;
pub const DW_CH_XMLPROPS: ChannelProps = 9;
pub const DW_CH_XMLPROPS_LEN: ChannelProps = 10;

pub type ChannelType = c_int;
pub const DW_CH_TYPE_SYNC: ChannelType = 0;
pub const DW_CH_TYPE_ASYNC: ChannelType = 1;
pub const DW_CH_TYPE_SV: ChannelType = 2;

pub type EventType = c_int;
pub const etStart: EventType = 1;
pub const etStop: EventType = 2;
pub const etTrigger: EventType = 3;
pub const etVStart: EventType = 11;
pub const etVStop: EventType = 12;
pub const etKeyboard: EventType = 20;
pub const etNotice: EventType = 21;
pub const etVoice: EventType = 22;
pub const etModule: EventType = 24;

pub type StoreType = c_int;
pub const ST_ALWAYS_FAST: StoreType = 0;
pub const ST_ALWAYS_SLOW: StoreType = 1;
pub const ST_FAST_ON_TRIGGER: StoreType = 2;
pub const ST_FAST_ON_TRIGGER_SLOW_OTH: StoreType = 3;

pub type DataType = c_int;
pub const dtByte: DataType = 0;
pub const dtShortInt: DataType = 1;
pub const dtSmallInt: DataType = 2;
pub const dtWord: DataType = 3;
pub const dtInteger: DataType = 4;
pub const dtSingle: DataType = 5;
pub const dtInt64: DataType = 6;
pub const dtDouble: DataType = 7;
pub const dtLongword: DataType = 8;
pub const dtComplexSingle: DataType = 9;
pub const dtComplexDouble: DataType = 10;
pub const dtText: DataType = 11;
pub const dtBinary: DataType = 12;
pub const dtCANPortData: DataType = 13;

/// Length of `Channel::name` and `ArrayInfo::name`.
pub const NAME_LEN: usize = 100;
/// Length of `Channel::unit` and `ArrayInfo::unit`.
pub const UNIT_LEN: usize = 20;
/// Length of `Channel::description`.
pub const DESCRIPTION_LEN: usize = 200;
/// Length of `Event::event_text`.
pub const EVENT_TEXT_LEN: usize = 200;

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct FileInfo {
    pub sample_rate: c_double,
    pub start_store_time: c_double,
    pub duration: c_double,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Channel {
    pub index: c_int,
    pub name: [c_char; NAME_LEN],
    pub unit: [c_char; UNIT_LEN],
    pub description: [c_char; DESCRIPTION_LEN],
    pub color: c_uint,
    pub array_size: c_int,
    pub data_type: c_int,
}

impl Default for Channel {
    fn default() -> Self {
        let mut s = ::std::mem::MaybeUninit::<Self>::uninit();
        unsafe {
            ::std::ptr::write_bytes(s.as_mut_ptr(), 0, 1);
            s.assume_init()
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct Event {
    pub event_type: c_int,
    pub time_stamp: c_double,
    pub event_text: [c_char; EVENT_TEXT_LEN],
}

impl Default for Event {
    fn default() -> Self {
        let mut s = ::std::mem::MaybeUninit::<Self>::uninit();
        unsafe {
            ::std::ptr::write_bytes(s.as_mut_ptr(), 0, 1);
            s.assume_init()
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct ReducedValue {
    pub time_stamp: c_double,
    pub ave: c_double,
    pub min: c_double,
    pub max: c_double,
    pub rms: c_double,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct ArrayInfo {
    pub index: c_int,
    pub name: [c_char; NAME_LEN],
    pub unit: [c_char; UNIT_LEN],
    pub size: c_int,
}

impl Default for ArrayInfo {
    fn default() -> Self {
        let mut s = ::std::mem::MaybeUninit::<Self>::uninit();
        unsafe {
            ::std::ptr::write_bytes(s.as_mut_ptr(), 0, 1);
            s.assume_init()
        }
    }
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct CANPortData {
    pub arb_id: c_ulong,
    pub data: [c_char; 8usize],
}

#[repr(C)]
#[derive(Debug, Default, Copy, Clone)]
pub struct Complex {
    pub re: c_double,
    pub im: c_double,
}

/// Entry points of `DWDataReaderLib`, resolved from a loaded library.
///
/// Every symbol is required; loading fails if any is missing.
pub struct DWDataReaderLib {
    __library: ::libloading::Library,
    pub init: unsafe extern "C" fn() -> Status,
    pub de_init: unsafe extern "C" fn() -> Status,
    pub get_version: unsafe extern "C" fn() -> c_int,
    pub open_data_file:
        unsafe extern "C" fn(file_name: *const c_char, file_info: *mut FileInfo) -> Status,
    pub close_data_file: unsafe extern "C" fn() -> Status,
    pub get_channel_list_count: unsafe extern "C" fn() -> c_int,
    pub get_channel_list: unsafe extern "C" fn(channel_list: *mut Channel) -> Status,
    pub get_reduced_values_count:
        unsafe extern "C" fn(ch_index: c_int, count: *mut c_int, block_size: *mut c_double) -> Status,
    pub get_reduced_values: unsafe extern "C" fn(
        ch_index: c_int,
        position: c_int,
        count: c_int,
        data: *mut ReducedValue,
    ) -> Status,
    pub get_event_list_count: unsafe extern "C" fn() -> c_int,
    pub get_event_list: unsafe extern "C" fn(event_list: *mut Event) -> Status,
    pub get_array_info_count: unsafe extern "C" fn(ch_index: c_int) -> c_int,
    pub get_array_info_list:
        unsafe extern "C" fn(ch_index: c_int, array_inf_list: *mut ArrayInfo) -> Status,
    pub get_scaled_samples_count: unsafe extern "C" fn(ch_index: c_int) -> i64,
    pub get_scaled_samples: unsafe extern "C" fn(
        ch_index: c_int,
        position: i64,
        count: c_int,
        data: *mut c_double,
        time_stamp: *mut c_double,
    ) -> Status,
}

impl DWDataReaderLib {
    pub unsafe fn new<P>(path: P) -> Result<Self, ::libloading::Error>
    where
        P: AsRef<::std::ffi::OsStr>,
    {
        let library = ::libloading::Library::new(path)?;
        Self::from_library(library)
    }

    pub unsafe fn from_library<L>(library: L) -> Result<Self, ::libloading::Error>
    where
        L: Into<::libloading::Library>,
    {
        let __library = library.into();
        let init = __library.get(b"DWInit\0").map(|sym| *sym)?;
        let de_init = __library.get(b"DWDeInit\0").map(|sym| *sym)?;
        let get_version = __library.get(b"DWGetVersion\0").map(|sym| *sym)?;
        let open_data_file = __library.get(b"DWOpenDataFile\0").map(|sym| *sym)?;
        let close_data_file = __library.get(b"DWCloseDataFile\0").map(|sym| *sym)?;
        let get_channel_list_count = __library.get(b"DWGetChannelListCount\0").map(|sym| *sym)?;
        let get_channel_list = __library.get(b"DWGetChannelList\0").map(|sym| *sym)?;
        let get_reduced_values_count =
            __library.get(b"DWGetReducedValuesCount\0").map(|sym| *sym)?;
        let get_reduced_values = __library.get(b"DWGetReducedValues\0").map(|sym| *sym)?;
        let get_event_list_count = __library.get(b"DWGetEventListCount\0").map(|sym| *sym)?;
        let get_event_list = __library.get(b"DWGetEventList\0").map(|sym| *sym)?;
        let get_array_info_count = __library.get(b"DWGetArrayInfoCount\0").map(|sym| *sym)?;
        let get_array_info_list = __library.get(b"DWGetArrayInfoList\0").map(|sym| *sym)?;
        let get_scaled_samples_count =
            __library.get(b"DWGetScaledSamplesCount\0").map(|sym| *sym)?;
        let get_scaled_samples = __library.get(b"DWGetScaledSamples\0").map(|sym| *sym)?;
        Ok(DWDataReaderLib {
            __library,
            init,
            de_init,
            get_version,
            open_data_file,
            close_data_file,
            get_channel_list_count,
            get_channel_list,
            get_reduced_values_count,
            get_reduced_values,
            get_event_list_count,
            get_event_list,
            get_array_info_count,
            get_array_info_list,
            get_scaled_samples_count,
            get_scaled_samples,
        })
    }

    pub unsafe fn init(&self) -> Status {
        (self.init)()
    }

    pub unsafe fn de_init(&self) -> Status {
        (self.de_init)()
    }

    pub unsafe fn get_version(&self) -> c_int {
        (self.get_version)()
    }

    pub unsafe fn open_data_file(&self, file_name: *const c_char, file_info: *mut FileInfo) -> Status {
        (self.open_data_file)(file_name, file_info)
    }

    pub unsafe fn close_data_file(&self) -> Status {
        (self.close_data_file)()
    }

    pub unsafe fn get_channel_list_count(&self) -> c_int {
        (self.get_channel_list_count)()
    }

    pub unsafe fn get_channel_list(&self, channel_list: *mut Channel) -> Status {
        (self.get_channel_list)(channel_list)
    }

    pub unsafe fn get_reduced_values_count(
        &self,
        ch_index: c_int,
        count: *mut c_int,
        block_size: *mut c_double,
    ) -> Status {
        (self.get_reduced_values_count)(ch_index, count, block_size)
    }

    pub unsafe fn get_reduced_values(
        &self,
        ch_index: c_int,
        position: c_int,
        count: c_int,
        data: *mut ReducedValue,
    ) -> Status {
        (self.get_reduced_values)(ch_index, position, count, data)
    }

    pub unsafe fn get_event_list_count(&self) -> c_int {
        (self.get_event_list_count)()
    }

    pub unsafe fn get_event_list(&self, event_list: *mut Event) -> Status {
        (self.get_event_list)(event_list)
    }

    pub unsafe fn get_array_info_count(&self, ch_index: c_int) -> c_int {
        (self.get_array_info_count)(ch_index)
    }

    pub unsafe fn get_array_info_list(&self, ch_index: c_int, array_inf_list: *mut ArrayInfo) -> Status {
        (self.get_array_info_list)(ch_index, array_inf_list)
    }

    pub unsafe fn get_scaled_samples_count(&self, ch_index: c_int) -> i64 {
        (self.get_scaled_samples_count)(ch_index)
    }

    pub unsafe fn get_scaled_samples(
        &self,
        ch_index: c_int,
        position: i64,
        count: c_int,
        data: *mut c_double,
        time_stamp: *mut c_double,
    ) -> Status {
        (self.get_scaled_samples)(ch_index, position, count, data, time_stamp)
    }
}
