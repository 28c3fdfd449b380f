// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! One-to-one wrappers for the DWDataReader entry points.
//!
//! [`DwDataReader`] exposes each native function as a safe method. The typical
//! work flow is:
//!
//! 1. [`DwDataReader::init`]
//! 2. [`DwDataReader::open_data_file`] for `dat1`
//! 3. other methods to get at data in `dat1`
//! 4. [`DwDataReader::close_data_file`]
//! 5. repeat 2-4 for more files
//! 6. [`DwDataReader::de_init`]
//!
//! [`crate::DataFile`] performs 1, 2, 4 and 6 automatically.

use std::{
    ffi::CString,
    os::raw::{c_double, c_int},
    path::Path,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::{
    ArrayInfo, Channel, ChannelRef, Error, Event, FileInfo, ReducedValue, Reduction, Result,
    Sample, TextEncoding, api::DwApiHandle, data::find_channel,
};

/// State of the native library, shared by every reader in the process.
#[derive(Debug)]
struct LibState {
    /// Id of the reader whose `DWInit` succeeded.
    owner: Option<u64>,
    file_open: bool,
}

impl LibState {
    const RELEASED: Self = Self {
        owner: None,
        file_open: false,
    };
}

static LIB_STATE: Mutex<LibState> = Mutex::new(LibState::RELEASED);

static NEXT_READER_ID: AtomicU64 = AtomicU64::new(1);

fn lib_state() -> MutexGuard<'static, LibState> {
    LIB_STATE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Scaled samples of one channel.
///
/// Array channels return `array_size` values per time stamp, stored row after row.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledSamples {
    /// Time stamp of each row, in seconds.
    pub time_stamps: Vec<f64>,
    /// `time_stamps.len() * array_size` values.
    pub values: Vec<f64>,
    /// Values per row.
    pub array_size: usize,
}

impl ScaledSamples {
    /// Number of rows (time stamps).
    pub fn len(&self) -> usize {
        self.time_stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_stamps.is_empty()
    }

    /// Returns the values of row `i`.
    pub fn row(&self, i: usize) -> Option<&[f64]> {
        let start = i.checked_mul(self.array_size)?;
        let end = start.checked_add(self.array_size)?;
        self.values.get(start..end)
    }

    /// Iterates over `(time stamp, first value)` pairs.
    ///
    /// For scalar channels this is every sample.
    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.time_stamps
            .iter()
            .zip(self.values.iter().step_by(self.array_size.max(1)))
            .map(|(&time_stamp, &value)| Sample { time_stamp, value })
    }
}

fn to_c_int(value: usize, what: &str) -> Result<c_int> {
    c_int::try_from(value)
        .map_err(|_| Error::Other(format!("{what} {value} does not fit in a C int.")))
}

fn to_count(value: i64, function: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::InvalidCount(function, value))
}

#[cfg(unix)]
fn path_to_cstring(path: &Path) -> Result<CString> {
    use std::os::unix::ffi::OsStrExt;
    Ok(CString::new(path.as_os_str().as_bytes())?)
}

#[cfg(not(unix))]
fn path_to_cstring(path: &Path) -> Result<CString> {
    let path = path
        .to_str()
        .ok_or_else(|| Error::Other(format!("Path {} is not valid UTF-8.", path.display())))?;
    Ok(CString::new(path)?)
}

/// Safe wrappers for the DWDataReader entry points.
///
/// The vendor library keeps a single global state per process. Readers share
/// one process-wide record of that state: the reader whose [`Self::init`]
/// succeeded owns the library until it calls [`Self::de_init`] or is dropped.
/// Calls from any other reader fail with [`Error::NotInitialized`], and calls
/// that would crash the library (such as closing when no file is open) are
/// refused before they reach it.
///
/// Native calls are serialized on the process-wide state, so `DwDataReader`
/// is `Send` and `Sync`.
///
/// # Examples
///
/// ```no_run
/// use dwdat::{DwDataReader, Reduction, TextEncoding, load_default_api};
///
/// # fn main() -> Result<(), dwdat::Error> {
/// let reader = DwDataReader::new(load_default_api()?);
/// reader.init()?;
/// let info = reader.open_data_file("Test2.dxd")?;
/// println!("{info:?}");
/// for ch in reader.get_channel_list(TextEncoding::Latin1)? {
///     let ave = reader.channel_reduced(ch.index, Reduction::Ave, TextEncoding::Latin1)?;
///     println!("{}: {} blocks", ch.name, ave.len());
/// }
/// reader.close_data_file()?;
/// reader.de_init()?;
/// # Ok(())
/// # }
/// ```
pub struct DwDataReader {
    api: DwApiHandle,
    id: u64,
}

impl DwDataReader {
    /// Creates a reader over a loaded library. Does not call `DWInit`.
    pub fn new(api: DwApiHandle) -> Self {
        Self {
            api,
            id: NEXT_READER_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Returns the library handle.
    pub fn api(&self) -> &DwApiHandle {
        &self.api
    }

    /// Returns `true` between this reader's [`Self::init`] and [`Self::de_init`].
    pub fn is_initialized(&self) -> bool {
        lib_state().owner == Some(self.id)
    }

    /// Returns `true` between [`Self::open_data_file`] and [`Self::close_data_file`].
    pub fn is_file_open(&self) -> bool {
        let state = lib_state();
        state.owner == Some(self.id) && state.file_open
    }

    /// Locks the library state if this reader owns it.
    fn owned_state(&self) -> Result<MutexGuard<'static, LibState>> {
        let state = lib_state();
        if state.owner == Some(self.id) {
            Ok(state)
        } else {
            Err(Error::NotInitialized)
        }
    }

    /// Locks the library state if this reader owns it and has a file open.
    fn open_state(&self) -> Result<MutexGuard<'static, LibState>> {
        let state = self.owned_state()?;
        if state.file_open {
            Ok(state)
        } else {
            Err(Error::NoFileOpen)
        }
    }

    /// Initializes the library. Must be called prior to any other call.
    ///
    /// Wraps `DWStatus DWInit()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInitialized`] if this or any other reader has
    /// initialized the library and not released it yet.
    pub fn init(&self) -> Result<()> {
        let mut state = lib_state();
        if state.owner.is_some() {
            return Err(Error::AlreadyInitialized);
        }
        Error::from_status(unsafe { self.api.init() })?;
        *state = LibState {
            owner: Some(self.id),
            file_open: false,
        };
        Ok(())
    }

    /// Releases the library. Must be called when done with the library;
    /// [`Self::init`] may be called again afterwards, by any reader.
    ///
    /// Wraps `DWStatus DWDeInit()`.
    pub fn de_init(&self) -> Result<()> {
        let mut state = self.owned_state()?;
        let status = unsafe { self.api.de_init() };
        *state = LibState::RELEASED;
        Error::from_status(status)
    }

    /// Returns the version of the library.
    ///
    /// Wraps `int DWGetVersion()`.
    pub fn get_version(&self) -> i32 {
        let _state = lib_state();
        unsafe { self.api.get_version() }
    }

    /// Opens a data file (`.dxd`, `.d7d`, ...) for reading.
    ///
    /// On Unix the path's raw bytes are passed to the library.
    ///
    /// Wraps `DWStatus DWOpenDataFile(char* file_name, DWFileInfo* file_info)`.
    ///
    /// # Errors
    ///
    /// - [`Error::NotInitialized`] before [`Self::init`]
    /// - [`Error::FileAlreadyOpen`] if a file is open
    /// - [`Error::NulString`] if the path contains a NUL byte
    /// - the mapped status, for example [`Error::FileCannotOpen`]
    pub fn open_data_file<P: AsRef<Path>>(&self, path: P) -> Result<FileInfo> {
        let mut state = self.owned_state()?;
        if state.file_open {
            return Err(Error::FileAlreadyOpen);
        }
        let path = path.as_ref();
        let file_name = path_to_cstring(path)?;
        let mut info = dwdat_sys::FileInfo::default();
        Error::from_status(unsafe { self.api.open_data_file(file_name.as_ptr(), &mut info) })?;
        state.file_open = true;
        tracing::debug!("Opened data file {}", path.display());
        Ok(info.into())
    }

    /// Closes the open data file.
    ///
    /// Wraps `DWStatus DWCloseDataFile()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoFileOpen`] if no file is open; the native call is
    /// not made in that case.
    pub fn close_data_file(&self) -> Result<()> {
        let mut state = self.open_state()?;
        let status = unsafe { self.api.close_data_file() };
        state.file_open = false;
        tracing::debug!("Closed data file");
        Error::from_status(status)
    }

    // The helpers below expect the caller to hold the state from `open_state`.

    fn channel_count(&self) -> Result<usize> {
        let count = unsafe { self.api.get_channel_list_count() };
        to_count(count.into(), "DWGetChannelListCount")
    }

    fn event_count(&self) -> Result<usize> {
        let count = unsafe { self.api.get_event_list_count() };
        to_count(count.into(), "DWGetEventListCount")
    }

    fn array_info_count(&self, ch_index: i32) -> Result<usize> {
        let count = unsafe { self.api.get_array_info_count(ch_index) };
        to_count(count.into(), "DWGetArrayInfoCount")
    }

    /// Returns the number of channels.
    ///
    /// Wraps `int DWGetChannelListCount()`.
    pub fn get_channel_list_count(&self) -> Result<usize> {
        let _state = self.open_state()?;
        self.channel_count()
    }

    /// Returns the descriptor of each channel, decoding text with `encoding`.
    ///
    /// Wraps `DWStatus DWGetChannelList(DWChannel* channel_list)`.
    pub fn get_channel_list(&self, encoding: TextEncoding) -> Result<Vec<Channel>> {
        let _state = self.open_state()?;
        let count = self.channel_count()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut list = vec![dwdat_sys::Channel::default(); count];
        Error::from_status(unsafe { self.api.get_channel_list(list.as_mut_ptr()) })?;
        Ok(list
            .iter()
            .map(|raw| Channel::from_raw(raw, encoding))
            .collect())
    }

    /// Returns `(count, block_size)` for a channel: the number of reduced
    /// records and the time span of each in seconds.
    ///
    /// Wraps `DWStatus DWGetReducedValuesCount(int ch_index, int* count, double* block_size)`.
    pub fn get_reduced_values_count(&self, ch_index: i32) -> Result<(usize, f64)> {
        let _state = self.open_state()?;
        let mut count: c_int = 0;
        let mut block_size: c_double = 0.0;
        Error::from_status(unsafe {
            self.api
                .get_reduced_values_count(ch_index, &mut count, &mut block_size)
        })?;
        Ok((to_count(count.into(), "DWGetReducedValuesCount")?, block_size))
    }

    /// Returns `count` reduced records of a channel starting at `position`.
    ///
    /// Wraps `DWStatus DWGetReducedValues(int ch_index, int position, int count, DWReducedValue* data)`.
    pub fn get_reduced_values(
        &self,
        ch_index: i32,
        position: usize,
        count: usize,
    ) -> Result<Vec<ReducedValue>> {
        let _state = self.open_state()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let c_position = to_c_int(position, "Position")?;
        let c_count = to_c_int(count, "Count")?;
        let mut data = vec![dwdat_sys::ReducedValue::default(); count];
        Error::from_status(unsafe {
            self.api
                .get_reduced_values(ch_index, c_position, c_count, data.as_mut_ptr())
        })?;
        Ok(data.into_iter().map(ReducedValue::from).collect())
    }

    /// Returns the number of stored events.
    ///
    /// Wraps `int DWGetEventListCount()`.
    pub fn get_event_list_count(&self) -> Result<usize> {
        let _state = self.open_state()?;
        self.event_count()
    }

    /// Returns the stored events.
    ///
    /// Wraps `DWStatus DWGetEventList(DWEvent* event_list)`.
    pub fn get_event_list(&self, encoding: TextEncoding) -> Result<Vec<Event>> {
        let _state = self.open_state()?;
        let count = self.event_count()?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut list = vec![dwdat_sys::Event::default(); count];
        Error::from_status(unsafe { self.api.get_event_list(list.as_mut_ptr()) })?;
        Ok(list
            .iter()
            .map(|raw| Event::from_raw(raw, encoding))
            .collect())
    }

    /// Returns the number of array axes of a channel.
    ///
    /// Wraps `int DWGetArrayInfoCount(int ch_index)`.
    pub fn get_array_info_count(&self, ch_index: i32) -> Result<usize> {
        let _state = self.open_state()?;
        self.array_info_count(ch_index)
    }

    /// Returns the array axes of a channel.
    ///
    /// Wraps `DWStatus DWGetArrayInfoList(int ch_index, DWArrayInfo* array_inf_list)`.
    pub fn get_array_info_list(
        &self,
        ch_index: i32,
        encoding: TextEncoding,
    ) -> Result<Vec<ArrayInfo>> {
        let _state = self.open_state()?;
        let count = self.array_info_count(ch_index)?;
        if count == 0 {
            return Ok(Vec::new());
        }
        let mut list = vec![dwdat_sys::ArrayInfo::default(); count];
        Error::from_status(unsafe {
            self.api
                .get_array_info_list(ch_index, list.as_mut_ptr())
        })?;
        Ok(list
            .iter()
            .map(|raw| ArrayInfo::from_raw(raw, encoding))
            .collect())
    }

    /// Returns the number of full-rate samples of a channel.
    ///
    /// Wraps `__int64 DWGetScaledSamplesCount(int ch_index)`.
    pub fn get_scaled_samples_count(&self, ch_index: i32) -> Result<u64> {
        let _state = self.open_state()?;
        let count = unsafe { self.api.get_scaled_samples_count(ch_index) };
        u64::try_from(count).map_err(|_| Error::InvalidCount("DWGetScaledSamplesCount", count))
    }

    /// Returns `count` scaled samples of `channel` starting at `position`.
    ///
    /// The channel descriptor supplies the array size, which sets how many
    /// values the library writes per sample.
    ///
    /// Wraps `DWStatus DWGetScaledSamples(int ch_index, __int64 position, int count, double* data, double* time_stamp)`.
    pub fn get_scaled_samples(
        &self,
        channel: &Channel,
        position: u64,
        count: usize,
    ) -> Result<ScaledSamples> {
        let _state = self.open_state()?;
        let array_size = usize::try_from(channel.array_size.max(1)).unwrap_or(1);
        if count == 0 {
            return Ok(ScaledSamples {
                time_stamps: Vec::new(),
                values: Vec::new(),
                array_size,
            });
        }
        let c_position = i64::try_from(position)
            .map_err(|_| Error::Other(format!("Position {position} is out of range.")))?;
        let c_count = to_c_int(count, "Count")?;
        let value_count = count
            .checked_mul(array_size)
            .ok_or_else(|| Error::Other(format!("Sample buffer for {count} samples overflows.")))?;
        let mut values = vec![0.0; value_count];
        let mut time_stamps = vec![0.0; count];
        Error::from_status(unsafe {
            self.api.get_scaled_samples(
                channel.index,
                c_position,
                c_count,
                values.as_mut_ptr(),
                time_stamps.as_mut_ptr(),
            )
        })?;
        Ok(ScaledSamples {
            time_stamps,
            values,
            array_size,
        })
    }

    /// Looks up a channel by index or name in the channel list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ChannelNotFound`] if no channel matches.
    pub fn resolve_channel<C: Into<ChannelRef>>(
        &self,
        channel: C,
        encoding: TextEncoding,
    ) -> Result<Channel> {
        let channels = self.get_channel_list(encoding)?;
        find_channel(&channels, &channel.into()).cloned()
    }

    /// Returns one field of every reduced record of a channel.
    ///
    /// `channel` is a channel index or name; `encoding` is used to decode the
    /// channel names when looking it up. Records are read from position 0.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use dwdat::{DataFile, Reduction, TextEncoding};
    /// # fn example(file: DataFile) -> Result<(), dwdat::Error> {
    /// let time = file.channel_reduced(0, Reduction::TimeStamp, TextEncoding::Latin1)?;
    /// let speed = file.channel_reduced("Speed", Reduction::Ave, TextEncoding::Latin1)?;
    /// assert_eq!(time.len(), speed.len());
    /// # Ok(())
    /// # }
    /// ```
    pub fn channel_reduced<C: Into<ChannelRef>>(
        &self,
        channel: C,
        reduction: Reduction,
        encoding: TextEncoding,
    ) -> Result<Vec<f64>> {
        let channel = self.resolve_channel(channel, encoding)?;
        let (count, _) = self.get_reduced_values_count(channel.index)?;
        Ok(self
            .get_reduced_values(channel.index, 0, count)?
            .iter()
            .map(|value| value.get(reduction))
            .collect())
    }

    /// Returns every scaled sample of a channel.
    pub fn channel_samples<C: Into<ChannelRef>>(
        &self,
        channel: C,
        encoding: TextEncoding,
    ) -> Result<ScaledSamples> {
        let channel = self.resolve_channel(channel, encoding)?;
        let count = self.get_scaled_samples_count(channel.index)?;
        let count = usize::try_from(count)
            .map_err(|_| Error::Other(format!("{count} samples do not fit in memory.")))?;
        self.get_scaled_samples(&channel, 0, count)
    }
}

impl Drop for DwDataReader {
    /// Closes the open file and releases the library if this reader owns it.
    fn drop(&mut self) {
        let mut state = lib_state();
        if state.owner != Some(self.id) {
            return;
        }
        if state.file_open
            && let Err(err) = Error::from_status(unsafe { self.api.close_data_file() })
        {
            tracing::error!("Failed to close data file on drop: {:?}", err);
        }
        if let Err(err) = Error::from_status(unsafe { self.api.de_init() }) {
            tracing::error!("Failed to de-initialize DWDataReader on drop: {:?}", err);
        }
        *state = LibState::RELEASED;
    }
}
