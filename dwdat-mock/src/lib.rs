// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Stand-in for `DWDataReaderLib`, built as a shared library for tests.
//!
//! It exports the same `DW*` entry points as the vendor library and serves
//! one fixed file for any path that does not contain `missing`:
//!
//! | index | name       | unit | array size | scaled samples | reduced blocks |
//! |-------|------------|------|------------|----------------|----------------|
//! | 0     | `Counting` |      | 20         | 5              | 3 of 0.5 s     |
//! | 1     | `Temp`     | `°C` (Latin-1) | 1 | 10            | 4 of 0.25 s    |
//!
//! Values are derived from their position, so callers can check them:
//!
//! - reduced record `k` of channel `ch`: `ave = ch * 100 + k`, `min = ave - 1`,
//!   `max = ave + 1`, `rms = ave + 0.5`, time stamp `k * block_size`
//! - scaled sample `i`, element `j`: value `i * 1000 + j`, time stamp `i * 0.001`
//!
//! Calls the real library would crash on (closing without an open file,
//! reading without a file, a second `DWInit`) are counted instead, see
//! [`DWMockMisuseCount`].

#![allow(non_snake_case)]

use std::{
    ffi::CStr,
    os::raw::{c_char, c_double, c_int},
    sync::atomic::{AtomicBool, AtomicI32, Ordering},
};

use dwdat_sys::{
    ArrayInfo, Channel, DWSTAT_ERROR, DWSTAT_ERROR_FILE_CANNOT_OPEN, DWSTAT_OK, Event, FileInfo,
    ReducedValue, Status, dtDouble, etNotice, etStart,
};

pub const VERSION: c_int = 4_020_000;

static INITIALIZED: AtomicBool = AtomicBool::new(false);
static FILE_OPEN: AtomicBool = AtomicBool::new(false);
static EMPTY_FILE: AtomicBool = AtomicBool::new(false);
static MISUSE: AtomicI32 = AtomicI32::new(0);
static LIST_CALLS: AtomicI32 = AtomicI32::new(0);

struct MockChannel {
    name: &'static [u8],
    unit: &'static [u8],
    description: &'static [u8],
    color: u32,
    array_size: c_int,
    samples: i64,
    blocks: c_int,
    block_size: f64,
}

const CHANNELS: [MockChannel; 2] = [
    MockChannel {
        name: b"Counting",
        unit: b"",
        description: b"Rainflow",
        color: 0xff0000,
        array_size: 20,
        samples: 5,
        blocks: 3,
        block_size: 0.5,
    },
    MockChannel {
        name: b"Temp",
        unit: b"\xb0C",
        description: b"",
        color: 0x00ff00,
        array_size: 1,
        samples: 10,
        blocks: 4,
        block_size: 0.25,
    },
];

fn misuse() -> Status {
    MISUSE.fetch_add(1, Ordering::SeqCst);
    DWSTAT_ERROR
}

fn file_open() -> bool {
    INITIALIZED.load(Ordering::SeqCst) && FILE_OPEN.load(Ordering::SeqCst)
}

fn channel(ch_index: c_int) -> Option<&'static MockChannel> {
    if EMPTY_FILE.load(Ordering::SeqCst) {
        return None;
    }
    usize::try_from(ch_index).ok().and_then(|i| CHANNELS.get(i))
}

fn fill(dst: &mut [c_char], src: &[u8]) {
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = s as c_char;
    }
}

/// Resets the mock to a fresh process state. A non-zero `empty` serves a file
/// without channels or events.
#[unsafe(no_mangle)]
pub extern "C" fn DWMockReset(empty: c_int) {
    INITIALIZED.store(false, Ordering::SeqCst);
    FILE_OPEN.store(false, Ordering::SeqCst);
    EMPTY_FILE.store(empty != 0, Ordering::SeqCst);
    MISUSE.store(0, Ordering::SeqCst);
    LIST_CALLS.store(0, Ordering::SeqCst);
}

/// Number of calls the vendor library would have crashed or misbehaved on.
#[unsafe(no_mangle)]
pub extern "C" fn DWMockMisuseCount() -> c_int {
    MISUSE.load(Ordering::SeqCst)
}

/// Number of `DWGet*List` calls.
#[unsafe(no_mangle)]
pub extern "C" fn DWMockListCalls() -> c_int {
    LIST_CALLS.load(Ordering::SeqCst)
}

#[unsafe(no_mangle)]
pub extern "C" fn DWMockIsInitialized() -> c_int {
    INITIALIZED.load(Ordering::SeqCst).into()
}

#[unsafe(no_mangle)]
pub extern "C" fn DWMockIsFileOpen() -> c_int {
    FILE_OPEN.load(Ordering::SeqCst).into()
}

#[unsafe(no_mangle)]
pub extern "C" fn DWInit() -> Status {
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return misuse();
    }
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWDeInit() -> Status {
    if !INITIALIZED.swap(false, Ordering::SeqCst) {
        return misuse();
    }
    FILE_OPEN.store(false, Ordering::SeqCst);
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWGetVersion() -> c_int {
    VERSION
}

/// # Safety
///
/// `file_name` must be a NUL-terminated string and `file_info` must point to
/// a writable `DWFileInfo`.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWOpenDataFile(file_name: *const c_char, file_info: *mut FileInfo) -> Status {
    if !INITIALIZED.load(Ordering::SeqCst) || FILE_OPEN.load(Ordering::SeqCst) {
        return misuse();
    }
    if file_name.is_null() || file_info.is_null() {
        return misuse();
    }
    let name = unsafe { CStr::from_ptr(file_name) }.to_bytes();
    if name.windows(7).any(|w| w == b"missing") {
        return DWSTAT_ERROR_FILE_CANNOT_OPEN;
    }
    unsafe {
        *file_info = FileInfo {
            sample_rate: 20000.0,
            start_store_time: 43998.6823785301,
            duration: 4.441,
        };
    }
    FILE_OPEN.store(true, Ordering::SeqCst);
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWCloseDataFile() -> Status {
    if !file_open() {
        return misuse();
    }
    FILE_OPEN.store(false, Ordering::SeqCst);
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWGetChannelListCount() -> c_int {
    if !file_open() {
        misuse();
        return -1;
    }
    if EMPTY_FILE.load(Ordering::SeqCst) {
        0
    } else {
        CHANNELS.len() as c_int
    }
}

/// # Safety
///
/// `channel_list` must have room for `DWGetChannelListCount()` channels.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetChannelList(channel_list: *mut Channel) -> Status {
    LIST_CALLS.fetch_add(1, Ordering::SeqCst);
    if !file_open() || channel_list.is_null() || EMPTY_FILE.load(Ordering::SeqCst) {
        return misuse();
    }
    for (i, ch) in CHANNELS.iter().enumerate() {
        let mut raw = Channel {
            index: i as c_int,
            color: ch.color,
            array_size: ch.array_size,
            data_type: dtDouble,
            ..Channel::default()
        };
        fill(&mut raw.name, ch.name);
        fill(&mut raw.unit, ch.unit);
        fill(&mut raw.description, ch.description);
        unsafe { channel_list.add(i).write(raw) };
    }
    DWSTAT_OK
}

/// # Safety
///
/// `count` and `block_size` must be writable.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetReducedValuesCount(
    ch_index: c_int,
    count: *mut c_int,
    block_size: *mut c_double,
) -> Status {
    if !file_open() || count.is_null() || block_size.is_null() {
        return misuse();
    }
    let Some(ch) = channel(ch_index) else {
        return DWSTAT_ERROR;
    };
    unsafe {
        *count = ch.blocks;
        *block_size = ch.block_size;
    }
    DWSTAT_OK
}

/// # Safety
///
/// `data` must have room for `count` records.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetReducedValues(
    ch_index: c_int,
    position: c_int,
    count: c_int,
    data: *mut ReducedValue,
) -> Status {
    if !file_open() || data.is_null() {
        return misuse();
    }
    let Some(ch) = channel(ch_index) else {
        return DWSTAT_ERROR;
    };
    if position < 0
        || count < 0
        || position.checked_add(count).is_none_or(|end| end > ch.blocks)
    {
        return DWSTAT_ERROR;
    }
    for i in 0..count {
        let k = position + i;
        let ave = f64::from(ch_index * 100 + k);
        let value = ReducedValue {
            time_stamp: f64::from(k) * ch.block_size,
            ave,
            min: ave - 1.0,
            max: ave + 1.0,
            rms: ave + 0.5,
        };
        unsafe { data.add(i as usize).write(value) };
    }
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWGetEventListCount() -> c_int {
    if !file_open() {
        misuse();
        return -1;
    }
    if EMPTY_FILE.load(Ordering::SeqCst) { 0 } else { 2 }
}

/// # Safety
///
/// `event_list` must have room for `DWGetEventListCount()` events.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetEventList(event_list: *mut Event) -> Status {
    LIST_CALLS.fetch_add(1, Ordering::SeqCst);
    if !file_open() || event_list.is_null() || EMPTY_FILE.load(Ordering::SeqCst) {
        return misuse();
    }
    let events: [(c_int, f64, &[u8]); 2] = [(etStart, 0.0, b"Start"), (etNotice, 1.25, b"Note")];
    for (i, (event_type, time_stamp, text)) in events.into_iter().enumerate() {
        let mut raw = Event {
            event_type,
            time_stamp,
            ..Event::default()
        };
        fill(&mut raw.event_text, text);
        unsafe { event_list.add(i).write(raw) };
    }
    DWSTAT_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn DWGetArrayInfoCount(ch_index: c_int) -> c_int {
    if !file_open() {
        misuse();
        return -1;
    }
    match channel(ch_index) {
        Some(ch) if ch.array_size > 1 => 1,
        Some(_) => 0,
        None => -1,
    }
}

/// # Safety
///
/// `array_inf_list` must have room for `DWGetArrayInfoCount(ch_index)` entries.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetArrayInfoList(ch_index: c_int, array_inf_list: *mut ArrayInfo) -> Status {
    LIST_CALLS.fetch_add(1, Ordering::SeqCst);
    if !file_open() || array_inf_list.is_null() {
        return misuse();
    }
    match channel(ch_index) {
        Some(ch) if ch.array_size > 1 => {
            let mut raw = ArrayInfo {
                index: 0,
                size: ch.array_size,
                ..ArrayInfo::default()
            };
            fill(&mut raw.name, b"Bins");
            fill(&mut raw.unit, b"cycles");
            unsafe { array_inf_list.write(raw) };
            DWSTAT_OK
        }
        _ => misuse(),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn DWGetScaledSamplesCount(ch_index: c_int) -> i64 {
    if !file_open() {
        misuse();
        return -1;
    }
    channel(ch_index).map_or(-1, |ch| ch.samples)
}

/// # Safety
///
/// `data` must have room for `count * array_size` values and `time_stamp`
/// for `count` values.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn DWGetScaledSamples(
    ch_index: c_int,
    position: i64,
    count: c_int,
    data: *mut c_double,
    time_stamp: *mut c_double,
) -> Status {
    if !file_open() || data.is_null() || time_stamp.is_null() {
        return misuse();
    }
    let Some(ch) = channel(ch_index) else {
        return DWSTAT_ERROR;
    };
    if position < 0
        || count < 0
        || position
            .checked_add(i64::from(count))
            .is_none_or(|end| end > ch.samples)
    {
        return DWSTAT_ERROR;
    }
    let width = ch.array_size as usize;
    for i in 0..count as usize {
        let row = position + i as i64;
        unsafe { time_stamp.add(i).write(row as f64 * 0.001) };
        for j in 0..width {
            let value = (row * 1000) as f64 + j as f64;
            unsafe { data.add(i * width + j).write(value) };
        }
    }
    DWSTAT_OK
}
