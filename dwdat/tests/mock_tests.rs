// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Integration tests against the `dwdat-mock` stand-in library.
//!
//! The mock is a dev-dependency built as a shared library, so it lands next to
//! the test binary. Set `DWDAT_MOCK_LIB` to load it from somewhere else.
//!
//! The mock counts calls the real library would crash on; every test checks
//! that count stays at zero.

use std::{
    env::consts::{DLL_PREFIX, DLL_SUFFIX},
    os::raw::c_int,
    path::PathBuf,
    sync::{Mutex, MutexGuard, OnceLock},
};

use dwdat::{
    DataFile, DataType, DwApiHandle, DwDataReader, Error, EventType, Reduction, TextEncoding,
};

/// Ensures logging is initialized only once across all tests.
static LOG_ONCE: std::sync::Once = std::sync::Once::new();

/// One test at a time talks to the library.
static LIBRARY: Mutex<()> = Mutex::new(());

static MOCK: OnceLock<Mock> = OnceLock::new();

type ResetFn = unsafe extern "C" fn(c_int);
type QueryFn = unsafe extern "C" fn() -> c_int;

struct Mock {
    api: DwApiHandle,
    reset: ResetFn,
    misuse_count: QueryFn,
    list_calls: QueryFn,
    is_initialized: QueryFn,
    is_file_open: QueryFn,
    _lib: libloading::Library,
}

impl Mock {
    fn load() -> Self {
        let path = mock_library_path();
        let api = dwdat::load_api(&path).unwrap();
        unsafe {
            let lib = libloading::Library::new(&path).unwrap();
            let reset = *lib.get::<ResetFn>(b"DWMockReset\0").unwrap();
            let misuse_count = *lib.get::<QueryFn>(b"DWMockMisuseCount\0").unwrap();
            let list_calls = *lib.get::<QueryFn>(b"DWMockListCalls\0").unwrap();
            let is_initialized = *lib.get::<QueryFn>(b"DWMockIsInitialized\0").unwrap();
            let is_file_open = *lib.get::<QueryFn>(b"DWMockIsFileOpen\0").unwrap();
            Self {
                api,
                reset,
                misuse_count,
                list_calls,
                is_initialized,
                is_file_open,
                _lib: lib,
            }
        }
    }

    fn api(&self) -> DwApiHandle {
        self.api.clone()
    }

    fn misuse_count(&self) -> i32 {
        unsafe { (self.misuse_count)() }
    }

    fn list_calls(&self) -> i32 {
        unsafe { (self.list_calls)() }
    }

    fn is_initialized(&self) -> bool {
        unsafe { (self.is_initialized)() != 0 }
    }

    fn is_file_open(&self) -> bool {
        unsafe { (self.is_file_open)() != 0 }
    }
}

fn mock_library_path() -> PathBuf {
    if let Some(path) = std::env::var_os("DWDAT_MOCK_LIB") {
        return path.into();
    }
    let exe = std::env::current_exe().unwrap();
    let deps = exe.parent().unwrap();
    let prefix = format!("{DLL_PREFIX}dwdat_mock");
    [Some(deps), deps.parent()]
        .into_iter()
        .flatten()
        .filter_map(|dir| std::fs::read_dir(dir).ok())
        .flatten()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            name.starts_with(&prefix) && name.ends_with(DLL_SUFFIX)
        })
        .max_by_key(|entry| entry.metadata().and_then(|m| m.modified()).ok())
        .map(|entry| entry.path())
        .expect("dwdat-mock shared library not found next to the test binary")
}

/// Locks the library and resets the mock. `empty` serves a file without
/// channels or events.
fn setup_test(empty: bool) -> (MutexGuard<'static, ()>, &'static Mock) {
    LOG_ONCE.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::builder()
                    .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                    .from_env_lossy(),
            )
            .init();
    });

    let guard = LIBRARY.lock().unwrap_or_else(|e| e.into_inner());
    let mock = MOCK.get_or_init(Mock::load);
    unsafe { (mock.reset)(empty.into()) };
    (guard, mock)
}

#[test]
fn reader_guards_call_order() {
    let (_guard, mock) = setup_test(false);
    let reader = DwDataReader::new(mock.api());
    assert!(matches!(reader.close_data_file(), Err(Error::NotInitialized)));
    assert!(matches!(reader.open_data_file("Test2.dxd"), Err(Error::NotInitialized)));
    assert!(matches!(reader.get_channel_list_count(), Err(Error::NotInitialized)));
    assert!(matches!(reader.de_init(), Err(Error::NotInitialized)));

    reader.init().unwrap();
    assert!(mock.is_initialized());
    assert!(matches!(reader.init(), Err(Error::AlreadyInitialized)));
    assert!(matches!(reader.close_data_file(), Err(Error::NoFileOpen)));
    assert!(matches!(
        reader.get_event_list(TextEncoding::Utf8),
        Err(Error::NoFileOpen)
    ));

    let info = reader.open_data_file("Test2.dxd").unwrap();
    assert_eq!(info.sample_rate, 20000.0);
    assert_eq!(info.duration, 4.441);
    assert!(matches!(
        reader.open_data_file("Test2.dxd"),
        Err(Error::FileAlreadyOpen)
    ));
    reader.close_data_file().unwrap();

    // A second file in the same session.
    reader.open_data_file("Test3.dxd").unwrap();
    reader.close_data_file().unwrap();
    reader.de_init().unwrap();
    assert!(!reader.is_initialized());
    assert!(!mock.is_initialized());
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn second_reader_cannot_touch_owned_library() {
    let (_guard, mock) = setup_test(false);
    let owner = DwDataReader::new(mock.api());
    owner.init().unwrap();
    owner.open_data_file("Test2.dxd").unwrap();

    let other = DwDataReader::new(mock.api());
    assert!(!other.is_initialized());
    assert!(matches!(other.init(), Err(Error::AlreadyInitialized)));
    assert!(matches!(other.close_data_file(), Err(Error::NotInitialized)));
    assert!(matches!(other.get_channel_list_count(), Err(Error::NotInitialized)));
    assert!(matches!(other.de_init(), Err(Error::NotInitialized)));

    // The owner's file is still open and readable.
    assert!(owner.is_file_open());
    assert!(mock.is_file_open());
    assert_eq!(owner.get_channel_list_count().unwrap(), 2);

    owner.close_data_file().unwrap();
    owner.de_init().unwrap();

    // Released, so the other reader may take it now.
    other.init().unwrap();
    assert!(matches!(owner.init(), Err(Error::AlreadyInitialized)));
    other.de_init().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn reader_cannot_take_library_from_data_file() {
    let (_guard, mock) = setup_test(false);
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();

    let reader = DwDataReader::new(mock.api());
    assert!(matches!(reader.init(), Err(Error::AlreadyInitialized)));
    assert!(matches!(reader.close_data_file(), Err(Error::NotInitialized)));
    assert!(matches!(reader.de_init(), Err(Error::NotInitialized)));
    assert!(matches!(
        DataFile::open(mock.api(), "Test2.dxd"),
        Err(Error::SessionActive)
    ));
    assert_eq!(file.get_channel_list_count().unwrap(), 2);

    drop(file);
    assert!(!mock.is_initialized());

    // A reader holding the library blocks sessions the same way.
    reader.init().unwrap();
    assert!(matches!(
        DataFile::open(mock.api(), "Test2.dxd"),
        Err(Error::SessionActive)
    ));
    reader.de_init().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn failed_open_releases_library() {
    let (_guard, mock) = setup_test(false);
    let err = DataFile::open(mock.api(), "/data/missing.dxd")
        .err()
        .expect("opening a missing file must fail");
    assert!(matches!(err, Error::FileCannotOpen));
    assert_eq!(err.status_name(), Some("DWSTAT_ERROR_FILE_CANNOT_OPEN"));
    assert!(!mock.is_initialized());

    DataFile::open(mock.api(), "Test2.dxd")
        .unwrap()
        .close()
        .unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn data_file_close_and_drop_are_idempotent() {
    let (_guard, mock) = setup_test(false);
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();
    assert_eq!(file.get_version(), 4_020_000);
    assert_eq!(file.path(), std::path::Path::new("Test2.dxd"));
    file.close().unwrap();
    assert!(!mock.is_initialized());

    // Closing through the reader first leaves only de-init for the drop.
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();
    file.close_data_file().unwrap();
    assert!(!mock.is_file_open());
    drop(file);
    assert!(!mock.is_initialized());

    // Plain drop.
    {
        let _file = DataFile::open(mock.api(), "Test2.dxd").unwrap();
        assert!(mock.is_file_open());
    }
    assert!(!mock.is_initialized());
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn dropped_reader_releases_library() {
    let (_guard, mock) = setup_test(false);
    {
        let reader = DwDataReader::new(mock.api());
        reader.init().unwrap();
        reader.open_data_file("Test2.dxd").unwrap();
    }
    assert!(!mock.is_file_open());
    assert!(!mock.is_initialized());

    DataFile::open(mock.api(), "Test2.dxd")
        .unwrap()
        .close()
        .unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn zero_counts_skip_list_calls() {
    let (_guard, mock) = setup_test(true);
    let file = DataFile::open(mock.api(), "Empty.dxd").unwrap();
    assert_eq!(file.get_channel_list_count().unwrap(), 0);
    assert!(file.get_channel_list(TextEncoding::Utf8).unwrap().is_empty());
    assert_eq!(file.get_event_list_count().unwrap(), 0);
    assert!(file.get_event_list(TextEncoding::Utf8).unwrap().is_empty());
    assert!(matches!(
        file.channel_reduced(0, Reduction::Ave, TextEncoding::Utf8),
        Err(Error::ChannelNotFound(_))
    ));
    assert_eq!(mock.list_calls(), 0);
    file.close().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn channels_events_and_reduced_values() {
    let (_guard, mock) = setup_test(false);
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();

    let channels = file.get_channel_list(TextEncoding::Latin1).unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0].name, "Counting");
    assert_eq!(channels[0].description, "Rainflow");
    assert_eq!(channels[0].array_size, 20);
    assert_eq!(channels[0].color, 0xff0000);
    assert_eq!(channels[0].data_type, DataType::Double);
    assert_eq!(channels[1].unit, "°C");
    let utf8 = file.get_channel_list(TextEncoding::Utf8).unwrap();
    assert_eq!(utf8[1].unit, "\u{FFFD}C");

    assert_eq!(file.get_reduced_values_count(1).unwrap(), (4, 0.25));
    let by_index = file
        .channel_reduced(1, Reduction::Ave, TextEncoding::Latin1)
        .unwrap();
    let by_name = file
        .channel_reduced("Temp", Reduction::Ave, TextEncoding::Latin1)
        .unwrap();
    assert_eq!(by_index, vec![100.0, 101.0, 102.0, 103.0]);
    assert_eq!(by_index, by_name);
    assert_eq!(
        file.channel_reduced("Temp", Reduction::TimeStamp, TextEncoding::Latin1)
            .unwrap(),
        vec![0.0, 0.25, 0.5, 0.75]
    );
    assert_eq!(
        file.channel_reduced(&channels[0], Reduction::Max, TextEncoding::Latin1)
            .unwrap(),
        vec![1.0, 2.0, 3.0]
    );
    let tail = file.get_reduced_values(1, 2, 2).unwrap();
    assert_eq!(tail[1].as_tuple(), (0.75, 103.0, 102.0, 104.0, 103.5));
    assert!(matches!(
        file.channel_reduced("Pressure", Reduction::Ave, TextEncoding::Latin1),
        Err(Error::ChannelNotFound(_))
    ));

    let events = file.get_event_list(TextEncoding::Latin1).unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_type, EventType::Start);
    assert_eq!(events[0].text, "Start");
    assert_eq!(events[1].event_type, EventType::Notice);
    assert_eq!(events[1].time_stamp, 1.25);

    let axes = file.get_array_info_list(0, TextEncoding::Latin1).unwrap();
    assert_eq!(axes.len(), 1);
    assert_eq!(axes[0].name, "Bins");
    assert_eq!(axes[0].unit, "cycles");
    assert_eq!(axes[0].size, 20);

    // Scalar channel: no axes, and no list call for them.
    let calls = mock.list_calls();
    assert!(file
        .get_array_info_list(1, TextEncoding::Latin1)
        .unwrap()
        .is_empty());
    assert_eq!(mock.list_calls(), calls);

    file.close().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn scaled_samples_of_array_channel() {
    let (_guard, mock) = setup_test(false);
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();

    let samples = file
        .channel_samples("Counting", TextEncoding::Latin1)
        .unwrap();
    assert_eq!(samples.len(), 5);
    assert_eq!(samples.array_size, 20);
    assert_eq!(samples.values.len(), 100);
    assert_eq!(samples.row(4).unwrap()[19], 4019.0);
    assert_eq!(samples.row(5), None);
    assert_eq!(samples.time_stamps[4], 4.0 * 0.001);

    let channels = file.get_channel_list(TextEncoding::Latin1).unwrap();
    let temp = &channels[1];
    assert_eq!(file.get_scaled_samples_count(temp.index).unwrap(), 10);
    let part = file.get_scaled_samples(temp, 8, 2).unwrap();
    let values: Vec<f64> = part.samples().map(|s| s.value).collect();
    assert_eq!(values, vec![8000.0, 9000.0]);
    assert!(matches!(
        file.get_scaled_samples(temp, 9, 2),
        Err(Error::Generic)
    ));

    file.close().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}

#[test]
fn reader_is_shared_across_threads() {
    let (_guard, mock) = setup_test(false);
    let file = DataFile::open(mock.api(), "Test2.dxd").unwrap();
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..10 {
                    let channels = file.get_channel_list(TextEncoding::Latin1).unwrap();
                    assert_eq!(channels.len(), 2);
                    let ave = file
                        .channel_reduced(1, Reduction::Ave, TextEncoding::Latin1)
                        .unwrap();
                    assert_eq!(ave.len(), 4);
                }
            });
        }
    });
    file.close().unwrap();
    assert_eq!(mock.misuse_count(), 0);
}
