// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Owned records copied out of the library's fixed-layout structs.
//!
//! Every record here is a plain Rust value: text fields are decoded from the
//! NUL-terminated `char` arrays of the C structs and enum-like integers are
//! mapped to Rust enums with an `Unknown` fallback.

use std::{fmt, os::raw::c_char};

use serde::Serialize;

use crate::{Error, Result};

/// Encoding used to decode the fixed `char` arrays of channel, array and event records.
///
/// DEWESoft setups commonly store names in Latin-1, so non-ASCII text decoded
/// as UTF-8 may show replacement characters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    /// UTF-8, invalid sequences replaced with U+FFFD.
    #[default]
    Utf8,
    /// ISO 8859-1, every byte maps to the code point of the same value.
    Latin1,
}

/// Decodes a C `char` array up to its first NUL (or its full length).
pub(crate) fn decode_c_chars(chars: &[c_char], encoding: TextEncoding) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .map(|&c| c as u8)
        .take_while(|&b| b != 0)
        .collect();
    match encoding {
        TextEncoding::Utf8 => String::from_utf8_lossy(&bytes).into_owned(),
        TextEncoding::Latin1 => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// File information returned when a data file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FileInfo {
    /// Sample rate of synchronous channels, in Hz.
    pub sample_rate: f64,
    /// Storing start time, as a day count since 1899-12-30 (OLE automation date).
    pub start_store_time: f64,
    /// Recorded duration in seconds.
    pub duration: f64,
}

impl From<dwdat_sys::FileInfo> for FileInfo {
    fn from(value: dwdat_sys::FileInfo) -> Self {
        Self {
            sample_rate: value.sample_rate,
            start_store_time: value.start_store_time,
            duration: value.duration,
        }
    }
}

/// Sample data type of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DataType {
    Byte,
    ShortInt,
    SmallInt,
    Word,
    Integer,
    Single,
    Int64,
    Double,
    Longword,
    ComplexSingle,
    ComplexDouble,
    Text,
    Binary,
    CanPortData,
    /// A data type code not known to this crate.
    Unknown(i32),
}

impl From<i32> for DataType {
    fn from(value: i32) -> Self {
        match value {
            dwdat_sys::dtByte => DataType::Byte,
            dwdat_sys::dtShortInt => DataType::ShortInt,
            dwdat_sys::dtSmallInt => DataType::SmallInt,
            dwdat_sys::dtWord => DataType::Word,
            dwdat_sys::dtInteger => DataType::Integer,
            dwdat_sys::dtSingle => DataType::Single,
            dwdat_sys::dtInt64 => DataType::Int64,
            dwdat_sys::dtDouble => DataType::Double,
            dwdat_sys::dtLongword => DataType::Longword,
            dwdat_sys::dtComplexSingle => DataType::ComplexSingle,
            dwdat_sys::dtComplexDouble => DataType::ComplexDouble,
            dwdat_sys::dtText => DataType::Text,
            dwdat_sys::dtBinary => DataType::Binary,
            dwdat_sys::dtCANPortData => DataType::CanPortData,
            other => DataType::Unknown(other),
        }
    }
}

/// Channel descriptor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    /// Channel index used by all per-channel queries.
    pub index: i32,
    pub name: String,
    pub unit: String,
    pub description: String,
    /// Display color as a packed `0x00BBGGRR` value.
    pub color: u32,
    /// Number of elements per sample; 1 for scalar channels.
    pub array_size: i32,
    pub data_type: DataType,
}

impl Channel {
    pub(crate) fn from_raw(raw: &dwdat_sys::Channel, encoding: TextEncoding) -> Self {
        Self {
            index: raw.index,
            name: decode_c_chars(&raw.name, encoding),
            unit: decode_c_chars(&raw.unit, encoding),
            description: decode_c_chars(&raw.description, encoding),
            color: raw.color,
            array_size: raw.array_size,
            data_type: raw.data_type.into(),
        }
    }
}

/// Field selector for [`ReducedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    TimeStamp = 0,
    Ave = 1,
    Min = 2,
    Max = 3,
    Rms = 4,
}

impl TryFrom<usize> for Reduction {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self> {
        match value {
            0 => Ok(Reduction::TimeStamp),
            1 => Ok(Reduction::Ave),
            2 => Ok(Reduction::Min),
            3 => Ok(Reduction::Max),
            4 => Ok(Reduction::Rms),
            other => Err(Error::Other(format!(
                "Invalid reduction {other}, expected 0 (time stamp) to 4 (rms)."
            ))),
        }
    }
}

impl std::str::FromStr for Reduction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "time_stamp" | "time" | "t" => Ok(Reduction::TimeStamp),
            "ave" | "avg" | "mean" => Ok(Reduction::Ave),
            "min" => Ok(Reduction::Min),
            "max" => Ok(Reduction::Max),
            "rms" => Ok(Reduction::Rms),
            other => other
                .parse::<usize>()
                .map_err(|_| Error::Other(format!("Invalid reduction \"{s}\".")))
                .and_then(Reduction::try_from),
        }
    }
}

/// One block of reduced (statistical) values for a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReducedValue {
    /// Start of the block in seconds from the start of storing.
    pub time_stamp: f64,
    pub ave: f64,
    pub min: f64,
    pub max: f64,
    pub rms: f64,
}

impl ReducedValue {
    /// Returns the field selected by `reduction`.
    pub fn get(&self, reduction: Reduction) -> f64 {
        match reduction {
            Reduction::TimeStamp => self.time_stamp,
            Reduction::Ave => self.ave,
            Reduction::Min => self.min,
            Reduction::Max => self.max,
            Reduction::Rms => self.rms,
        }
    }

    /// Returns `(time_stamp, ave, min, max, rms)`.
    pub fn as_tuple(&self) -> (f64, f64, f64, f64, f64) {
        (self.time_stamp, self.ave, self.min, self.max, self.rms)
    }
}

impl From<dwdat_sys::ReducedValue> for ReducedValue {
    fn from(value: dwdat_sys::ReducedValue) -> Self {
        Self {
            time_stamp: value.time_stamp,
            ave: value.ave,
            min: value.min,
            max: value.max,
            rms: value.rms,
        }
    }
}

/// Axis descriptor of an array channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayInfo {
    pub index: i32,
    pub name: String,
    pub unit: String,
    pub size: i32,
}

impl ArrayInfo {
    pub(crate) fn from_raw(raw: &dwdat_sys::ArrayInfo, encoding: TextEncoding) -> Self {
        Self {
            index: raw.index,
            name: decode_c_chars(&raw.name, encoding),
            unit: decode_c_chars(&raw.unit, encoding),
            size: raw.size,
        }
    }
}

/// Kind of a stored event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventType {
    Start,
    Stop,
    Trigger,
    VStart,
    VStop,
    Keyboard,
    Notice,
    Voice,
    Module,
    /// An event type code not known to this crate.
    Unknown(i32),
}

impl From<i32> for EventType {
    fn from(value: i32) -> Self {
        match value {
            dwdat_sys::etStart => EventType::Start,
            dwdat_sys::etStop => EventType::Stop,
            dwdat_sys::etTrigger => EventType::Trigger,
            dwdat_sys::etVStart => EventType::VStart,
            dwdat_sys::etVStop => EventType::VStop,
            dwdat_sys::etKeyboard => EventType::Keyboard,
            dwdat_sys::etNotice => EventType::Notice,
            dwdat_sys::etVoice => EventType::Voice,
            dwdat_sys::etModule => EventType::Module,
            other => EventType::Unknown(other),
        }
    }
}

/// Event stored in a data file (start/stop markers, triggers, notices...).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub event_type: EventType,
    /// Seconds from the start of storing.
    pub time_stamp: f64,
    pub text: String,
}

impl Event {
    pub(crate) fn from_raw(raw: &dwdat_sys::Event, encoding: TextEncoding) -> Self {
        Self {
            event_type: raw.event_type.into(),
            time_stamp: raw.time_stamp,
            text: decode_c_chars(&raw.event_text, encoding),
        }
    }
}

/// A scaled sample and its time stamp in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time_stamp: f64,
    pub value: f64,
}

/// A channel named either by its index or by its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelRef {
    Index(i32),
    Name(String),
}

impl ChannelRef {
    /// Returns `true` if `channel` is the one referred to.
    pub fn matches(&self, channel: &Channel) -> bool {
        match self {
            ChannelRef::Index(index) => channel.index == *index,
            ChannelRef::Name(name) => channel.name == *name,
        }
    }
}

impl fmt::Display for ChannelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelRef::Index(index) => write!(f, "{index}"),
            ChannelRef::Name(name) => write!(f, "\"{name}\""),
        }
    }
}

impl From<i32> for ChannelRef {
    fn from(value: i32) -> Self {
        ChannelRef::Index(value)
    }
}

impl From<&str> for ChannelRef {
    fn from(value: &str) -> Self {
        ChannelRef::Name(value.to_string())
    }
}

impl From<String> for ChannelRef {
    fn from(value: String) -> Self {
        ChannelRef::Name(value)
    }
}

impl From<&Channel> for ChannelRef {
    fn from(value: &Channel) -> Self {
        ChannelRef::Index(value.index)
    }
}

/// Returns the first channel in `channels` matching `channel`.
///
/// # Errors
///
/// Returns [`Error::ChannelNotFound`] if no channel matches.
pub fn find_channel<'a>(channels: &'a [Channel], channel: &ChannelRef) -> Result<&'a Channel> {
    channels
        .iter()
        .find(|ch| channel.matches(ch))
        .ok_or_else(|| Error::ChannelNotFound(channel.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c_chars<const N: usize>(bytes: &[u8]) -> [c_char; N] {
        let mut out = [0 as c_char; N];
        for (dst, &src) in out.iter_mut().zip(bytes) {
            *dst = src as c_char;
        }
        out
    }

    fn channel(index: i32, name: &str) -> Channel {
        Channel {
            index,
            name: name.to_string(),
            unit: String::new(),
            description: String::new(),
            color: 0,
            array_size: 1,
            data_type: DataType::Double,
        }
    }

    #[test]
    fn decode_stops_at_nul() {
        let raw: [c_char; 8] = c_chars(b"abc\0def");
        assert_eq!(decode_c_chars(&raw, TextEncoding::Utf8), "abc");
    }

    #[test]
    fn decode_full_array_without_nul() {
        let raw: [c_char; 4] = c_chars(b"volt");
        assert_eq!(decode_c_chars(&raw, TextEncoding::Utf8), "volt");
    }

    #[test]
    fn decode_latin1_degree_sign() {
        let raw: [c_char; 20] = c_chars(b"\xb0C");
        assert_eq!(decode_c_chars(&raw, TextEncoding::Latin1), "°C");
        assert_eq!(decode_c_chars(&raw, TextEncoding::Utf8), "\u{FFFD}C");
    }

    #[test]
    fn channel_from_raw() {
        let raw = dwdat_sys::Channel {
            index: 3,
            name: c_chars(b"Counting"),
            unit: c_chars(b"m/s"),
            description: c_chars(b"Rainflow"),
            color: 16711680,
            array_size: 20,
            data_type: dwdat_sys::dtDouble,
        };
        let ch = Channel::from_raw(&raw, TextEncoding::Latin1);
        assert_eq!(ch.index, 3);
        assert_eq!(ch.name, "Counting");
        assert_eq!(ch.unit, "m/s");
        assert_eq!(ch.description, "Rainflow");
        assert_eq!(ch.color, 16711680);
        assert_eq!(ch.array_size, 20);
        assert_eq!(ch.data_type, DataType::Double);
    }

    #[test]
    fn event_from_raw() {
        let raw = dwdat_sys::Event {
            event_type: dwdat_sys::etTrigger,
            time_stamp: 1.5,
            event_text: c_chars(b"Trigger"),
        };
        let event = Event::from_raw(&raw, TextEncoding::Utf8);
        assert_eq!(event.event_type, EventType::Trigger);
        assert_eq!(event.time_stamp, 1.5);
        assert_eq!(event.text, "Trigger");
    }

    #[test]
    fn unknown_enum_codes_are_kept() {
        assert_eq!(DataType::from(99), DataType::Unknown(99));
        assert_eq!(EventType::from(4), EventType::Unknown(4));
        assert_eq!(EventType::from(24), EventType::Module);
    }

    #[test]
    fn reduced_value_selection() {
        let value = ReducedValue {
            time_stamp: 60.5,
            ave: 82.6,
            min: 82.1,
            max: 83.0,
            rms: 82.7,
        };
        assert_eq!(value.get(Reduction::TimeStamp), 60.5);
        assert_eq!(value.get(Reduction::Ave), 82.6);
        assert_eq!(value.get(Reduction::Min), 82.1);
        assert_eq!(value.get(Reduction::Max), 83.0);
        assert_eq!(value.get(Reduction::Rms), 82.7);
        assert_eq!(value.as_tuple(), (60.5, 82.6, 82.1, 83.0, 82.7));
    }

    #[test]
    fn reduction_parsing() {
        assert_eq!("rms".parse::<Reduction>().unwrap(), Reduction::Rms);
        assert_eq!("AVE".parse::<Reduction>().unwrap(), Reduction::Ave);
        assert_eq!("0".parse::<Reduction>().unwrap(), Reduction::TimeStamp);
        assert!("5".parse::<Reduction>().is_err());
        assert!("median".parse::<Reduction>().is_err());
        assert_eq!(Reduction::Max as usize, 3);
    }

    #[test]
    fn find_channel_by_index_and_name() {
        let channels = vec![channel(0, "Counting"), channel(1, "Speed"), channel(2, "Speed")];
        assert_eq!(find_channel(&channels, &1.into()).unwrap().name, "Speed");
        assert_eq!(find_channel(&channels, &"Speed".into()).unwrap().index, 1);
        assert_eq!(find_channel(&channels, &"Counting".into()).unwrap().index, 0);
    }

    #[test]
    fn find_channel_missing() {
        let channels = vec![channel(0, "Counting")];
        let err = find_channel(&channels, &"Torque".into()).unwrap_err();
        assert!(matches!(err, Error::ChannelNotFound(ref name) if name == "\"Torque\""));
        assert!(find_channel(&channels, &7.into()).is_err());
        assert!(find_channel(&[], &0.into()).is_err());
    }
}
