// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Prints the contents of a DEWESoft data file.
//!
//! ```text
//! cargo run --example dwdump -- Test2.dxd --latin1
//! cargo run --example dwdump -- Test2.dxd --channel Speed --reduction max --json
//! ```

mod common;

use std::path::{Path, PathBuf};

use clap::Parser;
use dwdat::{Channel, DataFile, Event, FileInfo, Reduction, TextEncoding};
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "Dump file info, channels and events of a DEWESoft data file")]
struct Args {
    /// Data file to read (.dxd, .d7d).
    file: PathBuf,

    /// Directory holding the DWDataReader library. Defaults to DEWELIBDIR or the
    /// dewelibdir config file.
    #[arg(long, env = "DEWELIBDIR")]
    lib_dir: Option<PathBuf>,

    /// Decode channel names as Latin-1 instead of UTF-8.
    #[arg(long)]
    latin1: bool,

    /// Also print the reduced values of this channel (index or name).
    #[arg(long)]
    channel: Option<String>,

    /// Field of the reduced values to print: time_stamp, ave, min, max or rms.
    #[arg(long, default_value = "ave")]
    reduction: String,

    /// Print JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Builds the `--json` document. The path is written in its display form, so
/// names that are not valid UTF-8 still serialize.
fn json_report(
    path: &Path,
    file_info: &FileInfo,
    channels: &[Channel],
    events: &[Event],
    reduced: Option<&[f64]>,
) -> serde_json::Value {
    serde_json::json!({
        "file": path.display().to_string(),
        "file_info": file_info,
        "channels": channels,
        "events": events,
        "reduced": reduced,
    })
}

fn main() -> Result<(), dwdat::Error> {
    common::setup_logging();
    let args = Args::parse();
    let encoding = if args.latin1 {
        TextEncoding::Latin1
    } else {
        TextEncoding::Utf8
    };

    let api = common::load_api(args.lib_dir)?;
    let file = DataFile::open(api, &args.file)?;
    info!("DWDataReader version {}", file.get_version());

    let channels = file.get_channel_list(encoding)?;
    let events = file.get_event_list(encoding)?;

    let reduced = match &args.channel {
        Some(channel) => {
            let reduction: Reduction = args.reduction.parse()?;
            let values = match channel.parse::<i32>() {
                Ok(index) => file.channel_reduced(index, reduction, encoding)?,
                Err(_) => file.channel_reduced(channel.as_str(), reduction, encoding)?,
            };
            Some(values)
        }
        None => None,
    };

    if args.json {
        let doc = json_report(
            &args.file,
            file.file_info(),
            &channels,
            &events,
            reduced.as_deref(),
        );
        let text = serde_json::to_string_pretty(&doc)
            .map_err(|err| dwdat::Error::Other(err.to_string()))?;
        println!("{text}");
    } else {
        let fi = file.file_info();
        println!(
            "{}: sample rate {} Hz, start {}, duration {} s",
            args.file.display(),
            fi.sample_rate,
            fi.start_store_time,
            fi.duration
        );
        for ch in &channels {
            println!(
                "  [{}] {} ({}) {:?} x{} - {}",
                ch.index, ch.name, ch.unit, ch.data_type, ch.array_size, ch.description
            );
        }
        for event in &events {
            println!("  {:>10.3} s {:?} {}", event.time_stamp, event.event_type, event.text);
        }
        if let Some(values) = reduced {
            for value in values {
                println!("{value}");
            }
        }
    }

    file.close()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn json_report_with_latin1_path() {
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(std::ffi::OsStr::from_bytes(b"/data/M\xe4tning.dxd"));
        let info = FileInfo {
            sample_rate: 20000.0,
            start_store_time: 43998.6823785301,
            duration: 4.441,
        };
        let doc = json_report(path, &info, &[], &[], Some(&[1.0, 2.0][..]));
        assert_eq!(doc["file"], "/data/M\u{FFFD}tning.dxd");
        assert_eq!(doc["file_info"]["sample_rate"], 20000.0);
        assert_eq!(doc["reduced"], serde_json::json!([1.0, 2.0]));
        assert!(serde_json::to_string_pretty(&doc).is_ok());
    }
}
