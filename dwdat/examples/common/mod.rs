// SPDX-FileCopyrightText: 2025 Contributors to the dwdat project.
// SPDX-License-Identifier: Apache-2.0

//! Common utilities shared across examples.

use std::path::PathBuf;

/// Initializes tracing subscriber for examples.
///
/// Logs to stderr with an INFO level filter, respecting the `RUST_LOG`
/// environment variable for custom log levels.
pub fn setup_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::level_filters::LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .init();
}

/// Loads the library from `lib_dir`, or from the configured directory when `None`.
pub fn load_api(lib_dir: Option<PathBuf>) -> Result<dwdat::DwApiHandle, dwdat::Error> {
    match lib_dir {
        Some(dir) => dwdat::load_api_from_dir(dir),
        None => dwdat::load_default_api(),
    }
}
