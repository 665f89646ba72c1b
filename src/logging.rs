// SPDX-License-Identifier: MIT
//
// Log setup.
//
// The terminal belongs to the UI, so logs go to a file: `GROVE_LOG_FILE`,
// or `grove.log` in the working directory. `GROVE_LOG` takes an
// `EnvFilter` directive (`debug`, `grove_term=trace`, ...) and defaults
// to `info`. If the file cannot be created the demo runs without logs.

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

pub const LOG_ENV: &str = "GROVE_LOG";
pub const LOG_FILE_ENV: &str = "GROVE_LOG_FILE";
const DEFAULT_LOG_FILE: &str = "grove.log";
const DEFAULT_FILTER: &str = "info";

fn log_path() -> PathBuf {
    env::var_os(LOG_FILE_ENV)
        .filter(|p| !p.is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_LOG_FILE), PathBuf::from)
}

fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Returns the log file in use, if any.
pub fn init() -> Option<PathBuf> {
    let path = log_path();
    let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

    tracing_subscriber::registry()
        .with(filter())
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .ok()?;
    Some(path)
}
