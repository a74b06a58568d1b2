//! Key event monitor: a diagnostic loop that prints every key press.
//!
//! This is the debugging companion of the library, not part of its contract.
//! It reads with the configured [`ReadMode`] and writes one entry per event
//! in the configured [`OutputFormat`] until the read fails or the optional
//! event limit is reached.
//!
//! Text output for a combine/single read looks like:
//!
//! ```text
//! rune = 'A'
//! code = 0x41
//! state = {RightAltPressed: false, LeftAltPressed: false, ..., EnhancedKey: false}
//! ```
//!
//! JSON output is one object per line.

use std::io::Write;

use clap::ValueEnum;
use keyscope_core::{ConsoleSource, KeyPress, KeyScope, KeyScopeError, RawKeyRead};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Which `KeyScope` read the monitor loops on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// `read_combine`: skip null-character presses.
    #[default]
    Combine,
    /// `read`: every key-down.
    Single,
    /// `read_all`: raw fields including repeat count and scan code.
    Raw,
}

/// How each event is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Options for [`run_monitor`].
#[derive(Debug, Clone, Default)]
pub struct MonitorOptions {
    pub mode: ReadMode,
    pub format: OutputFormat,
    /// Stop after this many events; `None` runs until the read fails.
    pub max_events: Option<u64>,
}

/// Error type for the monitor loop.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    KeyScope(#[from] KeyScopeError),
    #[error("failed to write event: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to encode event as JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Reads and prints key events.
///
/// Returns the number of events printed, which is only reached when
/// `options.max_events` is set.
///
/// # Errors
///
/// Returns [`MonitorError::KeyScope`] as soon as a read fails (on the
/// unsupported backend, on the very first read), or an output error.
pub fn run_monitor<S, W>(
    scope: &mut KeyScope<S>,
    options: &MonitorOptions,
    out: &mut W,
) -> Result<u64, MonitorError>
where
    S: ConsoleSource,
    W: Write,
{
    debug!(mode = ?options.mode, format = ?options.format, "monitor started");
    let mut printed = 0u64;
    while options.max_events.map_or(true, |max| printed < max) {
        match options.mode {
            ReadMode::Combine => write_press(out, &scope.read_combine()?, options.format)?,
            ReadMode::Single => write_press(out, &scope.read()?, options.format)?,
            ReadMode::Raw => write_raw(out, &scope.read_all()?, options.format)?,
        }
        out.flush()?;
        printed += 1;
    }
    Ok(printed)
}

fn write_press<W: Write>(out: &mut W, press: &KeyPress, format: OutputFormat) -> Result<(), MonitorError> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "rune = '{}'\ncode = 0x{:X}\nstate = {}\n",
            press.character.escape_debug(),
            press.virtual_key_code,
            press.state
        )?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, press)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_raw<W: Write>(out: &mut W, raw: &RawKeyRead, format: OutputFormat) -> Result<(), MonitorError> {
    match format {
        OutputFormat::Text => writeln!(
            out,
            "bytes = [0x{:02X}, 0x{:02X}]\nstate = 0x{:04X}\nrepeat = {}\ncode = 0x{:X}\nscan = 0x{:X}\n",
            raw.char_bytes[0],
            raw.char_bytes[1],
            raw.control_key_state,
            raw.repeat_count,
            raw.virtual_key_code,
            raw.virtual_scan_code
        )?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, raw)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
