//! Windows console input backend.
//!
//! Acquires the standard input handle with `GetStdHandle`, switches it into
//! raw mode with `GetConsoleMode`/`SetConsoleMode`, and reads one
//! `INPUT_RECORD` at a time with `ReadConsoleInputW`.  The record is handed
//! to `keyscope_core` as its 20 raw bytes; no field is interpreted here.
//!
//! Mode changes are best-effort: a console that refuses them stays in cooked
//! mode and only a warning is logged.
//!
//! With `restore_mode_on_drop` the original mode comes back on drop and, via
//! a console control handler, on Ctrl+C, Ctrl+Break and console close.  The
//! handler returns `FALSE` so the default handler still ends the process.
//!
//! # Safety
//!
//! This module uses `unsafe` code exclusively for Windows API FFI calls.
//! All `unsafe` blocks are annotated with `// SAFETY:` comments.

#![cfg(target_os = "windows")]

use std::ffi::c_void;
use std::sync::Once;

use ::windows::Win32::Foundation::{BOOL, HANDLE};
use ::windows::Win32::System::Console::{
    GetConsoleMode, GetStdHandle, ReadConsoleInputW, SetConsoleCtrlHandler, SetConsoleMode,
    CONSOLE_MODE, INPUT_RECORD, STD_INPUT_HANDLE,
};
use keyscope_core::{raw_input_mode, ConsoleSource, KeyScopeError, INPUT_RECORD_SIZE};
use tracing::{debug, warn};

use super::restore::{on_console_ctrl, SavedMode, PENDING_RESTORE};
use crate::infrastructure::storage::config::ConsoleConfig;

/// Guards the one-time registration of [`console_ctrl_handler`].
static CTRL_HANDLER_INSTALLED: Once = Once::new();

// The byte view taken in `read_record` relies on this.
const _: () = assert!(std::mem::size_of::<INPUT_RECORD>() == INPUT_RECORD_SIZE);

/// Console input source over the process's standard input handle.
#[derive(Debug)]
pub struct WindowsConsole {
    handle: Option<HANDLE>,
    /// Mode found on the first successful `enable_raw_mode`.
    original_mode: Option<CONSOLE_MODE>,
    restore_mode_on_drop: bool,
}

impl WindowsConsole {
    /// Creates an unopened source.  The handle is acquired by
    /// [`ConsoleSource::enable_raw_mode`].
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            handle: None,
            original_mode: None,
            restore_mode_on_drop: config.restore_mode_on_drop,
        }
    }
}

impl ConsoleSource for WindowsConsole {
    fn enable_raw_mode(&mut self) -> Result<(), KeyScopeError> {
        // SAFETY: GetStdHandle has no preconditions.
        let handle = unsafe { GetStdHandle(STD_INPUT_HANDLE) }
            .map_err(|e| KeyScopeError::Console(format!("GetStdHandle failed: {e}")))?;
        self.handle = Some(handle);

        let mut mode = CONSOLE_MODE(0);
        // SAFETY: `mode` is a valid, writable CONSOLE_MODE for the duration of the call.
        if let Err(e) = unsafe { GetConsoleMode(handle, &mut mode) } {
            warn!("GetConsoleMode failed, console left unchanged: {e}");
            return Ok(());
        }
        // Keep the very first mode so a re-init does not record raw mode as "original".
        let original = *self.original_mode.get_or_insert(mode);
        if self.restore_mode_on_drop {
            PENDING_RESTORE.arm(SavedMode {
                handle: handle.0 as isize,
                mode: original.0,
            });
            install_ctrl_handler();
        }

        let raw = CONSOLE_MODE(raw_input_mode(mode.0));
        // SAFETY: `handle` was returned by GetStdHandle above.
        match unsafe { SetConsoleMode(handle, raw) } {
            Ok(()) => debug!(from = mode.0, to = raw.0, "console mode set"),
            Err(e) => warn!("SetConsoleMode failed, console left in cooked mode: {e}"),
        }
        Ok(())
    }

    fn read_record(&mut self, buf: &mut [u8; INPUT_RECORD_SIZE]) -> Result<usize, KeyScopeError> {
        let handle = self.handle.ok_or_else(|| {
            KeyScopeError::Console("console input handle not acquired; call init first".to_string())
        })?;

        let mut records = [INPUT_RECORD::default()];
        let mut records_read = 0u32;
        // SAFETY: `records` is a valid one-element buffer and `records_read` is
        // writable; the call blocks until at least one record is available.
        unsafe { ReadConsoleInputW(handle, &mut records, &mut records_read) }
            .map_err(|e| KeyScopeError::Console(format!("ReadConsoleInputW failed: {e}")))?;
        if records_read == 0 {
            return Ok(0);
        }

        // SAFETY: INPUT_RECORD is a plain-old-data struct of exactly
        // INPUT_RECORD_SIZE bytes (asserted above), fully initialised by
        // `default()` and then by the OS.  The byte view does not outlive `records`.
        let bytes = unsafe {
            std::slice::from_raw_parts(records.as_ptr().cast::<u8>(), INPUT_RECORD_SIZE)
        };
        buf.copy_from_slice(bytes);
        Ok(INPUT_RECORD_SIZE)
    }
}

impl Drop for WindowsConsole {
    fn drop(&mut self) {
        if self.restore_mode_on_drop {
            PENDING_RESTORE.run(restore_saved_mode);
        }
    }
}

fn install_ctrl_handler() {
    CTRL_HANDLER_INSTALLED.call_once(|| {
        // SAFETY: `console_ctrl_handler` is a `'static` function with the
        // HANDLER_ROUTINE signature and touches only process-global state.
        match unsafe { SetConsoleCtrlHandler(Some(console_ctrl_handler), BOOL::from(true)) } {
            Ok(()) => debug!("console control handler installed"),
            Err(e) => warn!("SetConsoleCtrlHandler failed, Ctrl+C will not restore the console mode: {e}"),
        }
    });
}

/// Runs on a thread created by the console host for each control event.
unsafe extern "system" fn console_ctrl_handler(ctrl_type: u32) -> BOOL {
    on_console_ctrl(&PENDING_RESTORE, ctrl_type, restore_saved_mode);
    // Not handled: let the default handler terminate the process.
    BOOL(0)
}

fn restore_saved_mode(saved: SavedMode) {
    let handle = HANDLE(saved.handle as *mut c_void);
    // SAFETY: `handle` is the standard input handle captured in enable_raw_mode;
    // standard handles stay valid for the life of the process.
    match unsafe { SetConsoleMode(handle, CONSOLE_MODE(saved.mode)) } {
        Ok(()) => debug!(mode = saved.mode, "console mode restored"),
        Err(e) => warn!("failed to restore console mode: {e}"),
    }
}
