//! Console-mode restoration on Ctrl+C, Ctrl+Break and console close.
//!
//! With `ENABLE_PROCESSED_INPUT` set, Ctrl+C never reaches the read loop: the
//! console host calls the process's control handlers and, when none of them
//! claims the event, the default handler terminates the process without
//! unwinding.  `Drop` never runs on that path, so a backend that wants its
//! saved mode back registers a control handler which consumes the
//! [`PendingRestore`] slot before the default handler exits.
//!
//! The slot is shared between the reading thread (which arms it and consumes
//! it on drop) and the thread the console host runs handlers on.  Whichever
//! side takes it first restores; the other finds it empty.

use std::sync::{Mutex, PoisonError};

use tracing::debug;

/// `CTRL_C_EVENT` control type.
pub const CTRL_C_EVENT: u32 = 0;
/// `CTRL_BREAK_EVENT` control type.
pub const CTRL_BREAK_EVENT: u32 = 1;
/// `CTRL_CLOSE_EVENT` control type.
pub const CTRL_CLOSE_EVENT: u32 = 2;

/// A console handle and the mode to put back on it.
///
/// The handle is stored as its integer value so the slot stays `Send` on
/// every target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavedMode {
    pub handle: isize,
    pub mode: u32,
}

/// One-shot slot holding the mode to restore.
#[derive(Debug, Default)]
pub struct PendingRestore {
    slot: Mutex<Option<SavedMode>>,
}

impl PendingRestore {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Stores `saved`, replacing anything armed earlier.
    pub fn arm(&self, saved: SavedMode) {
        *self.lock() = Some(saved);
    }

    /// Clears the slot without restoring.
    pub fn disarm(&self) -> Option<SavedMode> {
        self.lock().take()
    }

    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }

    /// Takes the armed mode and passes it to `restore`.
    ///
    /// Returns `false` without calling `restore` when nothing is armed.
    pub fn run(&self, restore: impl FnOnce(SavedMode)) -> bool {
        // Release the lock before calling out.
        let saved = self.lock().take();
        match saved {
            Some(saved) => {
                restore(saved);
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SavedMode>> {
        // A panic while holding the lock cannot leave an `Option` half-written.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handles one console control event.
///
/// Ctrl+C, Ctrl+Break and console close restore the armed mode; every other
/// control type (logoff, shutdown) is ignored.  Returns whether a restore ran.
pub fn on_console_ctrl(
    pending: &PendingRestore,
    ctrl_type: u32,
    restore: impl FnOnce(SavedMode),
) -> bool {
    match ctrl_type {
        CTRL_C_EVENT | CTRL_BREAK_EVENT | CTRL_CLOSE_EVENT => {
            let restored = pending.run(restore);
            debug!(ctrl_type, restored, "console control event");
            restored
        }
        _ => false,
    }
}

/// Slot used by the Windows backend and its registered control handler.
#[cfg(target_os = "windows")]
pub(crate) static PENDING_RESTORE: PendingRestore = PendingRestore::new();
