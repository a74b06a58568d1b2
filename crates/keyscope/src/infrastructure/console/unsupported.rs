//! Console backend for builds without console input support.
//!
//! Every call fails with [`KeyScopeError::UnsupportedPlatform`] before doing
//! anything, so there is never partial state to clean up.

#![cfg(not(target_os = "windows"))]

use keyscope_core::{ConsoleSource, KeyScopeError, INPUT_RECORD_SIZE};

use crate::infrastructure::storage::config::ConsoleConfig;

/// Placeholder source that rejects every operation.
#[derive(Debug, Default)]
pub struct UnsupportedConsole;

impl UnsupportedConsole {
    /// Creates the placeholder.  The configuration is accepted for signature
    /// parity with the real backends and ignored.
    pub fn new(_config: &ConsoleConfig) -> Self {
        Self
    }
}

fn unsupported() -> KeyScopeError {
    KeyScopeError::UnsupportedPlatform(format!(
        "KeyScope is not implemented for {} builds",
        std::env::consts::OS
    ))
}

impl ConsoleSource for UnsupportedConsole {
    fn enable_raw_mode(&mut self) -> Result<(), KeyScopeError> {
        Err(unsupported())
    }

    fn read_record(&mut self, _buf: &mut [u8; INPUT_RECORD_SIZE]) -> Result<usize, KeyScopeError> {
        Err(unsupported())
    }
}
