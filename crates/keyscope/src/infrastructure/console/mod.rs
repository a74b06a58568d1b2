//! Console input backends.
//!
//! Exactly one backend is compiled in, selected via `#[cfg(target_os = ...)]`:
//!
//! - Windows: [`windows::WindowsConsole`] reads `INPUT_RECORD`s with
//!   `ReadConsoleInputW`.
//! - Everything else: [`unsupported::UnsupportedConsole`] fails every call
//!   with `KeyScopeError::UnsupportedPlatform`, so callers can tell "not
//!   implemented" apart from "no event yet".
//!
//! [`PlatformConsole`] names whichever one this build uses.  [`restore`]
//! puts the saved console mode back when Ctrl+C ends the process.

use keyscope_core::{KeyScope, KeyScopeError};
use tracing::info;

use super::storage::config::ConsoleConfig;

pub mod restore;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(not(target_os = "windows"))]
pub mod unsupported;

/// The console backend of this build.
#[cfg(target_os = "windows")]
pub type PlatformConsole = windows::WindowsConsole;

/// The console backend of this build.
#[cfg(not(target_os = "windows"))]
pub type PlatformConsole = unsupported::UnsupportedConsole;

/// Creates a key scope over the platform console and puts it into raw mode.
///
/// # Errors
///
/// Returns [`KeyScopeError::UnsupportedPlatform`] on builds without a console
/// backend, or [`KeyScopeError::Console`] if the input handle is unavailable.
pub fn open_key_scope(config: &ConsoleConfig) -> Result<KeyScope<PlatformConsole>, KeyScopeError> {
    let mut scope = KeyScope::new(PlatformConsole::new(config));
    scope.init()?;
    info!(
        restore_mode_on_drop = config.restore_mode_on_drop,
        "console switched to raw input mode"
    );
    Ok(scope)
}
