//! Console input sources.
//!
//! A [`ConsoleSource`] is the OS side of KeyScope: it owns the console input
//! handle, can switch it into raw mode, and hands out one raw input record
//! per blocking call.  Records are passed as bytes; decoding them is the job
//! of [`crate::record`].
//!
//! The real backends live in the `keyscope` crate and are selected at compile
//! time.  [`mock::ScriptedSource`] replays a fixed list of records for tests.

pub mod mock;

use crate::record::INPUT_RECORD_SIZE;
use crate::scope::KeyScopeError;

/// Characters are delivered as they are typed and Ctrl+C is handled by the
/// console host.
pub const ENABLE_PROCESSED_INPUT: u32 = 0x0001;
/// Input is buffered until Enter.
pub const ENABLE_LINE_INPUT: u32 = 0x0002;
/// Typed characters are echoed back to the screen.
pub const ENABLE_ECHO_INPUT: u32 = 0x0004;

/// Computes the raw-input console mode from the current one: line input and
/// echo are cleared, processed input is set, every other bit is kept.
pub fn raw_input_mode(mode: u32) -> u32 {
    mode & !(ENABLE_ECHO_INPUT | ENABLE_LINE_INPUT) | ENABLE_PROCESSED_INPUT
}

/// Producer of raw console input records.
///
/// Implementations are not required to be thread-safe: a source is owned by
/// exactly one [`crate::KeyScope`] and every call goes through `&mut self`.
#[cfg_attr(test, mockall::automock)]
pub trait ConsoleSource {
    /// Acquires the input handle if needed and switches it into raw mode.
    ///
    /// Failures to change the mode are not errors; implementations log them
    /// and leave the console as it was.
    ///
    /// # Errors
    ///
    /// Returns [`KeyScopeError::UnsupportedPlatform`] on builds with no
    /// console backend, or [`KeyScopeError::Console`] if no input handle can
    /// be obtained.
    fn enable_raw_mode(&mut self) -> Result<(), KeyScopeError>;

    /// Blocks until one input record is available and copies it into `buf`.
    ///
    /// Returns the number of bytes written; anything short of
    /// [`INPUT_RECORD_SIZE`] is reported by the caller as a malformed record.
    ///
    /// # Errors
    ///
    /// Returns [`KeyScopeError::Console`] if the underlying read fails.
    fn read_record(&mut self, buf: &mut [u8; INPUT_RECORD_SIZE]) -> Result<usize, KeyScopeError>;
}
