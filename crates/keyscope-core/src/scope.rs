//! The key read loop.
//!
//! [`KeyScope`] owns one [`ConsoleSource`] and offers three reads with
//! different completion criteria:
//!
//! | operation        | returns after                                        |
//! |------------------|------------------------------------------------------|
//! | [`read_all`]     | the first key-down record (raw fields)               |
//! | [`read`]         | one `read_all`, character and modifiers decoded      |
//! | [`read_combine`] | the first press with a non-null char or enhanced key |
//!
//! All three block the calling thread; there is no timeout or cancellation.
//!
//! [`read_all`]: KeyScope::read_all
//! [`read`]: KeyScope::read
//! [`read_combine`]: KeyScope::read_combine

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};

use crate::modifier::ModifierState;
use crate::record::{decode_input_record, InputRecord, RecordError, INPUT_RECORD_SIZE};
use crate::source::ConsoleSource;

/// Errors returned by [`KeyScope`] operations.
#[derive(Debug, Error)]
pub enum KeyScopeError {
    /// This build has no console backend.  Never retry.
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),

    /// The underlying console call failed (closed handle, no console attached).
    #[error("console error: {0}")]
    Console(String),

    /// The source handed over bytes that do not form a complete record.
    #[error("malformed input record: {0}")]
    MalformedRecord(#[from] RecordError),
}

/// Raw fields of one key-down record, as returned by [`KeyScope::read_all`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RawKeyRead {
    /// One little-endian UTF-16 code unit.
    pub char_bytes: [u8; 2],
    /// Packed modifier mask.
    pub control_key_state: u32,
    pub repeat_count: u16,
    pub virtual_key_code: u16,
    /// Hardware scan code.
    pub virtual_scan_code: u16,
}

impl RawKeyRead {
    /// The character code unit as a number.
    pub fn code_unit(&self) -> u16 {
        u16::from_le_bytes(self.char_bytes)
    }
}

/// A decoded key press, as returned by [`KeyScope::read`] and
/// [`KeyScope::read_combine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct KeyPress {
    /// `'\0'` when the key produces no character (modifiers, arrows, F-keys).
    pub character: char,
    pub virtual_key_code: u16,
    pub state: ModifierState,
}

impl KeyPress {
    fn from_raw(raw: &RawKeyRead, character: char) -> Self {
        Self {
            character,
            virtual_key_code: raw.virtual_key_code,
            state: ModifierState::from_mask(raw.control_key_state),
        }
    }
}

/// Decodes one little-endian UTF-16 code unit.
///
/// A lone surrogate half cannot stand for a character on its own and decodes
/// to [`char::REPLACEMENT_CHARACTER`].
pub fn decode_code_unit(bytes: [u8; 2]) -> char {
    char::decode_utf16([u16::from_le_bytes(bytes)])
        .next()
        .and_then(Result::ok)
        .unwrap_or(char::REPLACEMENT_CHARACTER)
}

fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..=0xDBFF).contains(&unit)
}

fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..=0xDFFF).contains(&unit)
}

/// Keyboard reader over a console source.
///
/// A scope is `Uninitialized` until [`init`](Self::init) succeeds and stays
/// ready for the rest of its life; there is no close.  Reads take `&mut self`,
/// so one scope is never read from two places at once.  Two scopes over the
/// same OS console would split its event stream between them; don't.
#[derive(Debug)]
pub struct KeyScope<S> {
    source: S,
    initialized: bool,
}

impl<S: ConsoleSource> KeyScope<S> {
    /// Wraps `source` without touching the console.
    pub fn new(source: S) -> Self {
        Self {
            source,
            initialized: false,
        }
    }

    /// Puts the console into raw input mode.
    ///
    /// Calling this again re-applies the same mode; it is harmless but does
    /// the OS calls a second time.
    ///
    /// # Errors
    ///
    /// Propagates [`KeyScopeError`] from the source, notably
    /// [`KeyScopeError::UnsupportedPlatform`].
    pub fn init(&mut self) -> Result<(), KeyScopeError> {
        if self.initialized {
            debug!("key scope already initialised; re-applying raw mode");
        }
        self.source.enable_raw_mode()?;
        self.initialized = true;
        debug!("key scope ready");
        Ok(())
    }

    /// Returns `true` once [`init`](Self::init) has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Blocks until the next key-down record and returns its raw fields.
    ///
    /// Non-keyboard records and key releases are discarded.  Only one record
    /// is held at a time.
    ///
    /// # Errors
    ///
    /// Returns [`KeyScopeError::Console`] if the source read fails and
    /// [`KeyScopeError::MalformedRecord`] if it reports a byte count that is
    /// short of, or larger than, one record.
    pub fn read_all(&mut self) -> Result<RawKeyRead, KeyScopeError> {
        let mut buf = [0u8; INPUT_RECORD_SIZE];
        loop {
            let n = self.source.read_record(&mut buf)?;
            let bytes = buf.get(..n).ok_or(RecordError::CountOutOfRange {
                count: n,
                capacity: INPUT_RECORD_SIZE,
            })?;
            match decode_input_record(bytes)? {
                InputRecord::Key(key) if key.key_down => {
                    return Ok(RawKeyRead {
                        char_bytes: key.char_bytes,
                        control_key_state: key.control_key_state,
                        repeat_count: key.repeat_count,
                        virtual_key_code: key.virtual_key_code,
                        virtual_scan_code: key.virtual_scan_code,
                    });
                }
                InputRecord::Key(key) => {
                    trace!(vk = key.virtual_key_code, "discarding key release");
                }
                InputRecord::Other(other) => {
                    trace!(event_type = other.event_type(), "discarding non-keyboard record");
                }
            }
        }
    }

    /// Reads one key press and decodes its character and modifiers.
    ///
    /// The character is whatever the single code unit decodes to; a lone
    /// surrogate half comes back as U+FFFD.
    ///
    /// # Errors
    ///
    /// See [`read_all`](Self::read_all).
    pub fn read(&mut self) -> Result<KeyPress, KeyScopeError> {
        let raw = self.read_all()?;
        Ok(KeyPress::from_raw(&raw, decode_code_unit(raw.char_bytes)))
    }

    /// Reads until a press produces a character or comes from the enhanced
    /// key region.
    ///
    /// Presses with a null character and no enhanced flag (bare modifiers,
    /// the first stroke of a dead-key sequence) are dropped.  A high surrogate
    /// is held back and joined with the next low surrogate into one
    /// supplementary character; a high surrogate that is not followed by a low
    /// one is dropped.
    ///
    /// # Errors
    ///
    /// See [`read_all`](Self::read_all).
    pub fn read_combine(&mut self) -> Result<KeyPress, KeyScopeError> {
        let mut pending_high: Option<u16> = None;
        loop {
            let raw = self.read_all()?;
            let unit = raw.code_unit();

            if is_high_surrogate(unit) {
                if pending_high.replace(unit).is_some() {
                    debug!("dropping unpaired high surrogate");
                }
                continue;
            }

            if is_low_surrogate(unit) {
                if let Some(high) = pending_high.take() {
                    let joined = char::decode_utf16([high, unit])
                        .next()
                        .and_then(Result::ok)
                        .unwrap_or(char::REPLACEMENT_CHARACTER);
                    return Ok(KeyPress::from_raw(&raw, joined));
                }
            }

            let press = KeyPress::from_raw(&raw, decode_code_unit(raw.char_bytes));
            if press.character != '\0' || press.state.enhanced_key {
                if pending_high.take().is_some() {
                    debug!("dropping unpaired high surrogate");
                }
                return Ok(press);
            }
            trace!(vk = press.virtual_key_code, "skipping null-character press");
        }
    }

    /// Borrows the underlying source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consumes the scope and returns the source.
    pub fn into_source(self) -> S {
        self.source
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{KeyEventRecord, OtherEvent, MOUSE_EVENT, WINDOW_BUFFER_SIZE_EVENT};
    use crate::source::mock::ScriptedSource;
    use crate::source::MockConsoleSource;

    const SHIFT: u32 = ModifierState::SHIFT_PRESSED;
    const ENHANCED: u32 = ModifierState::ENHANCED_KEY;

    fn scope_with(build: impl FnOnce(&mut ScriptedSource)) -> KeyScope<ScriptedSource> {
        let mut source = ScriptedSource::new();
        build(&mut source);
        KeyScope::new(source)
    }

    // ── init ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_init_enables_raw_mode_once_per_call() {
        // Arrange
        let mut scope = scope_with(|_| {});
        assert!(!scope.is_initialized());

        // Act
        scope.init().expect("first init");
        scope.init().expect("second init");

        // Assert
        assert!(scope.is_initialized());
        assert_eq!(scope.source().raw_mode_calls(), 2);
    }

    #[test]
    fn test_init_failure_leaves_scope_uninitialized() {
        // Arrange
        let mut source = MockConsoleSource::new();
        source
            .expect_enable_raw_mode()
            .times(1)
            .returning(|| Err(KeyScopeError::UnsupportedPlatform("test".to_string())));
        source.expect_read_record().never();
        let mut scope = KeyScope::new(source);

        // Act
        let result = scope.init();

        // Assert
        assert!(matches!(result, Err(KeyScopeError::UnsupportedPlatform(_))));
        assert!(!scope.is_initialized());
    }

    // ── read_all ──────────────────────────────────────────────────────────────

    #[test]
    fn test_read_all_skips_non_key_and_key_up_records() {
        // Arrange
        let mut scope = scope_with(|s| {
            s.push_other(MOUSE_EVENT)
                .push_key_up(0x41, 'a' as u16, 0)
                .push_other(WINDOW_BUFFER_SIZE_EVENT)
                .push_key_down(0x42, 'B' as u16, SHIFT)
                .push_key_down(0x43, 'c' as u16, 0);
        });

        // Act
        let raw = scope.read_all().expect("read_all");

        // Assert
        assert_eq!(
            raw,
            RawKeyRead {
                char_bytes: [b'B', 0],
                control_key_state: SHIFT,
                repeat_count: 1,
                virtual_key_code: 0x42,
                virtual_scan_code: 0,
            }
        );
        assert_eq!(scope.source().records_read(), 4);
        assert_eq!(scope.source().remaining(), 1);
    }

    #[test]
    fn test_read_all_propagates_source_failure() {
        let mut scope = scope_with(|s| {
            s.push_key_up(0x41, 'a' as u16, 0);
        });

        let result = scope.read_all();

        assert!(matches!(result, Err(KeyScopeError::Console(_))));
    }

    #[test]
    fn test_read_all_reports_short_record() {
        let mut scope = scope_with(|s| {
            s.push_bytes(&[0x01, 0x00, 0x00, 0x00, 0x01]);
        });

        let result = scope.read_all();

        assert!(matches!(
            result,
            Err(KeyScopeError::MalformedRecord(RecordError::InsufficientData {
                needed: 20,
                available: 5
            }))
        ));
    }

    #[test]
    fn test_read_all_queries_the_source_once_per_record() {
        // Arrange
        let mut source = MockConsoleSource::new();
        let mut calls = 0;
        source.expect_read_record().times(2).returning(move |buf| {
            calls += 1;
            let record = if calls == 1 {
                InputRecord::Other(OtherEvent::new(MOUSE_EVENT).expect("mouse event"))
            } else {
                InputRecord::Key(KeyEventRecord {
                    key_down: true,
                    virtual_key_code: 0x0D,
                    char_bytes: [b'\r', 0],
                    ..Default::default()
                })
            };
            buf.copy_from_slice(&record.to_bytes());
            Ok(INPUT_RECORD_SIZE)
        });
        let mut scope = KeyScope::new(source);

        // Act
        let raw = scope.read_all().expect("read_all");

        // Assert
        assert_eq!(raw.virtual_key_code, 0x0D);
    }

    #[test]
    fn test_read_all_rejects_byte_count_larger_than_buffer() {
        // Arrange
        let mut source = MockConsoleSource::new();
        source.expect_read_record().times(1).returning(|buf| {
            let key = KeyEventRecord {
                key_down: true,
                virtual_key_code: 0x41,
                char_bytes: [b'a', 0],
                ..Default::default()
            };
            buf.copy_from_slice(&InputRecord::Key(key).to_bytes());
            Ok(32)
        });
        let mut scope = KeyScope::new(source);

        // Act
        let result = scope.read_all();

        // Assert
        assert!(matches!(
            result,
            Err(KeyScopeError::MalformedRecord(RecordError::CountOutOfRange {
                count: 32,
                capacity: 20
            }))
        ));
    }

    // ── read ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_read_decodes_shift_a() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0x41, 0x0041, 0x0010);
        });

        let press = scope.read().expect("read");

        assert_eq!(press.character, 'A');
        assert_eq!(press.virtual_key_code, 0x41);
        assert_eq!(
            press.state,
            ModifierState {
                shift_pressed: true,
                ..Default::default()
            }
        );
    }

    #[test]
    fn test_read_returns_null_character_for_modifier_only_press() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0x10, 0, SHIFT);
        });

        let press = scope.read().expect("read");

        assert_eq!(press.character, '\0');
        assert_eq!(press.virtual_key_code, 0x10);
    }

    #[test]
    fn test_read_decodes_non_ascii_code_unit() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0xDE, 'é' as u16, 0);
        });

        assert_eq!(scope.read().expect("read").character, 'é');
    }

    #[test]
    fn test_read_lone_surrogate_yields_replacement_character() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83D, 0);
        });

        assert_eq!(scope.read().expect("read").character, char::REPLACEMENT_CHARACTER);
    }

    // ── read_combine ──────────────────────────────────────────────────────────

    #[test]
    fn test_read_combine_skips_null_character_presses() {
        // Arrange
        let mut scope = scope_with(|s| {
            s.push_key_down(0x10, 0, SHIFT)
                .push_key_down(0xDE, 0, 0)
                .push_key_down(0x45, 'ê' as u16, 0);
        });

        // Act
        let press = scope.read_combine().expect("read_combine");

        // Assert
        assert_eq!(press.character, 'ê');
        assert_eq!(press.virtual_key_code, 0x45);
        assert_eq!(scope.source().records_read(), 3);
    }

    #[test]
    fn test_read_combine_accepts_enhanced_key_without_character() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0x11, 0, ModifierState::LEFT_CTRL_PRESSED)
                .push_key_down(0x25, 0, ENHANCED);
        });

        let press = scope.read_combine().expect("read_combine");

        assert_eq!(press.character, '\0');
        assert_eq!(press.virtual_key_code, 0x25);
        assert!(press.state.enhanced_key);
    }

    #[test]
    fn test_read_combine_joins_surrogate_pair() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83D, 0)
                .push_key_up(0xE7, 0xD83D, 0)
                .push_key_down(0xE7, 0xDE00, 0);
        });

        let press = scope.read_combine().expect("read_combine");

        assert_eq!(press.character, '\u{1F600}');
    }

    #[test]
    fn test_read_combine_keeps_pending_high_across_null_press() {
        // Arrange
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83D, 0)
                .push_key_down(0x10, 0, SHIFT)
                .push_key_down(0xE7, 0xDE00, 0);
        });

        // Act
        let press = scope.read_combine().expect("read_combine");

        // Assert
        assert_eq!(press.character, '\u{1F600}');
        assert_eq!(scope.source().records_read(), 3);
    }

    #[test]
    fn test_read_combine_enhanced_press_discards_pending_high() {
        // Arrange
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83D, 0)
                .push_key_down(0x26, 0, ENHANCED)
                .push_key_down(0xE7, 0xDE00, 0);
        });

        // Act
        let first = scope.read_combine().expect("first read_combine");
        let second = scope.read_combine().expect("second read_combine");

        // Assert
        assert_eq!(first.character, '\0');
        assert_eq!(first.virtual_key_code, 0x26);
        assert!(first.state.enhanced_key);
        assert_eq!(second.character, char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn test_read_combine_second_high_surrogate_replaces_first() {
        // Arrange
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83C, 0)
                .push_key_down(0xE7, 0xD83D, 0)
                .push_key_down(0xE7, 0xDE00, 0);
        });

        // Act
        let press = scope.read_combine().expect("read_combine");

        // Assert
        assert_eq!(press.character, '\u{1F600}');
        assert_eq!(scope.source().remaining(), 0);
    }

    #[test]
    fn test_read_combine_drops_unpaired_high_surrogate() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xD83D, 0).push_key_down(0x5A, 'z' as u16, 0);
        });

        let press = scope.read_combine().expect("read_combine");

        assert_eq!(press.character, 'z');
    }

    #[test]
    fn test_read_combine_returns_lone_low_surrogate_as_replacement() {
        let mut scope = scope_with(|s| {
            s.push_key_down(0xE7, 0xDE00, 0);
        });

        let press = scope.read_combine().expect("read_combine");

        assert_eq!(press.character, char::REPLACEMENT_CHARACTER);
    }

    #[test]
    fn test_decode_code_unit_little_endian() {
        assert_eq!(decode_code_unit([0x41, 0x00]), 'A');
        assert_eq!(decode_code_unit([0xAC, 0x20]), '€');
        assert_eq!(decode_code_unit([0x00, 0x00]), '\0');
        assert_eq!(decode_code_unit([0x00, 0xDC]), char::REPLACEMENT_CHARACTER);
    }
}
