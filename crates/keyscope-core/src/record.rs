//! Fixed-layout decoder for console input records.
//!
//! Byte layout (little-endian, matches the Win32 `INPUT_RECORD` holding a
//! `KEY_EVENT_RECORD`):
//! ```text
//! [event_type:2][pad:2][key_down:4][repeat:2][vk:2][scan:2][char:2][ctrl_state:4]
//! ```
//! Total size: 20 bytes.  The payload after the 4-byte prefix is a 16-byte
//! union; only the key-event interpretation is decoded, every other event
//! type is surfaced as [`InputRecord::Other`] with its discriminant.

use thiserror::Error;

/// Size of one console input record in bytes.
pub const INPUT_RECORD_SIZE: usize = 20;

/// Discriminant of a keyboard event.
pub const KEY_EVENT: u16 = 0x0001;
/// Discriminant of a mouse event.
pub const MOUSE_EVENT: u16 = 0x0002;
/// Discriminant of a console buffer resize.
pub const WINDOW_BUFFER_SIZE_EVENT: u16 = 0x0004;
/// Discriminant of a menu event (internal to the console host).
pub const MENU_EVENT: u16 = 0x0008;
/// Discriminant of a focus change.
pub const FOCUS_EVENT: u16 = 0x0010;

// Field offsets from the start of the record.
const EVENT_TYPE_OFFSET: usize = 0;
const KEY_DOWN_OFFSET: usize = 4;
const REPEAT_COUNT_OFFSET: usize = 8;
const VIRTUAL_KEY_CODE_OFFSET: usize = 10;
const VIRTUAL_SCAN_CODE_OFFSET: usize = 12;
const CHAR_OFFSET: usize = 14;
const CONTROL_KEY_STATE_OFFSET: usize = 16;

/// Errors produced while decoding a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    /// The byte slice is shorter than one record.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// A source reported writing more bytes than a record buffer holds.
    #[error("byte count {count} exceeds the {capacity}-byte record buffer")]
    CountOutOfRange { count: usize, capacity: usize },
}

/// Payload of a keyboard event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyEventRecord {
    /// `true` for a press, `false` for a release.
    pub key_down: bool,
    /// Number of times the keystroke repeats while held.
    pub repeat_count: u16,
    /// Layout-independent logical key identifier.
    pub virtual_key_code: u16,
    /// Hardware position of the key.
    pub virtual_scan_code: u16,
    /// One UTF-16 code unit (possibly a surrogate half), little-endian.
    pub char_bytes: [u8; 2],
    /// Packed modifier mask; see [`crate::ModifierState`].
    pub control_key_state: u32,
}

/// Discriminant of a record that is not a keyboard event.
///
/// Cannot hold [`KEY_EVENT`], so an [`InputRecord::Other`] always serializes
/// to bytes that decode back to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtherEvent(u16);

impl OtherEvent {
    /// Returns `None` for [`KEY_EVENT`].
    pub fn new(event_type: u16) -> Option<Self> {
        (event_type != KEY_EVENT).then_some(Self(event_type))
    }

    pub fn event_type(&self) -> u16 {
        self.0
    }
}

/// One decoded console input record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRecord {
    Key(KeyEventRecord),
    /// Mouse, resize, menu, focus or any unrecognised event.
    Other(OtherEvent),
}

impl InputRecord {
    /// Returns the event-type discriminant.
    pub fn event_type(&self) -> u16 {
        match self {
            InputRecord::Key(_) => KEY_EVENT,
            InputRecord::Other(other) => other.event_type(),
        }
    }

    /// Serializes the record into its 20-byte wire layout.
    ///
    /// Non-key records carry a zeroed payload.
    pub fn to_bytes(&self) -> [u8; INPUT_RECORD_SIZE] {
        let mut buf = [0u8; INPUT_RECORD_SIZE];
        put(&mut buf, EVENT_TYPE_OFFSET, &self.event_type().to_le_bytes());
        if let InputRecord::Key(key) = self {
            put(&mut buf, KEY_DOWN_OFFSET, &i32::from(key.key_down).to_le_bytes());
            put(&mut buf, REPEAT_COUNT_OFFSET, &key.repeat_count.to_le_bytes());
            put(&mut buf, VIRTUAL_KEY_CODE_OFFSET, &key.virtual_key_code.to_le_bytes());
            put(&mut buf, VIRTUAL_SCAN_CODE_OFFSET, &key.virtual_scan_code.to_le_bytes());
            put(&mut buf, CHAR_OFFSET, &key.char_bytes);
            put(&mut buf, CONTROL_KEY_STATE_OFFSET, &key.control_key_state.to_le_bytes());
        }
        buf
    }
}

/// Decodes one [`InputRecord`] from the beginning of `bytes`.
///
/// Bytes past the first record are ignored.
///
/// # Errors
///
/// Returns [`RecordError::InsufficientData`] if fewer than
/// [`INPUT_RECORD_SIZE`] bytes are available.
///
/// # Examples
///
/// ```rust
/// use keyscope_core::record::{decode_input_record, InputRecord, KeyEventRecord};
///
/// let key = KeyEventRecord { key_down: true, virtual_key_code: 0x41, ..Default::default() };
/// let bytes = InputRecord::Key(key).to_bytes();
/// assert_eq!(decode_input_record(&bytes).unwrap(), InputRecord::Key(key));
/// ```
pub fn decode_input_record(bytes: &[u8]) -> Result<InputRecord, RecordError> {
    if bytes.len() < INPUT_RECORD_SIZE {
        return Err(RecordError::InsufficientData {
            needed: INPUT_RECORD_SIZE,
            available: bytes.len(),
        });
    }

    // bytes[2..4] are alignment padding – ignored on decode
    let event_type = read_u16(bytes, EVENT_TYPE_OFFSET);
    if event_type != KEY_EVENT {
        return Ok(InputRecord::Other(OtherEvent(event_type)));
    }

    Ok(InputRecord::Key(KeyEventRecord {
        key_down: read_i32(bytes, KEY_DOWN_OFFSET) != 0,
        repeat_count: read_u16(bytes, REPEAT_COUNT_OFFSET),
        virtual_key_code: read_u16(bytes, VIRTUAL_KEY_CODE_OFFSET),
        virtual_scan_code: read_u16(bytes, VIRTUAL_SCAN_CODE_OFFSET),
        char_bytes: [bytes[CHAR_OFFSET], bytes[CHAR_OFFSET + 1]],
        control_key_state: read_u32(bytes, CONTROL_KEY_STATE_OFFSET),
    }))
}

// ── Field helpers ─────────────────────────────────────────────────────────────
// Callers have already checked the length, so the slices below are in range.

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_i32(bytes: &[u8], at: usize) -> i32 {
    i32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

fn put(buf: &mut [u8; INPUT_RECORD_SIZE], at: usize, field: &[u8]) {
    buf[at..at + field.len()].copy_from_slice(field);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
