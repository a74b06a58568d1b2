//! Scripted console source for testing.
//!
//! Replays a fixed list of records without a real console.  Once the script
//! is exhausted every read fails with [`KeyScopeError::Console`], so a test
//! that waits for an event which never comes fails instead of hanging.

use std::collections::VecDeque;

use crate::record::{InputRecord, KeyEventRecord, OtherEvent, INPUT_RECORD_SIZE};
use crate::scope::KeyScopeError;

use super::ConsoleSource;

/// A [`ConsoleSource`] that yields pre-recorded input records in order.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: VecDeque<Vec<u8>>,
    records_read: usize,
    raw_mode_calls: u32,
}

impl ScriptedSource {
    /// Creates an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a decoded record.
    pub fn push_record(&mut self, record: InputRecord) -> &mut Self {
        self.script.push_back(record.to_bytes().to_vec());
        self
    }

    /// Appends raw bytes verbatim.  Slices shorter than a full record let
    /// tests exercise the malformed-record path.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.script.push_back(bytes.to_vec());
        self
    }

    /// Appends a key press carrying one UTF-16 code unit.
    pub fn push_key_down(&mut self, virtual_key_code: u16, code_unit: u16, mask: u32) -> &mut Self {
        self.push_record(key_record(true, virtual_key_code, code_unit, mask))
    }

    /// Appends a key release.
    pub fn push_key_up(&mut self, virtual_key_code: u16, code_unit: u16, mask: u32) -> &mut Self {
        self.push_record(key_record(false, virtual_key_code, code_unit, mask))
    }

    /// Appends a non-keyboard record with the given discriminant.
    ///
    /// Panics if `event_type` is [`KEY_EVENT`](crate::record::KEY_EVENT); use `push_key_down` /
    /// `push_key_up` for keyboard records.
    pub fn push_other(&mut self, event_type: u16) -> &mut Self {
        let other = OtherEvent::new(event_type)
            .unwrap_or_else(|| panic!("push_other called with KEY_EVENT; use push_key_down / push_key_up"));
        self.push_record(InputRecord::Other(other))
    }

    /// Number of records handed out so far.
    pub fn records_read(&self) -> usize {
        self.records_read
    }

    /// Number of records still queued.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Number of times [`ConsoleSource::enable_raw_mode`] was called.
    pub fn raw_mode_calls(&self) -> u32 {
        self.raw_mode_calls
    }
}

fn key_record(key_down: bool, virtual_key_code: u16, code_unit: u16, mask: u32) -> InputRecord {
    InputRecord::Key(KeyEventRecord {
        key_down,
        repeat_count: 1,
        virtual_key_code,
        virtual_scan_code: 0,
        char_bytes: code_unit.to_le_bytes(),
        control_key_state: mask,
    })
}

impl ConsoleSource for ScriptedSource {
    fn enable_raw_mode(&mut self) -> Result<(), KeyScopeError> {
        self.raw_mode_calls += 1;
        Ok(())
    }

    fn read_record(&mut self, buf: &mut [u8; INPUT_RECORD_SIZE]) -> Result<usize, KeyScopeError> {
        let bytes = self
            .script
            .pop_front()
            .ok_or_else(|| KeyScopeError::Console("scripted source exhausted".to_string()))?;
        self.records_read += 1;
        let n = bytes.len().min(INPUT_RECORD_SIZE);
        buf[..n].copy_from_slice(&bytes[..n]);
        Ok(n)
    }
}
