//! # keyscope-core
//!
//! Platform-independent half of KeyScope: the modifier mask codec, the
//! fixed-layout console input record decoder, and the key read loop that
//! turns a stream of raw records into key presses.
//!
//! This crate has zero dependencies on OS APIs.  The console itself is
//! reached through the [`ConsoleSource`] trait; the real backends live in the
//! `keyscope` crate and are selected at compile time.
//!
//! # Architecture overview
//!
//! ```text
//! ConsoleSource::read_record()     one 20-byte record per call (blocking)
//!        │
//!        ▼
//! record::decode_input_record()    typed InputRecord (Key / Other)
//!        │
//!        ▼
//! KeyScope::read_all()             discard non-key and key-up records
//!        │
//!        ├─► KeyScope::read()          (char, virtual key, ModifierState)
//!        └─► KeyScope::read_combine()  skip null-char presses, join surrogates
//! ```
//!
//! - **`modifier`** – `ModifierState`, the nine named flags packed in the
//!   console's control-key-state mask.
//! - **`record`** – byte offsets of the console input record and its decoder.
//! - **`source`** – the `ConsoleSource` trait plus a scripted test double.
//! - **`scope`** – `KeyScope`, the read operations, and `KeyScopeError`.

pub mod modifier;
pub mod record;
pub mod scope;
pub mod source;

pub use modifier::ModifierState;
pub use record::{
    decode_input_record, InputRecord, KeyEventRecord, OtherEvent, RecordError, INPUT_RECORD_SIZE,
};
pub use scope::{decode_code_unit, KeyPress, KeyScope, KeyScopeError, RawKeyRead};
pub use source::{raw_input_mode, ConsoleSource};
