//! Application layer: everything built on top of a ready `KeyScope`.

pub mod monitor;
