//! Infrastructure layer for keyscope.
//!
//! Contains OS-facing adapters: the console input backends and file-system
//! storage for the configuration.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `keyscope_core`, but MUST NOT be imported by the `application` layer.

pub mod console;
pub mod storage;
