//! Persistent storage adapters.

pub mod config;
