//! Core types for Harbor
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: the stored value type (any JSON-representable value)
//! - LogEntry: the tagged log record (set/delete/bulk) with its line codec
//! - Error: the error type hierarchy shared by all crates

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entry;
pub mod error;

pub use entry::{LogEntry, Value};
pub use error::{Error, Result};
