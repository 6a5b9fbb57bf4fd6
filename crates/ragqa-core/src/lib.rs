//! Shared building blocks of the ragqa pipeline: domain types, errors,
//! configuration, chunking and document sources.

pub mod chunker;
pub mod config;
pub mod error;
pub mod source;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
