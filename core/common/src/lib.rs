//! Common utilities and types shared across pinvault crates.
//!
//! This module provides the error taxonomy and the small identifier and
//! buffer types that every layer passes around.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{RecordId, SensitiveBytes};
