//! Persistence for pinvault.
//!
//! The vault only needs a string key-value store with whole-value writes.
//! This module provides the trait and two backends.
//!
//! # Design Principles
//! - Each `set` replaces one key all-or-nothing
//! - No transactions across keys are assumed
//! - Async operations: all I/O is async

pub mod local;
pub mod memory;
pub mod store;

pub use local::FileStore;
pub use memory::MemoryStore;
pub use store::{validate_key, KeyValueStore};
