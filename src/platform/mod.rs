//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time/ticks (fixed-step scheduling off the frame clock)
//! - Storage (LocalStorage on web, in-memory elsewhere)

pub mod storage;
pub mod time;

#[cfg(target_arch = "wasm32")]
pub use storage::LocalStore;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use time::FixedStepper;
