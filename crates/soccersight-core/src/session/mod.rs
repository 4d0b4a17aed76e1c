//! Team session cache.
//!
//! This module provides the `SessionStore`, a single-slot cache for the
//! active team context. Entries expire 30 minutes after they are written;
//! expired or unreadable entries are purged on read.
//!
//! Storage is pluggable through `SessionStorage`:
//! - `FileStorage`: one JSON file per key under the cache directory
//! - `MemoryStorage`: process-local, with an optional byte quota

pub mod clock;
pub mod storage;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use store::{SessionContext, SessionStore, SESSION_EXPIRY_MINUTES, SESSION_KEY};
