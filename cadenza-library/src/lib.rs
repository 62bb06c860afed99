//! Preset library for Cadenza - storage contract, CRUD service, and
//! debounced persistence

mod service;
mod store;
mod writer;

pub use service::{LibraryEntry, LibraryError, PresetLibrary, LIBRARY_KEY};
pub use store::{KvStore, MemoryStore, SqliteStore, StoreError};
pub use writer::DebouncedWriter;
