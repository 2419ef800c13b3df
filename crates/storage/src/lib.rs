//! Local persistence layer for profiles and cached templates.
//!
//! Storage is modelled as an opaque key-value store ([`KeyValueStore`]) with
//! in-memory and file-backed implementations. This crate is the sole owner
//! of key naming ([`keys`]); everything above it goes through the
//! repositories:
//!
//! - [`ProfileRepo`]: profile records, corrupt entries read as absent.
//! - [`TemplateCacheRepo`]: last fetched template per template id.
//! - [`ProfileIndexRepo`]: ordered profile list plus active selection,
//!   rebuilt from the profile records when missing or corrupt.
//! - [`CoalescingWriter`]: debounced writes with an explicit `flush`.
//!
//! There is no cross-process locking: a single writer is assumed.

pub mod error;
pub mod file;
pub mod keys;
pub mod kv;
pub mod repositories;
pub mod writer;

pub use error::StorageError;
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use repositories::{ProfileIndex, ProfileIndexRepo, ProfileRepo, ProfileSummary, TemplateCacheRepo};
pub use writer::{CoalescingWriter, DEFAULT_DEBOUNCE};

/// Shared handle to a store, cloned into repositories' callers and writers.
pub type SharedStore = std::sync::Arc<dyn KeyValueStore>;
