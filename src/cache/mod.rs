//! Versioned named stores and the retrieval strategies applied to them.
//!
//! A named store is a persistent key-value area mapping request identities
//! to buffered responses. Two logical stores exist per deployed version,
//! one for the app shell and one for news API responses; both carry the
//! version tag in their name so activation can drop everything from a
//! previous deploy by name alone.

mod storage;
mod strategy;

pub use storage::{MemoryStores, NamedStores, SqliteStores, StoredEntry};
pub use strategy::{cache_first, network_first, ResponseSource, Served};
