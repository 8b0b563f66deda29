//! In-memory LRU store

mod store;

pub use store::{MemoryConfig, MemoryStore};
