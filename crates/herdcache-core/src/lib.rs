//! herdcache-core: Core traits and types for the herdcache library
//!
//! This crate provides the foundational types and traits used throughout
//! the herdcache ecosystem.

mod error;
mod traits;
mod types;

pub use error::{CacheError, Result};
pub use traits::*;
pub use types::*;
