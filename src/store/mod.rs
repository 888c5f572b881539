//! Persisted sources and items.
//!
//! The scan pipeline only reads sources, writes back a discovered feed URL
//! and the last-scan time, checks which item URLs already exist, and inserts
//! new items in bulk. The remaining operations serve other collaborators.

pub mod repository;
pub mod types;

pub use repository::{ItemRepository, SourceRepository};
pub use types::{Item, ItemFilter, NewItem, NewSource, Source};
