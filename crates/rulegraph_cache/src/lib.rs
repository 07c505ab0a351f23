//! Content-addressed external dependency cache.
//!
//! This crate provides the memoizing [`ContentHasher`], the mark-and-sweep
//! [`Store`] that persists state between runs, and the [`DependencyCache`]
//! that deduplicates external artifacts by content and assigns them stable
//! prebuilt rule names.

#![warn(missing_docs)]

pub mod depcache;
pub mod error;
pub mod fsutil;
pub mod hasher;
pub mod store;

pub use depcache::{CacheEntry, DependencyCache};
pub use error::CacheError;
pub use hasher::ContentHasher;
pub use store::Store;
