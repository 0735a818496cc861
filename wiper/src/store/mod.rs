//! Table store abstractions and implementations.
//!
//! Provides the [`TableStore`] trait, the lazy [`scan_pages`] stream built on top of it, and the
//! DynamoDB and in-memory implementations.

mod base;
pub mod dynamodb;
pub mod memory;
mod pages;

pub use base::TableStore;
pub use pages::scan_pages;
