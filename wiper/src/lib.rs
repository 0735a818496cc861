//! Drains every record from a list of DynamoDB tables.
//!
//! [`wiper::TableWiper`] walks an ordered list of tables and hands each one to the scan-delete
//! loop in [`drain`], which consumes the lazy page stream from [`store::scan_pages`] and deletes
//! every record by primary key. Failures are isolated per table and aggregated into a
//! [`wiper::WipeReport`].

pub mod drain;
pub mod error;
mod macros;
pub mod progress;
pub mod store;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
pub mod wiper;
