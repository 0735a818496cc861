//! Helpers for tests that drive the wiper against in-memory tables.

pub mod faulty_store;
pub mod progress;
pub mod table;
