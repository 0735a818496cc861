//! Configuration management for the table wiper.
//!
//! Provides environment detection, configuration loading from YAML files and
//! environment variables, secret handling, and the shared configuration types
//! consumed by the wiper binary.

mod environment;
mod load;
mod secret;
pub mod shared;

pub use environment::*;
pub use load::*;
pub use secret::*;
