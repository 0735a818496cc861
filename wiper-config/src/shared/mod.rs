mod base;
mod drain;
mod retry;
mod sentry;
mod store;
mod wiper;

pub use base::*;
pub use drain::*;
pub use retry::*;
pub use sentry::*;
pub use store::*;
pub use wiper::*;
