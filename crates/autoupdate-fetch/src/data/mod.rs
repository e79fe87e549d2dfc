//! Immutable data types for fetch requests and their outcomes.

mod outcome;
mod request;

pub use outcome::FetchOutcome;
pub use request::{DEFAULT_TIMEOUT, FetchRequest, TlsPolicy};
