//! Process-wide tracing setup shared by binaries, tests and benches.

/// Subscriber configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{init, init_for_tests};
