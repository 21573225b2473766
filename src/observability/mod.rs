//! Observability module providing structured logging.
//!
//! Console logging with configurable formats (pretty, compact, JSON) and
//! `RUST_LOG`-style filtering.

mod tracing_init;

pub use tracing_init::*;
