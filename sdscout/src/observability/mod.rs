//! Observability utilities.

mod subscriber;

pub use subscriber::{env_filter, init_tracing, LogFormat, DEFAULT_LOG_DIRECTIVE};
