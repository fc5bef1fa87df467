//! Event sink system for observability.
//!
//! The orchestrator emits one event per candidate state transition
//! (`candidate.filtered`, `document.promoted`, `crawl.budget_exhausted`, ...).
//! Sinks decide what to do with them: drop, log, or collect for inspection.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
