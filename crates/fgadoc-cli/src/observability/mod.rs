//! Observability for the fgadoc binary.
//!
//! Library code only emits `tracing` events; this module installs the
//! subscriber that renders them, as text for terminals or as JSON lines for
//! log collectors. Logs go to stderr so stdout carries only the document.

mod logging;

pub use logging::{create_json_layer, init_logging, parse_log_level, LoggingConfig};
