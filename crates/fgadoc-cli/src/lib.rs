//! fgadoc-cli: command-line front end for fgadoc-domain
//!
//! This crate wires configuration, logging and file I/O around the
//! canonicalization pipeline:
//! - Layered configuration (defaults, YAML, `FGADOC_` environment)
//! - Structured logging setup
//! - Reading document sources and rendering the result
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 fgadoc-cli                   │
//! ├─────────────────────────────────────────────┤
//! │  config.rs      - Configuration management  │
//! │  document.rs    - Source files & rendering  │
//! │  observability/ - Logging subscriber        │
//! │  main.rs        - `fgadoc` binary           │
//! └─────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod document;
pub mod observability;

// Re-exports for convenience
pub use config::{CliConfig, ConfigLoadError, DocumentSettings, OutputFormat};
pub use document::{read_document_source, render, DocumentError};
