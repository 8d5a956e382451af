//! fgadoc-domain: authorization model document canonicalization
//!
//! This crate turns an OpenFGA authorization model supplied as DSL text,
//! JSON text, a module-file graph or a native structured object into one
//! deterministic canonical JSON document:
//! - Model types, DSL parser/printer and JSON codec
//! - Module descriptor resolution and multi-file compilation
//! - Bounded-depth native representation of recursive usersets
//! - Canonical serialization of the sanitized model
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                fgadoc-domain                 │
//! ├─────────────────────────────────────────────┤
//! │  source/      - Input form selection        │
//! │  model/       - Types, DSL & JSON codecs    │
//! │  module/      - fga.mod resolution/compile  │
//! │  bounded/     - Depth-bounded native form   │
//! │  validation/  - Model invariants            │
//! │  canonical/   - Sanitized view & output     │
//! └─────────────────────────────────────────────┘
//! ```

pub mod bounded;
pub mod canonical;
pub mod error;
pub mod model;
pub mod module;
pub mod source;
pub mod transformer;
pub mod validation;

// Re-export commonly used types at the crate root
pub use bounded::{NativeAuthorizationModel, MAX_RECURSION_DEPTH};
pub use canonical::{canonicalize, canonicalize_source, SanitizedModel};
pub use error::{DomainError, DomainResult};
pub use model::AuthorizationModel;
pub use source::{DocumentSource, ModelSource};
pub use transformer::{ModelTransformer, OpenFgaTransformer};
