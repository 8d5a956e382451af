//! Seam between the canonicalization pipeline and the model transformers
//! (DSL grammar engine, JSON codec, multi-file compiler).

use crate::error::DomainResult;
use crate::model::{self, AuthorizationModel};
use crate::module::{compile_modules, ModuleFile};

/// Turns the textual input forms into an [`AuthorizationModel`].
///
/// The pipeline only depends on this trait, so callers can substitute
/// their own grammar engine or compiler.
pub trait ModelTransformer: Send + Sync {
    /// Parses DSL text into a model.
    fn dsl_to_model(&self, dsl: &str) -> DomainResult<AuthorizationModel>;

    /// Parses a JSON document into a model.
    fn json_to_model(&self, json: &str) -> DomainResult<AuthorizationModel>;

    /// Compiles an ordered set of module files into a single model.
    fn compile_modules(
        &self,
        files: &[ModuleFile],
        schema_version: &str,
    ) -> DomainResult<AuthorizationModel>;
}

/// Transformer backed by the parser, codec and compiler in this crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenFgaTransformer;

impl ModelTransformer for OpenFgaTransformer {
    fn dsl_to_model(&self, dsl: &str) -> DomainResult<AuthorizationModel> {
        model::parse_dsl(dsl)
    }

    fn json_to_model(&self, json: &str) -> DomainResult<AuthorizationModel> {
        model::parse_json(json)
    }

    fn compile_modules(
        &self,
        files: &[ModuleFile],
        schema_version: &str,
    ) -> DomainResult<AuthorizationModel> {
        compile_modules(files, schema_version)
    }
}
