//! Authorization model types, DSL parser/printer and JSON codec.
//!
//! This module contains:
//! - Core type definitions (AuthorizationModel, TypeDefinition, Userset, Condition)
//! - DSL parser for OpenFGA model and module files
//! - DSL printer
//! - JSON model parsing

mod json;
mod parser;
mod printer;
mod types;
#[cfg(test)]
pub(crate) mod types_proptest;

pub use json::parse_json;
pub use parser::{
    parse, parse_module, ModuleDocument, ModuleTypeDefinition, ParserError, ParserResult,
};
pub use printer::print as print_dsl;
pub use types::*;

/// Parse DSL text into an AuthorizationModel.
pub fn parse_dsl(input: &str) -> crate::DomainResult<AuthorizationModel> {
    parse(input).map_err(Into::into)
}

impl From<ParserError> for crate::DomainError {
    fn from(err: ParserError) -> Self {
        crate::DomainError::parse(format!("unable to transform DSL into model: {err}"))
    }
}
