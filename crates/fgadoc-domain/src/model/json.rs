//! JSON model codec (parsing half).
//!
//! Accepts the OpenFGA JSON representation of an authorization model. Field
//! names are the snake_case wire names; unknown fields are rejected so that a
//! misspelled key never silently disappears from the canonical output.

use crate::error::{DomainError, DomainResult};

use super::AuthorizationModel;

/// Parse a JSON document into an AuthorizationModel.
pub fn parse_json(input: &str) -> DomainResult<AuthorizationModel> {
    serde_json::from_str(input).map_err(|e| {
        DomainError::parse(format!("unable to transform JSON into model: {e}"))
    })
}
