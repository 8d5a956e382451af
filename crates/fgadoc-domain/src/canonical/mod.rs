//! Canonical serialization.
//!
//! Every input form funnels through [`SanitizedModel`] and this one
//! serializer. The output is compact JSON with lexicographically sorted keys
//! and explicit defaults; serde_json leaves `<`, `>` and `&` unescaped.

mod view;

pub use view::SanitizedModel;

use tracing::{debug, instrument};

use crate::error::{DomainError, DomainResult};
use crate::model::AuthorizationModel;
use crate::source::DocumentSource;
use crate::transformer::ModelTransformer;
use crate::validation::validate_model;

/// Serializes the sanitized view of `model` into its canonical JSON form.
pub fn canonicalize(model: &AuthorizationModel) -> DomainResult<String> {
    // Round-trip through `Value` so object keys come out sorted no matter
    // how the view declares its fields.
    let value = serde_json::to_value(SanitizedModel::new(model)).map_err(encoding_error)?;
    serde_json::to_string(&value).map_err(encoding_error)
}

/// Runs the whole pipeline: select the input form, load, validate and
/// canonicalize.
#[instrument(skip_all)]
pub fn canonicalize_source<T: ModelTransformer + ?Sized>(
    source: &DocumentSource,
    transformer: &T,
) -> DomainResult<String> {
    let selected = source.select()?;
    let model = selected.load(transformer)?;
    debug!(
        source = selected.kind(),
        schema_version = %model.schema_version,
        type_count = model.type_definitions.len(),
        "Loaded authorization model"
    );

    validate_model(&model)?;

    let canonical = canonicalize(&model)?;
    debug!(bytes = canonical.len(), "Canonicalized authorization model");
    Ok(canonical)
}

fn encoding_error(err: serde_json::Error) -> DomainError {
    DomainError::encoding(err.to_string())
}
