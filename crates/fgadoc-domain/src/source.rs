//! Input form selection.
//!
//! A document request carries up to four input forms. Exactly one of them
//! must be present; it decides which adapter produces the model.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::bounded::{check_native_model, decode_model, NativeAuthorizationModel};
use crate::error::{DomainError, DomainResult};
use crate::model::AuthorizationModel;
use crate::module::resolve_mod_file;
use crate::transformer::ModelTransformer;

const INPUT_FORMS: &str = "model, mod file path, DSL or JSON";

/// The input forms of one canonicalization request. Empty strings and
/// empty paths count as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentSource {
    pub dsl: Option<String>,
    pub json: Option<String>,
    pub model: Option<NativeAuthorizationModel>,
    pub mod_file_path: Option<PathBuf>,
}

/// The input form picked by [`DocumentSource::select`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelSource<'a> {
    Dsl(&'a str),
    Json(&'a str),
    Model(&'a NativeAuthorizationModel),
    ModFile(&'a Path),
}

impl DocumentSource {
    pub fn from_dsl(dsl: impl Into<String>) -> Self {
        Self {
            dsl: Some(dsl.into()),
            ..Default::default()
        }
    }

    pub fn from_json(json: impl Into<String>) -> Self {
        Self {
            json: Some(json.into()),
            ..Default::default()
        }
    }

    pub fn from_model(model: NativeAuthorizationModel) -> Self {
        Self {
            model: Some(model),
            ..Default::default()
        }
    }

    pub fn from_mod_file(path: impl Into<PathBuf>) -> Self {
        Self {
            mod_file_path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Picks the single present input form.
    ///
    /// Fails with [`DomainError::InvalidInput`] when none or several are
    /// present.
    pub fn select(&self) -> DomainResult<ModelSource<'_>> {
        let present: Vec<ModelSource<'_>> = [
            self.model.as_ref().map(ModelSource::Model),
            self.mod_file_path
                .as_deref()
                .filter(|p| !p.as_os_str().is_empty())
                .map(ModelSource::ModFile),
            self.dsl
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(ModelSource::Dsl),
            self.json
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(ModelSource::Json),
        ]
        .into_iter()
        .flatten()
        .collect();

        match present.as_slice() {
            [source] => Ok(*source),
            [] => Err(DomainError::InvalidInput {
                message: format!("at least one of {INPUT_FORMS} has to be provided"),
            }),
            several => {
                let kinds: Vec<_> = several.iter().map(ModelSource::kind).collect();
                Err(DomainError::InvalidInput {
                    message: format!(
                        "exactly one of {INPUT_FORMS} has to be provided, got: {}",
                        kinds.join(", ")
                    ),
                })
            }
        }
    }

    /// Selects the input form and runs its adapter.
    pub fn load<T: ModelTransformer + ?Sized>(
        &self,
        transformer: &T,
    ) -> DomainResult<AuthorizationModel> {
        self.select()?.load(transformer)
    }
}

impl<'a> ModelSource<'a> {
    /// Short name of the input form, as used in logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            ModelSource::Dsl(_) => "dsl",
            ModelSource::Json(_) => "json",
            ModelSource::Model(_) => "model",
            ModelSource::ModFile(_) => "mod_file_path",
        }
    }

    /// Runs the adapter for this input form.
    pub fn load<T: ModelTransformer + ?Sized>(
        self,
        transformer: &T,
    ) -> DomainResult<AuthorizationModel> {
        debug!(source = self.kind(), "Loading authorization model");
        match self {
            ModelSource::Dsl(dsl) => transformer.dsl_to_model(dsl),
            ModelSource::Json(json) => transformer.json_to_model(json),
            ModelSource::Model(native) => {
                check_native_model(native)?;
                Ok(decode_model(native))
            }
            ModelSource::ModFile(path) => resolve_mod_file(path, transformer),
        }
    }
}
