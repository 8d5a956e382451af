//! Reading document sources from disk and rendering the result.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fgadoc_domain::bounded::{encode_model, NativeAuthorizationModel};
use fgadoc_domain::model::print_dsl;
use fgadoc_domain::validation::validate_model;
use fgadoc_domain::{canonicalize_source, DocumentSource, DomainError, ModelTransformer};

use crate::config::{DocumentSettings, OutputFormat};

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unable to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to decode native model {path}: {source}")]
    NativeModel {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("unable to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

fn read(path: &Path) -> Result<String, DocumentError> {
    fs::read_to_string(path).map_err(|source| DocumentError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Builds a [`DocumentSource`] from the configured files.
///
/// DSL, JSON and native model files are read eagerly. A module descriptor
/// is passed through as a path, since it is resolved relative to its own
/// directory.
pub fn read_document_source(settings: &DocumentSettings) -> Result<DocumentSource, DocumentError> {
    let model = match settings.model.as_deref() {
        Some(path) => {
            let text = read(path)?;
            let native: NativeAuthorizationModel =
                serde_json::from_str(&text).map_err(|source| DocumentError::NativeModel {
                    path: path.to_path_buf(),
                    source,
                })?;
            Some(native)
        }
        None => None,
    };

    Ok(DocumentSource {
        dsl: settings.dsl.as_deref().map(read).transpose()?,
        json: settings.json.as_deref().map(read).transpose()?,
        model,
        mod_file_path: settings.mod_file_path.clone(),
    })
}

/// Resolves the source and renders it in the requested format.
pub fn render<T: ModelTransformer + ?Sized>(
    source: &DocumentSource,
    format: OutputFormat,
    transformer: &T,
) -> Result<String, DocumentError> {
    info!(?format, "Rendering authorization model");

    let rendered = match format {
        OutputFormat::Json => canonicalize_source(source, transformer)?,
        OutputFormat::Dsl => {
            let model = source.load(transformer)?;
            validate_model(&model)?;
            print_dsl(&model)?
        }
        OutputFormat::Native => {
            let model = source.load(transformer)?;
            validate_model(&model)?;
            serde_json::to_string_pretty(&encode_model(&model))?
        }
    };

    debug!(bytes = rendered.len(), "Rendered authorization model");
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fgadoc_domain::OpenFgaTransformer;
    use tempfile::TempDir;

    const DSL: &str = "model\n  schema 1.1\n\ntype user\n\ntype document\n  relations\n    define viewer: [user]\n";

    const CANONICAL: &str = concat!(
        r#"{"conditions":{},"schema_version":"1.1","type_definitions":[{"relations":{},"type":"user"},"#,
        r#"{"metadata":{"module":"","relations":{"viewer":{"directly_related_user_types":[{"condition":"","type":"user"}],"module":""}}},"#,
        r#""relations":{"viewer":{"this":{}}},"type":"document"}]}"#
    );

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_dsl_file_and_renders_canonical_json() {
        let dir = TempDir::new().unwrap();
        let settings = DocumentSettings {
            dsl: Some(write(&dir, "model.fga", DSL)),
            ..Default::default()
        };

        let source = read_document_source(&settings).unwrap();
        assert_eq!(source.dsl.as_deref(), Some(DSL));

        let rendered = render(&source, OutputFormat::Json, &OpenFgaTransformer).unwrap();
        assert_eq!(rendered, CANONICAL);
    }

    #[test]
    fn test_native_output_reads_back_as_the_same_model() {
        let dir = TempDir::new().unwrap();
        let source = DocumentSource::from_dsl(DSL);
        let native = render(&source, OutputFormat::Native, &OpenFgaTransformer).unwrap();
        assert!(native.contains('\n'), "native output is pretty-printed");

        let settings = DocumentSettings {
            model: Some(write(&dir, "model.json", &native)),
            ..Default::default()
        };
        let source = read_document_source(&settings).unwrap();
        assert!(source.model.is_some());
        assert_eq!(
            render(&source, OutputFormat::Json, &OpenFgaTransformer).unwrap(),
            CANONICAL
        );
    }

    #[test]
    fn test_dsl_output_reparses_to_the_same_document() {
        let json = DocumentSource::from_json(CANONICAL);
        let dsl = render(&json, OutputFormat::Dsl, &OpenFgaTransformer).unwrap();
        assert!(dsl.contains("define viewer: [user]"), "{dsl}");

        let reparsed = DocumentSource::from_dsl(dsl);
        assert_eq!(
            render(&reparsed, OutputFormat::Json, &OpenFgaTransformer).unwrap(),
            CANONICAL
        );
    }

    #[test]
    fn test_invalid_model_is_rejected_in_every_format() {
        let source = DocumentSource::from_json(
            r#"{"schema_version":"1.1","type_definitions":[{"type":"user"},{"type":"user"}]}"#,
        );
        for format in [OutputFormat::Json, OutputFormat::Dsl, OutputFormat::Native] {
            let err = render(&source, format, &OpenFgaTransformer).unwrap_err();
            assert!(matches!(err, DocumentError::Domain(_)), "{format:?}: {err}");
        }
    }

    #[test]
    fn test_missing_file_names_the_path() {
        let settings = DocumentSettings {
            json: Some(PathBuf::from("/nonexistent/model.json")),
            ..Default::default()
        };
        let err = read_document_source(&settings).unwrap_err();
        assert!(matches!(err, DocumentError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/model.json"), "{err}");
    }

    #[test]
    fn test_malformed_native_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let settings = DocumentSettings {
            model: Some(write(&dir, "model.json", r#"{"schema_version":"1.1","types":[]}"#)),
            ..Default::default()
        };
        let err = read_document_source(&settings).unwrap_err();
        assert!(matches!(err, DocumentError::NativeModel { .. }), "{err}");
    }

    #[test]
    fn test_mod_file_path_is_passed_through_unread() {
        let settings = DocumentSettings {
            mod_file_path: Some(PathBuf::from("does/not/exist/fga.mod")),
            ..Default::default()
        };
        let source = read_document_source(&settings).unwrap();
        assert_eq!(
            source.mod_file_path,
            Some(PathBuf::from("does/not/exist/fga.mod"))
        );
    }
}
