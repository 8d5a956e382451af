//! The `fga.mod` module descriptor.
//!
//! ```yaml
//! schema: '1.2'
//! contents:
//!   - core.fga
//!   - issue-tracker/projects.fga
//! ```

use config::{Config, File, FileFormat};
use serde::Deserialize;

/// The only descriptor schema version understood by the compiler.
pub const MOD_FILE_SCHEMA_VERSION: &str = "1.2";

/// A parsed and validated module descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModFile {
    /// Schema version of the compiled model.
    #[serde(default)]
    pub schema: String,
    /// Module files, relative to the descriptor's directory, in order.
    #[serde(default)]
    pub contents: Vec<String>,
}

/// Error raised for a descriptor that cannot be read as YAML or that breaks
/// the descriptor rules. The resolver attributes it to the descriptor path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModFileError {
    #[error("unable to parse mod file: {0}")]
    Syntax(String),

    #[error("missing schema field")]
    MissingSchema,

    #[error("unsupported schema version, fga.mod only supported in version `{MOD_FILE_SCHEMA_VERSION}`, got `{0}`")]
    UnsupportedSchema(String),

    #[error("missing contents field")]
    MissingContents,

    #[error("contents can only contain file paths ending in .fga, got `{0}`")]
    InvalidContentsEntry(String),
}

impl ModFile {
    /// Parse and validate descriptor text.
    pub fn parse(text: &str) -> Result<Self, ModFileError> {
        let mod_file: ModFile = Config::builder()
            .add_source(File::from_str(text, FileFormat::Yaml))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| ModFileError::Syntax(e.to_string()))?;

        mod_file.validate()?;
        Ok(mod_file)
    }

    /// Check the descriptor rules on an already deserialized descriptor.
    pub fn validate(&self) -> Result<(), ModFileError> {
        let schema = self.schema.trim();
        if schema.is_empty() {
            return Err(ModFileError::MissingSchema);
        }
        if schema != MOD_FILE_SCHEMA_VERSION {
            return Err(ModFileError::UnsupportedSchema(schema.to_string()));
        }

        if self.contents.is_empty() {
            return Err(ModFileError::MissingContents);
        }
        if let Some(entry) = self.contents.iter().find(|c| !c.ends_with(".fga")) {
            return Err(ModFileError::InvalidContentsEntry(entry.clone()));
        }

        Ok(())
    }
}
