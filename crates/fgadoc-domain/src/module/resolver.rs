//! Module resolver: reads an `fga.mod` descriptor and the module files it
//! lists, then hands them to the compiler.
//!
//! Every path is resolved against the descriptor's own directory, never the
//! process working directory. Absolute entries are rejected. The first failure aborts the whole
//! resolution and names the offending path.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::{DomainError, DomainResult};
use crate::model::AuthorizationModel;
use crate::transformer::ModelTransformer;

use super::{ModFile, ModuleFile};

/// Reads the descriptor at `path` and every module file it lists.
///
/// Returns the descriptor's schema version and the module files in
/// descriptor order. Each file is named by its resolved path.
pub fn read_module_files(path: &Path) -> DomainResult<(String, Vec<ModuleFile>)> {
    let descriptor = fs::read_to_string(path).map_err(|e| {
        DomainError::module(
            path.display().to_string(),
            format!("unable to read mod file: {e}"),
        )
    })?;

    let mod_file = ModFile::parse(&descriptor)
        .map_err(|e| DomainError::module(path.display().to_string(), e.to_string()))?;

    let base_dir = base_directory(path);
    let files = mod_file
        .contents
        .iter()
        .map(|entry| read_module_file(&base_dir, entry))
        .collect::<DomainResult<Vec<_>>>()?;

    Ok((mod_file.schema, files))
}

/// Resolves the descriptor at `path` into a compiled model.
#[instrument(skip(transformer), fields(path = %path.display()))]
pub fn resolve_mod_file<T: ModelTransformer + ?Sized>(
    path: &Path,
    transformer: &T,
) -> DomainResult<AuthorizationModel> {
    let (schema_version, files) = read_module_files(path)?;
    debug!(
        schema_version = %schema_version,
        file_count = files.len(),
        "Read module files"
    );

    transformer.compile_modules(&files, &schema_version)
}

fn base_directory(descriptor: &Path) -> PathBuf {
    descriptor
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

fn read_module_file(base_dir: &Path, entry: &str) -> DomainResult<ModuleFile> {
    let entry_path = Path::new(entry);
    if entry_path.is_absolute() || entry_path.has_root() {
        return Err(DomainError::module(
            entry,
            "module file path must be relative to the mod file directory",
        ));
    }

    let resolved = base_dir.join(entry_path);
    let name = resolved.display().to_string();
    debug!(module_file = %name, "Reading module file");

    let contents = fs::read_to_string(&resolved)
        .map_err(|e| DomainError::module(name.clone(), format!("unable to read module file: {e}")))?;

    Ok(ModuleFile { name, contents })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformer::OpenFgaTransformer;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_module_paths_resolve_against_descriptor_directory() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write(
            dir.path(),
            "a/b/fga.mod",
            "schema: '1.2'\ncontents:\n  - c.fga\n  - nested/d.fga\n",
        );
        write(dir.path(), "a/b/c.fga", "module c\n");
        write(dir.path(), "a/b/nested/d.fga", "module d\n");

        let (schema, files) = read_module_files(&descriptor).unwrap();

        assert_eq!(schema, "1.2");
        let names: Vec<_> = files.iter().map(|f| PathBuf::from(&f.name)).collect();
        assert_eq!(
            names,
            vec![
                dir.path().join("a/b/c.fga"),
                dir.path().join("a/b/nested/d.fga")
            ]
        );
        assert_eq!(files[0].contents, "module c\n");
    }

    #[test]
    fn test_missing_descriptor_names_descriptor_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("fga.mod");

        let err = read_module_files(&missing).unwrap_err();
        match err {
            DomainError::ModuleResolution { path, .. } => {
                assert_eq!(path, missing.display().to_string())
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_module_file_names_module_path() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write(
            dir.path(),
            "fga.mod",
            "schema: '1.2'\ncontents:\n  - present.fga\n  - absent.fga\n",
        );
        write(dir.path(), "present.fga", "module present\n");

        let err = read_module_files(&descriptor).unwrap_err();
        match err {
            DomainError::ModuleResolution { path, message } => {
                assert_eq!(path, dir.path().join("absent.fga").display().to_string());
                assert!(message.contains("unable to read module file"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_absolute_module_path_is_rejected() {
        let outside = tempfile::tempdir().unwrap();
        let escaped = write(outside.path(), "secret.fga", "module secret\n\ntype user\n");

        let dir = tempfile::tempdir().unwrap();
        let descriptor = write(
            dir.path(),
            "fga.mod",
            &format!("schema: '1.2'\ncontents:\n  - '{}'\n", escaped.display()),
        );

        let err = read_module_files(&descriptor).unwrap_err();
        match err {
            DomainError::ModuleResolution { path, message } => {
                assert_eq!(path, escaped.display().to_string());
                assert!(message.contains("must be relative"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_descriptor_is_attributed_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write(dir.path(), "fga.mod", "schema: '1.1'\ncontents:\n  - a.fga\n");

        let err = read_module_files(&descriptor).unwrap_err();
        assert!(matches!(err, DomainError::ModuleResolution { .. }));
        assert!(err.to_string().contains("unsupported schema version"), "{err}");
    }

    #[test]
    fn test_resolve_mod_file_compiles_model() {
        let dir = tempfile::tempdir().unwrap();
        let descriptor = write(
            dir.path(),
            "fga.mod",
            "schema: '1.2'\ncontents:\n  - core.fga\n",
        );
        write(
            dir.path(),
            "core.fga",
            "module core\n\ntype user\n\ntype org\n  relations\n    define member: [user]\n",
        );

        let model = resolve_mod_file(&descriptor, &OpenFgaTransformer).unwrap();
        assert_eq!(model.schema_version, "1.2");
        assert_eq!(model.type_definitions.len(), 2);
    }
}
