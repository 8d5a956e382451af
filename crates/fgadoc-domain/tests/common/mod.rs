// Allow dead_code because each test file is compiled as a separate crate,
// so not all helper functions are used in every test file.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::TempDir;

// ============================================================================
// Fixtures
// ============================================================================

/// Single-file model with a condition, used across input forms.
pub const DOCUMENT_DSL: &str = r#"model
  schema 1.1

type user

type document
  relations
    define viewer: [user]

condition larger_than(a: int, b: int) {
  a > b
}
"#;

/// Canonical form of [`DOCUMENT_DSL`].
pub const DOCUMENT_CANONICAL: &str = concat!(
    r#"{"conditions":{"larger_than":{"expression":"a > b","name":"larger_than","parameters":{"#,
    r#""a":{"generic_types":[],"type_name":"TYPE_NAME_INT"},"#,
    r#""b":{"generic_types":[],"type_name":"TYPE_NAME_INT"}}}},"#,
    r#""schema_version":"1.1","type_definitions":[{"relations":{},"type":"user"},"#,
    r#"{"metadata":{"module":"","relations":{"viewer":{"directly_related_user_types":[{"condition":"","type":"user"}],"module":""}}},"#,
    r#""relations":{"viewer":{"this":{}}},"type":"document"}]}"#
);

pub const CORE_MODULE: &str = r#"module core

type user

type organization
  relations
    define member: [user]
    define admin: [user]
"#;

pub const TRACKER_MODULE: &str = r#"module issue-tracker

extend type organization
  relations
    define can_create_project: admin

type project
  relations
    define organization: [organization]
    define viewer: member from organization
"#;

/// A modular project on disk: `<root>/<descriptor_dir>/fga.mod` plus the
/// module files it lists.
pub struct ModularProject {
    pub dir: TempDir,
    pub descriptor: PathBuf,
}

impl ModularProject {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

/// Writes `fga.mod` into `descriptor_dir` (relative to a fresh temp dir)
/// listing `files` in order, and writes each file next to it.
pub fn modular_project(descriptor_dir: &str, files: &[(&str, &str)]) -> Result<ModularProject> {
    let dir = tempfile::tempdir()?;
    let base = dir.path().join(descriptor_dir);
    fs::create_dir_all(&base)?;

    let mut descriptor = String::from("schema: '1.2'\ncontents:\n");
    for (name, contents) in files {
        descriptor.push_str(&format!("  - {name}\n"));
        let path = base.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, contents)?;
    }

    let descriptor_path = base.join("fga.mod");
    fs::write(&descriptor_path, descriptor)?;

    Ok(ModularProject {
        dir,
        descriptor: descriptor_path,
    })
}
