//! Modular models: `fga.mod` descriptors, module file resolution and the
//! multi-file compiler.

mod compiler;
mod mod_file;
mod resolver;

pub use compiler::compile_modules;
pub use mod_file::{ModFile, ModFileError, MOD_FILE_SCHEMA_VERSION};
pub use resolver::{read_module_files, resolve_mod_file};

/// One module source file, named by its resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleFile {
    pub name: String,
    pub contents: String,
}
