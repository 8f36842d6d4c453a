//! Fragment store layout and the `#include` preprocessor used to assemble user
//! shaders before they reach the GPU.
//!
//! Types:
//!
//! - `FragmentStore` remembers the store root and the two file extensions, and
//!   maps shader names and include identifiers onto paths.
//! - `Preprocessed`, `PreprocessError` and `PreprocessWarning` (re-exported
//!   from `preprocess`) describe the outcome of one flattening pass.
mod preprocess;

pub use preprocess::{preprocess, Preprocessed, PreprocessError, PreprocessWarning};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

/// Directory the playground looks for shaders in when nothing else is configured.
pub const DEFAULT_ROOT: &str = "res/shaders";
/// Extension of user fragment shaders selectable from the prompt.
pub const DEFAULT_SHADER_EXTENSION: &str = "frag";
/// Extension of fragments pulled in through `#include`.
pub const DEFAULT_INCLUDE_EXTENSION: &str = "glsl";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentStore {
    root: PathBuf,
    shader_extension: String,
    include_extension: String,
}

impl Default for FragmentStore {
    fn default() -> Self {
        Self::new(DEFAULT_ROOT)
    }
}

impl FragmentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            shader_extension: DEFAULT_SHADER_EXTENSION.to_string(),
            include_extension: DEFAULT_INCLUDE_EXTENSION.to_string(),
        }
    }

    pub fn with_extensions(
        mut self,
        shader_extension: impl Into<String>,
        include_extension: impl Into<String>,
    ) -> Self {
        self.shader_extension = shader_extension.into();
        self.include_extension = include_extension.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shader_extension(&self) -> &str {
        &self.shader_extension
    }

    pub fn include_extension(&self) -> &str {
        &self.include_extension
    }

    /// Path of the user shader selected by `name` (no extension).
    pub fn shader_path(&self, name: &str) -> PathBuf {
        with_extension(self.root.join(name), &self.shader_extension)
    }

    /// Path an `#include <identifier>` resolves to.
    ///
    /// Identifiers starting with `/` are taken as absolute paths; everything
    /// else is relative to the store root. The include extension is appended
    /// in both cases.
    pub fn include_path(&self, identifier: &str) -> PathBuf {
        let base = if identifier.starts_with('/') {
            PathBuf::from(identifier)
        } else {
            self.root.join(identifier)
        };
        with_extension(base, &self.include_extension)
    }

    pub fn contains_shader(&self, name: &str) -> bool {
        !name.is_empty() && self.shader_path(name).is_file()
    }

    /// Lists the user shaders available in the store, sorted, as the names the
    /// prompt accepts (`dir/name` for shaders in subdirectories).
    pub fn list_shaders(&self) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        if !self.root.is_dir() {
            debug!(root = %self.root.display(), "fragment store root does not exist");
            return Ok(names);
        }
        collect_shaders(&self.root, &self.root, &self.shader_extension, &mut names)?;
        names.sort();
        Ok(names)
    }
}

// `Path::set_extension` would clobber dotted names such as `noise.v2`, so the
// extension is appended textually.
fn with_extension(path: PathBuf, extension: &str) -> PathBuf {
    let mut raw = path.into_os_string();
    raw.push(".");
    raw.push(extension);
    PathBuf::from(raw)
}

fn collect_shaders(
    root: &Path,
    dir: &Path,
    extension: &str,
    names: &mut Vec<String>,
) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_shaders(root, &path, extension, names)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(extension) {
            continue;
        }
        let Ok(relative) = path.with_extension("").strip_prefix(root).map(Path::to_path_buf)
        else {
            continue;
        };
        let name = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        names.push(name);
    }
    Ok(())
}
