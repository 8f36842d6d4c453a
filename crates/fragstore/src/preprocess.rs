//! Flattens a user shader into a single source string.
//!
//! The pass is line oriented and runs exactly once over the top-level file:
//!
//! - a line containing `#include <name>` is replaced by the content of the
//!   fragment `name` resolves to in the [`FragmentStore`];
//! - a line containing `#version` is dropped, since the harness supplies its
//!   own version pragma;
//! - every other line is copied verbatim and terminated by `\n`.
//!
//! Included content is not scanned for further includes. Directives found
//! there are left in place and reported as [`PreprocessWarning::NestedInclude`],
//! which the GLSL compiler will then reject with a readable message. Version
//! pragmas inside included content are still dropped.
//!
//! A directive without the `<name>` form is a soft failure: it is reported as
//! [`PreprocessWarning::MalformedInclude`] and replaced by an empty line. A
//! well-formed directive whose target cannot be read aborts the pass with
//! [`PreprocessError::IncludeNotFound`].
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::FragmentStore;

const INCLUDE_MARKER: &str = "#include";
const VERSION_MARKER: &str = "#version";

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("failed to read shader source {}: {source}", path.display())]
    SourceNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("include <{name}> on line {line} not found at {}: {source}", path.display())]
    IncludeNotFound {
        name: String,
        path: PathBuf,
        line: usize,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreprocessWarning {
    /// `#include` not followed by `<name>`; the line was replaced by an empty one.
    MalformedInclude { line: usize, directive: String },
    /// Directive inside inlined content, left unexpanded.
    NestedInclude { line: usize, fragment: PathBuf },
}

impl std::fmt::Display for PreprocessWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInclude { line, directive } => write!(
                f,
                "line {line}: malformed include directive `{directive}` (expected #include <name>)"
            ),
            Self::NestedInclude { line, fragment } => write!(
                f,
                "line {line}: {} contains an include directive that is not expanded",
                fragment.display()
            ),
        }
    }
}

/// Result of one preprocessing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Preprocessed {
    pub source: String,
    /// Fragment files inlined, in directive order.
    pub includes: Vec<PathBuf>,
    pub warnings: Vec<PreprocessWarning>,
}

/// One directive being served. Lives only for the duration of the substitution.
struct IncludeRequest<'a> {
    directive: &'a str,
    path: PathBuf,
    content: String,
}

pub fn preprocess(store: &FragmentStore, path: &Path) -> Result<Preprocessed, PreprocessError> {
    let raw = fs::read_to_string(path).map_err(|source| PreprocessError::SourceNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let mut output = Preprocessed::default();

    for (index, line) in raw.lines().enumerate() {
        let line_number = index + 1;

        if let Some(marker) = line.find(INCLUDE_MARKER) {
            let directive = &line[marker + INCLUDE_MARKER.len()..];
            let Some(name) = include_name(directive) else {
                let warning = PreprocessWarning::MalformedInclude {
                    line: line_number,
                    directive: line.trim().to_string(),
                };
                warn!(shader = %path.display(), "{warning}");
                output.warnings.push(warning);
                output.source.push('\n');
                continue;
            };

            let request = resolve_include(store, name, line_number)?;
            debug!(
                shader = %path.display(),
                directive = request.directive,
                fragment = %request.path.display(),
                "inlining include"
            );
            inline_fragment(&mut output, &request, line_number);
            output.includes.push(request.path);
            continue;
        }

        if line.contains(VERSION_MARKER) {
            continue;
        }

        output.source.push_str(line);
        output.source.push('\n');
    }

    Ok(output)
}

/// Extracts `name` from the text following `#include`, if it has the
/// `<name>` form.
fn include_name(directive: &str) -> Option<&str> {
    let trimmed = directive.trim();
    if trimmed.len() < 3 {
        return None;
    }
    let name = trimmed.strip_prefix('<')?.strip_suffix('>')?;
    if name.trim().is_empty() {
        None
    } else {
        Some(name)
    }
}

fn resolve_include<'a>(
    store: &FragmentStore,
    name: &'a str,
    line: usize,
) -> Result<IncludeRequest<'a>, PreprocessError> {
    let path = store.include_path(name);
    match fs::read_to_string(&path) {
        Ok(content) => Ok(IncludeRequest {
            directive: name,
            path,
            content,
        }),
        Err(source) => Err(PreprocessError::IncludeNotFound {
            name: name.to_string(),
            path,
            line,
            source,
        }),
    }
}

fn inline_fragment(output: &mut Preprocessed, request: &IncludeRequest<'_>, line: usize) {
    for fragment_line in request.content.lines() {
        if fragment_line.contains(INCLUDE_MARKER) {
            let warning = PreprocessWarning::NestedInclude {
                line,
                fragment: request.path.clone(),
            };
            warn!("{warning}");
            output.warnings.push(warning);
        } else if fragment_line.contains(VERSION_MARKER) {
            continue;
        }
        output.source.push_str(fragment_line);
        output.source.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, FragmentStore) {
        let temp = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = temp.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, contents).unwrap();
        }
        let store = FragmentStore::new(temp.path());
        (temp, store)
    }

    #[test]
    fn copies_plain_source_line_by_line() {
        let (_temp, store) = store_with(&[(
            "loop.frag",
            "void mainImage() {\n    fragColor = vec4(1.0);\n}",
        )]);
        let out = preprocess(&store, &store.shader_path("loop")).unwrap();
        assert_eq!(
            out.source,
            "void mainImage() {\n    fragColor = vec4(1.0);\n}\n"
        );
        assert!(out.includes.is_empty());
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn drops_version_pragmas() {
        let (_temp, store) = store_with(&[
            ("a.frag", "#version 460 core\n#include <b>\nfloat x;\n"),
            ("b.glsl", "#version 330\nfloat y;\n"),
        ]);
        let out = preprocess(&store, &store.shader_path("a")).unwrap();
        assert!(!out.source.contains("#version"));
        assert_eq!(out.source, "float y;\nfloat x;\n");
    }

    #[test]
    fn inlines_include_in_place_exactly_once() {
        let (temp, store) = store_with(&[
            (
                "scene.frag",
                "float before;\n#include <palette>\nfloat after;\n",
            ),
            ("palette.glsl", "vec3 palette(float t) {\n    return vec3(t);\n}"),
        ]);
        let out = preprocess(&store, &store.shader_path("scene")).unwrap();
        assert_eq!(
            out.source,
            "float before;\nvec3 palette(float t) {\n    return vec3(t);\n}\nfloat after;\n"
        );
        assert_eq!(out.source.matches("vec3 palette").count(), 1);
        assert_eq!(out.includes, vec![temp.path().join("palette.glsl")]);
    }

    #[test]
    fn include_resolves_relative_to_store_root() {
        let store = FragmentStore::default();
        assert_eq!(
            store.include_path("palette"),
            PathBuf::from("res/shaders/palette.glsl")
        );
    }

    #[test]
    fn include_with_subdirectory_and_surrounding_whitespace() {
        let (_temp, store) = store_with(&[
            ("main.frag", "   #include    <lib/noise>   \n"),
            ("lib/noise.glsl", "float noise(vec2 p);"),
        ]);
        let out = preprocess(&store, &store.shader_path("main")).unwrap();
        assert_eq!(out.source, "float noise(vec2 p);\n");
    }

    #[test]
    fn absolute_include_is_honoured() {
        let (temp, store) = store_with(&[("shared/common.glsl", "float common_value;")]);
        let absolute = temp.path().join("shared/common");
        let main = temp.path().join("main.frag");
        fs::write(&main, format!("#include <{}>\n", absolute.display())).unwrap();

        let out = preprocess(&store, &main).unwrap();
        assert_eq!(out.source, "float common_value;\n");
    }

    #[test]
    fn missing_include_aborts_the_pass() {
        let (_temp, store) = store_with(&[("a.frag", "float x;\n#include <nowhere>\n")]);
        let err = preprocess(&store, &store.shader_path("a")).unwrap_err();
        match err {
            PreprocessError::IncludeNotFound { name, line, path, .. } => {
                assert_eq!(name, "nowhere");
                assert_eq!(line, 2);
                assert!(path.ends_with("nowhere.glsl"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_source_is_reported() {
        let (_temp, store) = store_with(&[]);
        let err = preprocess(&store, &store.shader_path("ghost")).unwrap_err();
        assert!(matches!(err, PreprocessError::SourceNotFound { .. }));
    }

    #[test]
    fn malformed_include_is_a_warning() {
        let (_temp, store) = store_with(&[(
            "a.frag",
            "#include \"palette\"\nfloat x;\n#include <>\n#include\n",
        )]);
        let out = preprocess(&store, &store.shader_path("a")).unwrap();
        assert_eq!(out.source, "\nfloat x;\n\n\n");
        assert_eq!(out.warnings.len(), 3);
        assert!(matches!(
            out.warnings[0],
            PreprocessWarning::MalformedInclude { line: 1, .. }
        ));
        assert!(matches!(
            out.warnings[2],
            PreprocessWarning::MalformedInclude { line: 4, .. }
        ));
    }

    #[test]
    fn nested_includes_are_not_expanded() {
        let (_temp, store) = store_with(&[
            ("a.frag", "#include <outer>\n"),
            ("outer.glsl", "#include <inner>\nfloat outer;"),
            ("inner.glsl", "float inner;"),
        ]);
        let out = preprocess(&store, &store.shader_path("a")).unwrap();
        assert_eq!(out.source, "#include <inner>\nfloat outer;\n");
        assert_eq!(out.includes.len(), 1);
        assert!(matches!(
            out.warnings.as_slice(),
            [PreprocessWarning::NestedInclude { line: 1, .. }]
        ));
    }

    #[test]
    fn edits_to_includes_are_picked_up_on_the_next_pass() {
        let (temp, store) = store_with(&[
            ("a.frag", "#include <colors>\n"),
            ("colors.glsl", "const vec3 C = vec3(0.0);"),
        ]);
        let first = preprocess(&store, &store.shader_path("a")).unwrap();
        fs::write(temp.path().join("colors.glsl"), "const vec3 C = vec3(1.0);").unwrap();
        let second = preprocess(&store, &store.shader_path("a")).unwrap();
        assert_ne!(first.source, second.source);
        assert!(second.source.contains("vec3(1.0)"));
    }

    #[test]
    fn empty_source_is_valid() {
        let (_temp, store) = store_with(&[("empty.frag", "")]);
        let out = preprocess(&store, &store.shader_path("empty")).unwrap();
        assert!(out.source.is_empty());
    }
}
