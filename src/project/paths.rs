/*
MIT License

Copyright (c) 2026 Raja Lehtihet and Wael El Oraiby

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Lexical path handling for script imports.
//!
//! Module paths are logical names: they are joined and normalized as text and
//! never checked against a filesystem.

use std::path::{Component, Path, PathBuf};

/// Resolves `import_path` relative to the directory of `importer_path`.
pub(crate) fn resolve_import_path(importer_path: &str, import_path: &str) -> String {
    let import_path = Path::new(import_path);
    let joined = if import_path.is_absolute() {
        import_path.to_path_buf()
    } else {
        let base = Path::new(importer_path)
            .parent()
            .unwrap_or_else(|| Path::new("."));
        base.join(import_path)
    };
    normalize_path(&joined).to_string_lossy().to_string()
}

/// Normalizes a module path string.
pub(crate) fn normalize_path_str(path: &str) -> String {
    normalize_path(Path::new(path))
        .to_string_lossy()
        .to_string()
}

/// Removes `.` components and folds `name/..` pairs.
///
/// Leading `..` components of relative paths are kept; `..` above the root of
/// an absolute path is dropped.
fn normalize_path(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    let normalized: PathBuf = parts.iter().map(|part| part.as_os_str()).collect();
    if normalized.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn imports_resolve_against_importer_directory() {
        assert_eq!(resolve_import_path("parts/body.cad", "bolt.cad"), "parts/bolt.cad");
        assert_eq!(resolve_import_path("parts/body.cad", "../lib/std.cad"), "lib/std.cad");
        assert_eq!(resolve_import_path("main.cad", "./a.cad"), "a.cad");
    }

    #[test]
    fn normalization_keeps_leading_parent_components() {
        assert_eq!(normalize_path_str("../../x/./y/../z.cad"), "../../x/z.cad");
        assert_eq!(normalize_path_str("/a/../../b.cad"), "/b.cad");
        assert_eq!(normalize_path_str("a/.."), ".");
    }
}
