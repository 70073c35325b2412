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

//! Module loading and import graph traversal.

use crate::diagnostics::{CompileError, CompileErrorKind};
use crate::parser::parse_imports;
use std::collections::HashSet;
use tracing::debug;

use super::paths::resolve_import_path;

/// One script source unit of a multi-file project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptSource {
    /// Logical module path used by `import "..."` resolution and diagnostics.
    pub path: String,
    /// Full script text.
    pub source: String,
}

impl ScriptSource {
    pub fn new(path: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
        }
    }
}

/// Module whose imports have all been loaded.
#[derive(Debug, Clone)]
pub(crate) struct ModuleUnit {
    pub(crate) path: String,
    pub(crate) source: String,
}

/// Walks the import graph from `entry_path` and returns the modules that
/// still need parsing, dependencies first.
///
/// Modules for which `loaded_before` returns true are treated as already
/// present and are neither loaded nor returned.
pub(crate) fn load_project_modules<F, L>(
    entry_path: &str,
    loader: &mut F,
    loaded_before: L,
) -> Result<Vec<ModuleUnit>, CompileError>
where
    F: FnMut(&str) -> Result<String, String>,
    L: Fn(&str) -> bool,
{
    let mut walk = Walk {
        loader,
        loaded_before,
        visited: HashSet::new(),
        stack: Vec::new(),
        order: Vec::new(),
    };
    walk.visit(entry_path)?;
    Ok(walk.order)
}

struct Walk<'l, F, L> {
    loader: &'l mut F,
    loaded_before: L,
    visited: HashSet<String>,
    stack: Vec<String>,
    order: Vec<ModuleUnit>,
}

impl<F, L> Walk<'_, F, L>
where
    F: FnMut(&str) -> Result<String, String>,
    L: Fn(&str) -> bool,
{
    fn visit(&mut self, path: &str) -> Result<(), CompileError> {
        if self.visited.contains(path) || (self.loaded_before)(path) {
            return Ok(());
        }

        self.stack.push(path.to_string());
        let source = (self.loader)(path).map_err(|message| {
            CompileError::in_file(
                CompileErrorKind::Import,
                format!("Failed to load source '{path}': {message}"),
                path,
            )
        })?;
        debug!(module = path, bytes = source.len(), "loaded module source");

        for import in parse_imports(&source, path)? {
            let resolved = resolve_import_path(path, &import.path);
            if self.stack.iter().any(|item| item == &resolved) {
                let mut cycle = self.stack.clone();
                cycle.push(resolved);
                return Err(CompileError::at(
                    CompileErrorKind::Import,
                    format!("Import cycle detected: {}", cycle.join(" -> ")),
                    path,
                    &source,
                    &import.span,
                ));
            }

            if let Err(err) = self.visit(&resolved) {
                // Attach load failures of the imported file to the import site.
                if !err.has_location() && err.file == resolved {
                    return Err(CompileError::at(
                        CompileErrorKind::Import,
                        format!("Failed to load import '{}': {}", import.path, err.message),
                        path,
                        &source,
                        &import.span,
                    ));
                }
                return Err(err);
            }
        }

        self.stack.pop();
        self.visited.insert(path.to_string());
        self.order.push(ModuleUnit {
            path: path.to_string(),
            source,
        });
        Ok(())
    }
}
