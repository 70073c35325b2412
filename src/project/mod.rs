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

//! Multi-file project loading.

mod loader;
mod paths;

pub use loader::ScriptSource;
use loader::load_project_modules;
pub(crate) use paths::normalize_path_str;

use crate::diagnostics::{CompileError, CompileErrorKind};
use crate::model::Model;
use crate::parser::parse_module;
use crate::registry::FeatureRegistry;
use std::collections::HashMap;

/// Indexes in-memory sources by normalized path.
pub(crate) fn source_table(
    entry_path: &str,
    sources: &[ScriptSource],
) -> Result<HashMap<String, String>, CompileError> {
    let mut by_path: HashMap<String, String> = HashMap::new();
    for source in sources {
        let normalized = normalize_path_str(&source.path);
        if by_path.contains_key(&normalized) {
            return Err(CompileError::in_file(
                CompileErrorKind::Import,
                format!("Duplicate source path '{normalized}'"),
                normalized,
            ));
        }
        by_path.insert(normalized, source.source.clone());
    }

    let entry_path = normalize_path_str(entry_path);
    if !by_path.contains_key(&entry_path) {
        return Err(CompileError::in_file(
            CompileErrorKind::Import,
            format!("Entry source '{entry_path}' was not provided"),
            entry_path,
        ));
    }
    Ok(by_path)
}

/// Loads the project rooted at `entry_path` on top of `base`.
///
/// Returns the extended model; `base` itself is never modified, so a failing
/// module leaves the caller's model as it was.
pub(crate) fn compile_project<F>(
    entry_path: &str,
    mut loader: F,
    registry: &FeatureRegistry,
    base: &Model,
) -> Result<Model, CompileError>
where
    F: FnMut(&str) -> Result<String, String>,
{
    let entry_path = normalize_path_str(entry_path);
    let modules = load_project_modules(&entry_path, &mut loader, |path| base.is_loaded(path))?;

    let mut staged = base.clone();
    for module in &modules {
        parse_module(&module.source, &module.path, registry, &mut staged)?;
        staged.mark_loaded(&module.path);
    }
    Ok(staged)
}
