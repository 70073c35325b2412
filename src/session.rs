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

//! Sessions: a symbol table, a build engine, and the loading/query API.

use crate::ast::{DatumExpr, FeatureRef, ScalarExpr, SelectionExpr, VectorExpr};
use crate::backend::{BuildResult, Datum, GeometryBackend, NullBackend, Selection};
use crate::diagnostics::{CompileError, CompileErrorKind};
use crate::model::{
    BuildEngine, BuildError, CacheStats, EvalContext, Feature, Model, ResultCache,
    StructuralHash, SymbolKind,
};
use crate::parser::{parse_imports, parse_module};
use crate::project::{ScriptSource, compile_project, source_table};
use crate::registry::FeatureRegistry;
use glam::DVec3;
use std::borrow::Cow;
use std::rc::Rc;
use tracing::debug;

/// Module name used for sources loaded without a path.
const ANONYMOUS_MODULE: &str = "<script>";

/// Where build results are cached.
#[derive(Debug, Clone, Default)]
pub enum CacheScope {
    /// A cache private to the session.
    #[default]
    Session,
    /// A cache shared with every session configured with a clone of it.
    Shared(ResultCache),
    /// No caching: every feature build invokes the backend.
    Disabled,
}

/// Session construction options.
#[derive(Clone)]
pub struct SessionConfig {
    backend: Rc<dyn GeometryBackend>,
    cache: CacheScope,
    registry: Option<FeatureRegistry>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: Rc::new(NullBackend),
            cache: CacheScope::default(),
            registry: None,
        }
    }
}

impl SessionConfig {
    /// Null backend, session cache, built-in feature types.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend<B: GeometryBackend + 'static>(self, backend: B) -> Self {
        self.with_shared_backend(Rc::new(backend))
    }

    /// Uses a backend the caller keeps a handle to.
    pub fn with_shared_backend(mut self, backend: Rc<dyn GeometryBackend>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_cache_scope(mut self, cache: CacheScope) -> Self {
        self.cache = cache;
        self
    }

    /// Replaces the global registry of built-in types.
    pub fn with_registry(mut self, registry: FeatureRegistry) -> Self {
        self.registry = Some(registry);
        self
    }
}

/// One feature the session outputs.
#[derive(Debug, Clone)]
pub struct OutputTarget {
    pub feature: FeatureRef,
    pub label: String,
    /// Destination given with `export ... as "path"`.
    pub path: Option<String>,
}

/// Built output feature.
#[derive(Debug, Clone)]
pub struct BuiltOutput {
    pub label: String,
    pub path: Option<String>,
    pub hash: StructuralHash,
    pub result: Rc<BuildResult>,
}

/// Scripting session.
///
/// Loading only adds names: every load parses into a copy of the symbol
/// table and replaces it on success, so a failed load leaves the session as
/// it was. Features are built lazily on the first query that needs them.
pub struct Session {
    registry: Cow<'static, FeatureRegistry>,
    model: Model,
    engine: BuildEngine,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates a session with the default configuration.
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_backend<B: GeometryBackend + 'static>(backend: B) -> Self {
        Self::with_config(SessionConfig::new().with_backend(backend))
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let cache = match config.cache {
            CacheScope::Session => Some(ResultCache::new()),
            CacheScope::Shared(cache) => Some(cache),
            CacheScope::Disabled => None,
        };
        debug!(
            backend = config.backend.name(),
            caching = cache.is_some(),
            "created session"
        );
        let registry = match config.registry {
            Some(registry) => Cow::Owned(registry),
            None => Cow::Borrowed(FeatureRegistry::global()),
        };
        Self {
            registry,
            model: Model::new(),
            engine: BuildEngine::new(config.backend, cache),
        }
    }

    pub fn registry(&self) -> &FeatureRegistry {
        &self.registry
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn engine(&self) -> &BuildEngine {
        &self.engine
    }

    /// Evaluation context over the current symbol table.
    pub fn context(&self) -> EvalContext<'_> {
        EvalContext::new(&self.model, &self.engine)
    }

    /// Loads a standalone script. Scripts loaded this way cannot import.
    pub fn load_script(&mut self, source: &str) -> Result<(), CompileError> {
        if let Some(import) = parse_imports(source, ANONYMOUS_MODULE)?.first() {
            return Err(CompileError::at(
                CompileErrorKind::Import,
                format!(
                    "Failed to load import '{}': no loader configured",
                    import.path
                ),
                ANONYMOUS_MODULE,
                source,
                &import.span,
            ));
        }
        let mut staged = self.model.clone();
        parse_module(source, ANONYMOUS_MODULE, &self.registry, &mut staged)?;
        debug!(
            module = ANONYMOUS_MODULE,
            bindings = staged.bindings().len() - self.model.bindings().len(),
            "loaded script"
        );
        self.model = staged;
        Ok(())
    }

    /// Loads a project from in-memory sources, starting at `entry_path`.
    pub fn load_project(
        &mut self,
        entry_path: &str,
        sources: &[ScriptSource],
    ) -> Result<(), CompileError> {
        let table = source_table(entry_path, sources)?;
        self.load_project_with_loader(entry_path, |path| {
            table
                .get(path)
                .cloned()
                .ok_or_else(|| format!("source '{path}' was not provided"))
        })
    }

    /// Loads a project, reading modules through `loader`.
    ///
    /// Modules loaded by earlier calls are not read again.
    pub fn load_project_with_loader<F>(
        &mut self,
        entry_path: &str,
        loader: F,
    ) -> Result<(), CompileError>
    where
        F: FnMut(&str) -> Result<String, String>,
    {
        let staged = compile_project(entry_path, loader, &self.registry, &self.model)?;
        debug!(
            entry = entry_path,
            modules = staged.modules().count(),
            bindings = staged.bindings().len(),
            "loaded project"
        );
        self.model = staged;
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.model.names()
    }

    pub fn binding_kind(&self, name: &str) -> Option<SymbolKind> {
        self.model.kind_of(name)
    }

    /// Returns the feature a name designates, following aliases.
    pub fn feature(&self, name: &str) -> Result<Rc<Feature>, BuildError> {
        let (root, path) = self.context().target(&FeatureRef::Named(name.to_string()))?;
        if !path.is_empty() {
            return Err(BuildError::Evaluation(format!(
                "'{name}' designates sub-result '{}' of '{}', not a feature",
                path.join("!"),
                root.label()
            )));
        }
        Ok(root)
    }

    pub fn scalar(&self, name: &str) -> Result<f64, BuildError> {
        self.context()
            .scalar(&ScalarExpr::Symbol(name.to_string()))
    }

    pub fn vector(&self, name: &str) -> Result<DVec3, BuildError> {
        self.context()
            .vector(&VectorExpr::Symbol(name.to_string()))
    }

    pub fn datum(&self, name: &str) -> Result<Datum, BuildError> {
        self.context().datum(&DatumExpr::Symbol(name.to_string()))
    }

    /// Evaluates a selection binding, building its source feature.
    pub fn selection(&self, name: &str) -> Result<Selection, BuildError> {
        self.context()
            .selection(&SelectionExpr::Symbol(name.to_string()))
    }

    /// Structural hash of a feature binding. Does not build anything.
    pub fn structural_hash(&self, name: &str) -> Result<StructuralHash, BuildError> {
        let resolved = self
            .context()
            .resolve_feature(&FeatureRef::Named(name.to_string()))?;
        Ok(resolved.hash)
    }

    /// Builds a feature binding and everything it depends on.
    pub fn build(&self, name: &str) -> Result<Rc<BuildResult>, BuildError> {
        self.context()
            .build_feature(&FeatureRef::Named(name.to_string()))
    }

    /// Features to output: the `export` requests in statement order, or the
    /// last bound feature when there are none.
    pub fn outputs(&self) -> Vec<OutputTarget> {
        if !self.model.outputs().is_empty() {
            return self
                .model
                .outputs()
                .iter()
                .map(|request| OutputTarget {
                    feature: request.feature.clone(),
                    label: request.feature.to_string(),
                    path: request.path.clone(),
                })
                .collect();
        }
        self.model
            .last_feature()
            .map(|binding| OutputTarget {
                feature: FeatureRef::Named(binding.name.clone()),
                label: binding.name.clone(),
                path: None,
            })
            .into_iter()
            .collect()
    }

    /// Builds every output; stops at the first failure.
    pub fn build_outputs(&self) -> Result<Vec<BuiltOutput>, BuildError> {
        let targets = self.outputs();
        if targets.is_empty() {
            return Err(BuildError::NoOutputs);
        }
        let ctx = self.context();
        targets
            .into_iter()
            .map(|target| {
                let resolved = ctx.resolve_feature(&target.feature)?;
                let result = ctx.build_feature(&target.feature)?;
                Ok(BuiltOutput {
                    label: target.label,
                    path: target.path,
                    hash: resolved.hash,
                    result,
                })
            })
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.engine.cache().stats()
    }
}
