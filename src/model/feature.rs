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

//! Feature nodes and their build state machine.

use crate::ast::{Argument, SourceSpan};
use crate::backend::{BuildRequest, BuildResult};
use crate::registry::Param;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

use super::engine::CacheEntry;
use super::eval::{EvalContext, ResolvedArgument};
use super::hash::HashBuilder;
use super::{BuildError, StructuralHash};

/// Observable build state of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Unbuilt,
    /// A build of this feature is on the current call stack.
    Building,
    Built,
    /// The build failed; the error is memoized and never retried.
    Failed,
}

enum BuildState {
    Unbuilt,
    Building,
    Built(Rc<BuildResult>),
    Failed(BuildError),
}

/// One constructor invocation: a type tag plus ordered, typed arguments.
///
/// Arguments are immutable once the feature is created. Feature arguments
/// that name other features are resolved against the session model each time
/// they are needed, so forward references are legal and a referenced feature
/// is only built when this one is.
pub struct Feature {
    type_name: &'static str,
    parameters: &'static [Param],
    arguments: Vec<Argument>,
    span: Option<SourceSpan>,
    label: OnceCell<String>,
    state: RefCell<BuildState>,
    hash: OnceCell<StructuralHash>,
    hashing: Cell<bool>,
}

impl Feature {
    /// Creates an unbuilt feature. Arguments must already match `parameters`.
    pub fn new(
        type_name: &'static str,
        parameters: &'static [Param],
        arguments: Vec<Argument>,
    ) -> Self {
        Self {
            type_name,
            parameters,
            arguments,
            span: None,
            label: OnceCell::new(),
            state: RefCell::new(BuildState::Unbuilt),
            hash: OnceCell::new(),
            hashing: Cell::new(false),
        }
    }

    /// Attaches the constructor's source position.
    pub fn with_span(mut self, span: SourceSpan) -> Self {
        self.span = Some(span);
        self
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Signature the arguments were bound against.
    pub fn parameters(&self) -> &'static [Param] {
        self.parameters
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn span(&self) -> Option<&SourceSpan> {
        self.span.as_ref()
    }

    /// Returns the binding name, or `Type@line:column` for unnamed features.
    pub fn label(&self) -> String {
        if let Some(label) = self.label.get() {
            return label.clone();
        }
        match &self.span {
            Some(span) => format!("{}@{}:{}", self.type_name, span.line, span.column),
            None => self.type_name.to_string(),
        }
    }

    /// Names the feature after the first binding that holds it.
    pub(crate) fn bind_label(&self, name: &str) {
        let _ = self.label.set(name.to_string());
    }

    pub fn status(&self) -> BuildStatus {
        match &*self.state.borrow() {
            BuildState::Unbuilt => BuildStatus::Unbuilt,
            BuildState::Building => BuildStatus::Building,
            BuildState::Built(_) => BuildStatus::Built,
            BuildState::Failed(_) => BuildStatus::Failed,
        }
    }

    /// Returns the memoized result without building.
    pub fn result(&self) -> Option<Rc<BuildResult>> {
        match &*self.state.borrow() {
            BuildState::Built(result) => Some(Rc::clone(result)),
            _ => None,
        }
    }

    /// Returns the memoized failure, if the build failed.
    pub fn error(&self) -> Option<BuildError> {
        match &*self.state.borrow() {
            BuildState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Returns the structural hash if it has already been computed.
    pub fn cached_hash(&self) -> Option<StructuralHash> {
        self.hash.get().copied()
    }

    /// Computes (or returns the memoized) structural hash.
    ///
    /// Resolving arguments may build upstream features when an argument reads
    /// their reference values or selects their sub-shapes.
    pub fn structural_hash(&self, ctx: &EvalContext<'_>) -> Result<StructuralHash, BuildError> {
        if let Some(hash) = self.hash.get() {
            return Ok(*hash);
        }
        self.fingerprint(ctx).map(|(hash, _)| hash)
    }

    /// Resolves every argument and folds them into the structural hash.
    pub(crate) fn fingerprint(
        &self,
        ctx: &EvalContext<'_>,
    ) -> Result<(StructuralHash, Vec<ResolvedArgument>), BuildError> {
        // Hashing guard: a reference cycle reaches this feature again before
        // any build state changes.
        if self.hashing.replace(true) {
            return Err(BuildError::CircularDependency {
                feature: self.label(),
            });
        }
        let inner = ctx.within(self);
        let resolved: Result<Vec<_>, _> = self
            .arguments
            .iter()
            .map(|arg| inner.resolve_argument(arg))
            .collect();
        self.hashing.set(false);
        let resolved = resolved?;

        let mut builder = HashBuilder::new("feature");
        builder.str(self.type_name);
        builder.u64(resolved.len() as u64);
        for arg in &resolved {
            arg.fold(&mut builder);
        }
        let hash = builder.finish();
        let _ = self.hash.set(hash);
        Ok((hash, resolved))
    }

    /// Builds the feature once and returns the memoized result afterwards.
    ///
    /// `Unbuilt -> Building -> Built | Failed`. Reaching a feature that is
    /// `Building` is a circular dependency. Failures are memoized as well,
    /// except unresolved names: the feature returns to `Unbuilt` so a later
    /// load can bind them.
    pub fn ensure_built(&self, ctx: &EvalContext<'_>) -> Result<Rc<BuildResult>, BuildError> {
        match &*self.state.borrow() {
            BuildState::Built(result) => return Ok(Rc::clone(result)),
            BuildState::Failed(err) => return Err(err.clone()),
            BuildState::Building => {
                return Err(BuildError::CircularDependency {
                    feature: self.label(),
                });
            }
            BuildState::Unbuilt => {}
        }

        self.state.replace(BuildState::Building);
        let outcome = self.build_uncached(ctx);
        let next = match &outcome {
            Ok(result) => BuildState::Built(Rc::clone(result)),
            Err(err) if matches!(err.root_cause(), BuildError::UnresolvedReference { .. }) => {
                debug!(feature = %self.label(), error = %err, "feature build deferred");
                BuildState::Unbuilt
            }
            Err(err) => {
                warn!(feature = %self.label(), error = %err, "feature build failed");
                BuildState::Failed(err.clone())
            }
        };
        self.state.replace(next);
        outcome
    }

    fn build_uncached(&self, ctx: &EvalContext<'_>) -> Result<Rc<BuildResult>, BuildError> {
        let (hash, resolved) = self.fingerprint(ctx)?;
        let label = self.label();

        if let Some(entry) = ctx.engine().lookup(&hash) {
            debug!(feature = %label, hash = %hash.short(), "structural cache hit");
            return match entry {
                CacheEntry::Built(result) => Ok(result),
                CacheEntry::Failed(source) => Err(BuildError::Backend {
                    feature: label,
                    source,
                }),
            };
        }

        // Dependencies are built here, before the backend sees this feature.
        let inner = ctx.within(self);
        let inputs = resolved
            .into_iter()
            .map(|arg| inner.input(arg))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            feature = %label,
            feature_type = self.type_name,
            hash = %hash.short(),
            "building feature"
        );
        let request = BuildRequest {
            feature_type: self.type_name,
            label: &label,
            hash,
            parameters: self.parameters,
            inputs: &inputs,
        };
        ctx.engine()
            .invoke(&request)
            .map_err(|source| BuildError::Backend {
                feature: label.clone(),
                source,
            })
    }
}

impl fmt::Debug for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("type_name", &self.type_name)
            .field("label", &self.label())
            .field("arguments", &self.arguments.len())
            .field("status", &self.status())
            .finish()
    }
}
