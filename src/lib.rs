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

//! Declarative CAD scripting with lazy, cached feature builds.
//!
//! A script binds names to values and to geometric features:
//!
//! ```text
//! r = 5;
//! axis = Axis([0, 0, 0], [0, 0, 1]);
//! body = Cylinder([0, 0, 0], [0, 0, 20], 2 * r);
//! cap = Translate(Sphere([0, 0, 0], 2 * r), body@p1);
//! part = Union(body, cap);
//! rim = edges(body, "0");
//! export Fillet(rim, 1) as "out/part.step";
//! ```
//!
//! Scripts are parsed into a symbol table ([`Model`]); nothing is built until a
//! query needs it. Each feature is identified by a structural hash over its
//! type and fully resolved arguments, so two textually different but
//! equivalent constructions share one build.
//!
//! # Pipeline
//!
//! 1. Parse with a grammar composed from the registered feature types
//!    ([`FeatureRegistry`]).
//! 2. Resolve names lazily against the session symbol table.
//! 3. Hash and build on demand through a [`GeometryBackend`], memoizing both
//!    successes and failures.
//!
//! Geometry is out of scope: [`NullBackend`] rejects every build and
//! [`SymbolicBackend`] records construction terms.

mod ast;
mod backend;
mod diagnostics;
mod features;
mod model;
mod parser;
mod project;
mod registry;
mod session;

pub use ast::{
    Argument, BinOp, Component, DatumExpr, DatumPart, FeatureRef, ScalarExpr, ScalarFn,
    SelectionExpr, SourceSpan, Span, VectorExpr,
};
pub use backend::{
    BackendError, BackendResult, BuildRequest, BuildResult, Datum, EntityKind, GeometryBackend,
    Input, NullBackend, Selection, Shape, SymbolicBackend, SymbolicShape,
};
pub use diagnostics::{CompileError, CompileErrorKind};
pub use model::{
    Binding, BoundValue, BuildEngine, BuildError, BuildStatus, CacheEntry, CacheStats,
    EvalContext, Feature, Model, OutputRequest, ResolvedFeature, ResultCache, StructuralHash,
    SymbolKind,
};
pub use parser::{
    ArgumentGrammar, Grammar, PResult, identifier, keyword, signature_arguments, string_literal,
    ws_char,
};
pub use project::ScriptSource;
pub use registry::{
    Arity, Factory, Fallback, FeatureRegistry, FeatureTypeDescriptor, Param, ParamKind,
    RegistryError, bind_arguments, is_reserved, standard_factory,
};
pub use session::{BuiltOutput, CacheScope, OutputTarget, Session, SessionConfig};

use std::rc::Rc;
use thiserror::Error;

/// Error of the one-shot [`evaluate_script`] entry point.
#[derive(Debug, Clone, Error)]
pub enum ScriptError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Parses `source` and builds all of its outputs with `backend`.
pub fn evaluate_script(
    source: &str,
    backend: Rc<dyn GeometryBackend>,
) -> Result<Vec<BuiltOutput>, ScriptError> {
    let mut session = Session::with_config(SessionConfig::new().with_shared_backend(backend));
    session.load_script(source)?;
    Ok(session.build_outputs()?)
}

#[cfg(test)]
mod tests;
