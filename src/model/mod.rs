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

//! Symbol table, feature graph, and the lazy build engine.

mod engine;
mod errors;
mod eval;
mod feature;
mod hash;

use crate::ast::{DatumExpr, FeatureRef, ScalarExpr, SelectionExpr, SourceSpan, VectorExpr};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

pub use engine::{BuildEngine, CacheEntry, CacheStats, ResultCache};
pub use errors::BuildError;
pub use eval::{EvalContext, ResolvedFeature};
pub use feature::{BuildStatus, Feature};
pub use hash::StructuralHash;

/// Kind of value a script name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Scalar,
    Vector,
    Datum,
    Feature,
    Selection,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SymbolKind::Scalar => "scalar",
            SymbolKind::Vector => "vector",
            SymbolKind::Datum => "datum",
            SymbolKind::Feature => "feature",
            SymbolKind::Selection => "selection",
        })
    }
}

/// Right-hand side of a binding statement.
#[derive(Debug, Clone)]
pub enum BoundValue {
    Scalar(Rc<ScalarExpr>),
    Vector(Rc<VectorExpr>),
    Datum(Rc<DatumExpr>),
    Feature(FeatureRef),
    Selection(Rc<SelectionExpr>),
}

impl BoundValue {
    pub fn kind(&self) -> SymbolKind {
        match self {
            BoundValue::Scalar(_) => SymbolKind::Scalar,
            BoundValue::Vector(_) => SymbolKind::Vector,
            BoundValue::Datum(_) => SymbolKind::Datum,
            BoundValue::Feature(_) => SymbolKind::Feature,
            BoundValue::Selection(_) => SymbolKind::Selection,
        }
    }
}

/// One `name = value;` statement.
#[derive(Debug, Clone)]
pub struct Binding {
    pub name: String,
    pub value: BoundValue,
    pub span: SourceSpan,
    /// Module the statement came from.
    pub file: String,
}

/// One `export feature (as "path")?;` statement.
#[derive(Debug, Clone)]
pub struct OutputRequest {
    pub feature: FeatureRef,
    pub path: Option<String>,
    pub span: SourceSpan,
    pub file: String,
}

/// The symbol table of a session.
///
/// Bindings keep insertion order, which decides the default output. Names are
/// unique: a name is bound at most once for the lifetime of the model.
#[derive(Debug, Clone, Default)]
pub struct Model {
    bindings: Vec<Binding>,
    index: HashMap<String, usize>,
    outputs: Vec<OutputRequest>,
    modules: BTreeSet<String>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns bindings in insertion order.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.index.get(name).map(|&idx| &self.bindings[idx])
    }

    pub fn kind_of(&self, name: &str) -> Option<SymbolKind> {
        self.binding(name).map(|binding| binding.value.kind())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|binding| binding.name.as_str())
    }

    /// Returns explicit output requests in statement order.
    pub fn outputs(&self) -> &[OutputRequest] {
        &self.outputs
    }

    /// Returns the last feature binding, the default output.
    pub fn last_feature(&self) -> Option<&Binding> {
        self.bindings
            .iter()
            .rev()
            .find(|binding| binding.value.kind() == SymbolKind::Feature)
    }

    /// Returns whether a module path has been loaded into this model.
    pub fn is_loaded(&self, module: &str) -> bool {
        self.modules.contains(module)
    }

    pub fn modules(&self) -> impl Iterator<Item = &str> {
        self.modules.iter().map(String::as_str)
    }

    /// Adds a binding. Returns it back if the name is already taken.
    pub(crate) fn bind(&mut self, binding: Binding) -> Result<(), Binding> {
        if self.index.contains_key(&binding.name) {
            return Err(binding);
        }
        if let BoundValue::Feature(FeatureRef::Inline(feature)) = &binding.value {
            feature.bind_label(&binding.name);
        }
        self.index.insert(binding.name.clone(), self.bindings.len());
        self.bindings.push(binding);
        Ok(())
    }

    pub(crate) fn request_output(&mut self, request: OutputRequest) {
        self.outputs.push(request);
    }

    pub(crate) fn mark_loaded(&mut self, module: &str) {
        self.modules.insert(module.to_string());
    }
}
