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

//! Error types surfaced by evaluation and build APIs.

use crate::backend::BackendError;
use thiserror::Error;

use super::SymbolKind;

/// Errors produced while resolving values or building features.
///
/// Failures of an input are wrapped in [`BuildError::Upstream`] by every
/// feature that depends on it, so the full chain down to the original cause
/// is kept. Use [`BuildError::root_cause`] to reach that cause.
#[derive(Debug, Clone, Error)]
pub enum BuildError {
    /// A feature's build or hash required its own result.
    #[error("circular dependency involving feature '{feature}'")]
    CircularDependency { feature: String },

    /// A name is not bound in the session.
    #[error("unresolved {kind} reference '{name}'")]
    UnresolvedReference { kind: SymbolKind, name: String },

    /// A name is bound, but to a value of another kind.
    #[error("'{name}' is a {found}, expected a {expected}")]
    KindMismatch {
        name: String,
        expected: SymbolKind,
        found: SymbolKind,
    },

    /// The geometry backend rejected the construction.
    #[error("feature '{feature}' failed: {source}")]
    Backend {
        feature: String,
        source: BackendError,
    },

    /// An input of the feature failed.
    #[error("feature '{feature}' depends on a failed input: {source}")]
    Upstream {
        feature: String,
        source: Box<BuildError>,
    },

    /// The backend could not evaluate a selection filter.
    #[error("selecting {kind} of '{feature}' failed: {source}")]
    Selection {
        feature: String,
        kind: &'static str,
        source: BackendError,
    },

    #[error("feature '{feature}' has no sub-result '{name}'")]
    MissingSubResult { feature: String, name: String },

    #[error("feature '{feature}' has no reference {category} '{name}'")]
    MissingReference {
        feature: String,
        category: &'static str,
        name: String,
    },

    /// Set operations require operands drawn from the same sub-shapes.
    #[error("cannot combine {left} with {right}")]
    IncompatibleSelections { left: String, right: String },

    /// Numeric evaluation failed (zero-length direction, wrong datum part, ...).
    #[error("{0}")]
    Evaluation(String),

    #[error("the session has no output feature")]
    NoOutputs,
}

impl BuildError {
    /// Returns the original error at the end of an upstream chain.
    pub fn root_cause(&self) -> &BuildError {
        let mut current = self;
        while let BuildError::Upstream { source, .. } = current {
            current = source;
        }
        current
    }

    /// Returns the labels of the features the failure propagated through,
    /// outermost first.
    pub fn propagation_path(&self) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = self;
        while let BuildError::Upstream { feature, source } = current {
            path.push(feature.as_str());
            current = source;
        }
        path
    }
}
