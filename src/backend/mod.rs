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

//! Geometry backend interface.
//!
//! The engine never performs geometry itself. Once a feature's arguments are
//! resolved and its dependencies built, the backend receives a
//! [`BuildRequest`] and returns an opaque [`Shape`] together with named
//! reference points, values, and sub-results.

mod symbolic;

pub use symbolic::{SymbolicBackend, SymbolicShape};

use crate::model::StructuralHash;
use crate::registry::Param;
use glam::DVec3;
use std::any::Any;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Error type for backend operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The construction is geometrically impossible (degenerate input, ...).
    #[error("infeasible construction: {0}")]
    Infeasible(String),

    /// The backend does not implement the requested feature type.
    #[error("unsupported feature type '{0}'")]
    Unsupported(String),

    #[error("invalid selection filter: {0}")]
    InvalidFilter(String),

    #[error("geometry kernel not available: {0}")]
    KernelNotAvailable(String),

    #[error("operation failed: {0}")]
    OperationFailed(String),
}

/// Result type for backend operations.
pub type BackendResult<T> = Result<T, BackendError>;

/// Sub-shape category addressed by a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Solid,
    Face,
    Edge,
    Vertex,
}

impl EntityKind {
    /// Script query function names, in grammar order.
    pub const ALL: [(&'static str, EntityKind); 4] = [
        ("solids", EntityKind::Solid),
        ("faces", EntityKind::Face),
        ("edges", EntityKind::Edge),
        ("vertices", EntityKind::Vertex),
    ];

    pub fn name(self) -> &'static str {
        match self {
            EntityKind::Solid => "solids",
            EntityKind::Face => "faces",
            EntityKind::Edge => "edges",
            EntityKind::Vertex => "vertices",
        }
    }
}

/// Evaluated datum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Datum {
    Point(DVec3),
    Axis { origin: DVec3, direction: DVec3 },
    Plane { origin: DVec3, normal: DVec3 },
}

impl Datum {
    pub fn origin(&self) -> DVec3 {
        match *self {
            Datum::Point(p) => p,
            Datum::Axis { origin, .. } | Datum::Plane { origin, .. } => origin,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Datum::Point(_) => "point",
            Datum::Axis { .. } => "axis",
            Datum::Plane { .. } => "plane",
        }
    }
}

/// Type-erased shape handle owned by the backend.
#[derive(Clone)]
pub struct Shape(Rc<dyn Any>);

impl Shape {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    /// Returns the backend payload if it has type `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Shape(..)")
    }
}

/// Output of one feature build.
#[derive(Debug, Clone)]
pub struct BuildResult {
    pub shape: Shape,
    /// Named reference points (`F@name`).
    pub points: BTreeMap<String, DVec3>,
    /// Named reference values (`F$name`).
    pub values: BTreeMap<String, f64>,
    /// Named sub-results (`F!name`).
    pub sub_results: BTreeMap<String, Rc<BuildResult>>,
}

impl BuildResult {
    /// Creates a result without auxiliary maps.
    pub fn new(shape: Shape) -> Self {
        Self {
            shape,
            points: BTreeMap::new(),
            values: BTreeMap::new(),
            sub_results: BTreeMap::new(),
        }
    }

    pub fn with_point(mut self, name: impl Into<String>, point: DVec3) -> Self {
        self.points.insert(name.into(), point);
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn with_sub_result(mut self, name: impl Into<String>, result: Rc<BuildResult>) -> Self {
        self.sub_results.insert(name.into(), result);
        self
    }
}

/// Evaluated feature set: a subset of one built feature's sub-shapes.
#[derive(Debug, Clone)]
pub struct Selection {
    /// Structural hash of the feature the ids refer to.
    pub source: StructuralHash,
    pub source_label: String,
    pub kind: EntityKind,
    pub ids: BTreeSet<u32>,
    /// Build result the ids index into.
    pub shape: Rc<BuildResult>,
}

/// Fully resolved build input handed to the backend.
#[derive(Debug, Clone)]
pub enum Input {
    Scalar(f64),
    Vector(DVec3),
    Datum(Datum),
    Keyword(String),
    Shape(Rc<BuildResult>),
    Selection(Selection),
}

/// One construction request.
#[derive(Debug)]
pub struct BuildRequest<'a> {
    pub feature_type: &'a str,
    /// Symbol name of the feature, or a type/position label for inline ones.
    pub label: &'a str,
    pub hash: StructuralHash,
    /// Declared signature of the feature type.
    pub parameters: &'a [Param],
    pub inputs: &'a [Input],
}

impl BuildRequest<'_> {
    /// Returns the parameter name for input `index`, repeating a trailing
    /// variadic parameter as `name0`, `name1`, ...
    pub fn parameter_name(&self, index: usize) -> String {
        match self.parameters.get(index) {
            Some(param) if !param.is_variadic() => param.name.to_string(),
            _ => match self.parameters.last() {
                Some(last) if last.is_variadic() => {
                    let first = self.parameters.len() - 1;
                    format!("{}{}", last.name, index.saturating_sub(first))
                }
                _ => format!("arg{index}"),
            },
        }
    }
}

/// Interface every geometry kernel implements.
pub trait GeometryBackend {
    fn name(&self) -> &str;

    /// Performs one construction. Dependencies are already built and passed
    /// as [`Input::Shape`].
    fn build(&self, request: &BuildRequest<'_>) -> BackendResult<BuildResult>;

    /// Evaluates a sub-shape filter predicate against a built result.
    fn select(
        &self,
        result: &BuildResult,
        kind: EntityKind,
        filter: &str,
    ) -> BackendResult<BTreeSet<u32>>;
}

/// Backend used when no geometry kernel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullBackend;

impl GeometryBackend for NullBackend {
    fn name(&self) -> &str {
        "null"
    }

    fn build(&self, request: &BuildRequest<'_>) -> BackendResult<BuildResult> {
        Err(BackendError::KernelNotAvailable(format!(
            "cannot build {} '{}'",
            request.feature_type, request.label
        )))
    }

    fn select(
        &self,
        _result: &BuildResult,
        kind: EntityKind,
        _filter: &str,
    ) -> BackendResult<BTreeSet<u32>> {
        Err(BackendError::KernelNotAvailable(format!(
            "cannot select {}",
            kind.name()
        )))
    }
}
