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

//! Value expression trees produced by the grammar.
//!
//! Nodes are immutable and shared through `Rc`: the same sub-expression may be
//! an argument of several features, so the argument graph is a DAG. Evaluation
//! lives in `model::eval`.

use crate::backend::EntityKind;
use crate::model::Feature;
use nom_locate::LocatedSpan;
use std::fmt;
use std::rc::Rc;

/// Parser input span type carrying byte offsets and line/column info.
pub type Span<'a> = LocatedSpan<&'a str>;

/// Source range and anchor position for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceSpan {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
    /// 1-based line number.
    pub line: usize,
    /// 1-based UTF-8 column.
    pub column: usize,
}

impl SourceSpan {
    /// Creates a source span from parser start/end positions.
    pub fn from_bounds(start: Span<'_>, end: Span<'_>) -> Self {
        Self {
            start: start.location_offset(),
            end: end.location_offset(),
            line: start.location_line() as usize,
            column: start.get_utf8_column(),
        }
    }

    /// Returns span length in bytes.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns whether the span covers no input.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Binary scalar operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Exponentiation (`^`).
    Pow,
}

/// Single-argument scalar builtins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarFn {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sqrt,
    Abs,
    Ln,
    Exp,
}

impl ScalarFn {
    /// Script names of every builtin, in the order the grammar tries them.
    pub const ALL: [(&'static str, ScalarFn); 10] = [
        ("sin", ScalarFn::Sin),
        ("cos", ScalarFn::Cos),
        ("tan", ScalarFn::Tan),
        ("asin", ScalarFn::Asin),
        ("acos", ScalarFn::Acos),
        ("atan", ScalarFn::Atan),
        ("sqrt", ScalarFn::Sqrt),
        ("abs", ScalarFn::Abs),
        ("ln", ScalarFn::Ln),
        ("exp", ScalarFn::Exp),
    ];

    pub fn apply(self, x: f64) -> f64 {
        match self {
            ScalarFn::Sin => x.sin(),
            ScalarFn::Cos => x.cos(),
            ScalarFn::Tan => x.tan(),
            ScalarFn::Asin => x.asin(),
            ScalarFn::Acos => x.acos(),
            ScalarFn::Atan => x.atan(),
            ScalarFn::Sqrt => x.sqrt(),
            ScalarFn::Abs => x.abs(),
            ScalarFn::Ln => x.ln(),
            ScalarFn::Exp => x.exp(),
        }
    }
}

/// Vector component selector (`.x`, `.y`, `.z`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
    Z,
}

/// Vector-valued part of a datum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatumPart {
    /// `.origin` of any datum (the location of a point datum).
    Origin,
    /// `.direction` of an axis.
    Direction,
    /// `.normal` of a plane.
    Normal,
}

impl DatumPart {
    /// Script accessor names.
    pub const ALL: [(&'static str, DatumPart); 3] = [
        ("origin", DatumPart::Origin),
        ("direction", DatumPart::Direction),
        ("normal", DatumPart::Normal),
    ];

    pub fn name(self) -> &'static str {
        match self {
            DatumPart::Origin => "origin",
            DatumPart::Direction => "direction",
            DatumPart::Normal => "normal",
        }
    }
}

/// Scalar expression node.
#[derive(Debug, Clone)]
pub enum ScalarExpr {
    Literal(f64),
    /// Reference to a scalar binding.
    Symbol(String),
    Neg(Rc<ScalarExpr>),
    Binary {
        op: BinOp,
        left: Rc<ScalarExpr>,
        right: Rc<ScalarExpr>,
    },
    Call {
        func: ScalarFn,
        arg: Rc<ScalarExpr>,
    },
    Dot(Rc<VectorExpr>, Rc<VectorExpr>),
    Magnitude(Rc<VectorExpr>),
    Component {
        vector: Rc<VectorExpr>,
        component: Component,
    },
    /// Named reference value of a built feature (`F$name`).
    FeatureValue { feature: FeatureRef, name: String },
}

/// Vector expression node.
#[derive(Debug, Clone)]
pub enum VectorExpr {
    /// Component-wise literal (`[x, y, z]` or `Vector(x, y, z)`).
    Literal([Rc<ScalarExpr>; 3]),
    /// Reference to a vector binding.
    Symbol(String),
    Neg(Rc<VectorExpr>),
    Add(Rc<VectorExpr>, Rc<VectorExpr>),
    Sub(Rc<VectorExpr>, Rc<VectorExpr>),
    Scale {
        vector: Rc<VectorExpr>,
        factor: Rc<ScalarExpr>,
    },
    Divide {
        vector: Rc<VectorExpr>,
        divisor: Rc<ScalarExpr>,
    },
    Cross(Rc<VectorExpr>, Rc<VectorExpr>),
    Normalize(Rc<VectorExpr>),
    /// Named reference point of a built feature (`F@name`).
    FeaturePoint { feature: FeatureRef, name: String },
    DatumPart { datum: Rc<DatumExpr>, part: DatumPart },
}

/// Datum expression node.
#[derive(Debug, Clone)]
pub enum DatumExpr {
    Point(Rc<VectorExpr>),
    Axis {
        origin: Rc<VectorExpr>,
        direction: Rc<VectorExpr>,
    },
    Plane {
        origin: Rc<VectorExpr>,
        normal: Rc<VectorExpr>,
    },
    /// Reference to a datum binding.
    Symbol(String),
}

/// Feature-set (sub-shape selection) expression node.
#[derive(Debug, Clone)]
pub enum SelectionExpr {
    /// `edges(F, "filter")` and friends.
    Query {
        feature: FeatureRef,
        kind: EntityKind,
        filter: String,
    },
    Union(Rc<SelectionExpr>, Rc<SelectionExpr>),
    Difference(Rc<SelectionExpr>, Rc<SelectionExpr>),
    /// Reference to a selection binding.
    Symbol(String),
}

/// Handle to a feature used as an argument or binding.
///
/// Named references are late-bound: they are looked up in the session symbol
/// table when the referencing feature is hashed or built.
#[derive(Debug, Clone)]
pub enum FeatureRef {
    Named(String),
    /// Constructor call embedded directly in an expression.
    Inline(Rc<Feature>),
    /// Named sub-result of another feature (`F!name`).
    Sub { base: Box<FeatureRef>, name: String },
}

impl fmt::Display for FeatureRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureRef::Named(name) => f.write_str(name),
            FeatureRef::Inline(feature) => f.write_str(&feature.label()),
            FeatureRef::Sub { base, name } => write!(f, "{base}!{name}"),
        }
    }
}

/// One parsed constructor argument.
#[derive(Debug, Clone)]
pub enum Argument {
    Scalar(Rc<ScalarExpr>),
    Vector(Rc<VectorExpr>),
    Datum(Rc<DatumExpr>),
    Feature(FeatureRef),
    Selection(Rc<SelectionExpr>),
    /// Bare option word such as `centered`.
    Keyword(String),
}

impl Argument {
    /// Short kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Argument::Scalar(_) => "scalar",
            Argument::Vector(_) => "vector",
            Argument::Datum(_) => "datum",
            Argument::Feature(_) => "feature",
            Argument::Selection(_) => "selection",
            Argument::Keyword(_) => "keyword",
        }
    }

    /// Convenience constructor for a literal scalar argument.
    pub fn scalar(value: f64) -> Self {
        Argument::Scalar(Rc::new(ScalarExpr::Literal(value)))
    }

    /// Convenience constructor for a literal vector argument.
    pub fn vector(x: f64, y: f64, z: f64) -> Self {
        Argument::Vector(Rc::new(VectorExpr::Literal([
            Rc::new(ScalarExpr::Literal(x)),
            Rc::new(ScalarExpr::Literal(y)),
            Rc::new(ScalarExpr::Literal(z)),
        ])))
    }

    /// Convenience constructor for a named feature reference.
    pub fn feature(name: impl Into<String>) -> Self {
        Argument::Feature(FeatureRef::Named(name.into()))
    }
}
