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

//! Value evaluation and argument resolution.
//!
//! Expression trees are evaluated bottom-up on every call. Reading a
//! reference value, reference point, sub-result, or selection of a feature
//! builds that feature first; that is the only coupling between value
//! evaluation and the build engine.

use crate::ast::{
    Argument, BinOp, Component, DatumExpr, DatumPart, FeatureRef, ScalarExpr, SelectionExpr,
    VectorExpr,
};
use crate::backend::{BuildResult, Datum, Input, Selection};
use glam::DVec3;
use std::collections::HashSet;
use std::rc::Rc;

use super::engine::BuildEngine;
use super::hash::HashBuilder;
use super::{BoundValue, BuildError, Feature, Model, StructuralHash, SymbolKind};

/// Evaluation environment: the symbol table that late-bound names resolve
/// against plus the engine that builds features on demand.
#[derive(Clone, Copy)]
pub struct EvalContext<'a> {
    model: &'a Model,
    engine: &'a BuildEngine,
    // Feature whose arguments are being resolved; failures of its inputs are
    // wrapped as `Upstream` errors naming it.
    within: Option<&'a Feature>,
}

/// Feature argument after alias resolution.
#[derive(Debug, Clone)]
pub struct ResolvedFeature {
    pub root: Rc<Feature>,
    /// Named sub-result path below `root` (`F!a!b`).
    pub path: Vec<String>,
    /// Structural identity: the root hash, extended by the sub-result path.
    pub hash: StructuralHash,
}

impl ResolvedFeature {
    fn new(root: Rc<Feature>, path: Vec<String>, root_hash: StructuralHash) -> Self {
        let hash = if path.is_empty() {
            root_hash
        } else {
            let mut builder = HashBuilder::new("sub-result");
            builder.hash(&root_hash);
            builder.u64(path.len() as u64);
            for name in &path {
                builder.str(name);
            }
            builder.finish()
        };
        Self { root, path, hash }
    }

    pub fn label(&self) -> String {
        let mut label = self.root.label();
        for name in &self.path {
            label.push('!');
            label.push_str(name);
        }
        label
    }
}

/// Constructor argument with every value evaluated.
#[derive(Debug, Clone)]
pub(crate) enum ResolvedArgument {
    Scalar(f64),
    Vector(DVec3),
    Datum(Datum),
    Keyword(String),
    Feature(ResolvedFeature),
    Selection(Selection),
}

impl ResolvedArgument {
    /// Folds the argument into a structural hash.
    pub(crate) fn fold(&self, builder: &mut HashBuilder) {
        match self {
            ResolvedArgument::Scalar(value) => {
                builder.tag(b's');
                builder.f64(*value);
            }
            ResolvedArgument::Vector(value) => {
                builder.tag(b'v');
                builder.vec3(*value);
            }
            ResolvedArgument::Datum(datum) => {
                builder.tag(b'd');
                match *datum {
                    Datum::Point(point) => {
                        builder.tag(0);
                        builder.vec3(point);
                    }
                    Datum::Axis { origin, direction } => {
                        builder.tag(1);
                        builder.vec3(origin);
                        builder.vec3(direction);
                    }
                    Datum::Plane { origin, normal } => {
                        builder.tag(2);
                        builder.vec3(origin);
                        builder.vec3(normal);
                    }
                }
            }
            ResolvedArgument::Keyword(word) => {
                builder.tag(b'k');
                builder.str(word);
            }
            ResolvedArgument::Feature(feature) => {
                builder.tag(b'f');
                builder.hash(&feature.hash);
            }
            ResolvedArgument::Selection(selection) => {
                builder.tag(b'e');
                builder.hash(&selection.source);
                builder.str(selection.kind.name());
                builder.u64(selection.ids.len() as u64);
                for id in &selection.ids {
                    builder.u64(u64::from(*id));
                }
            }
        }
    }
}

impl<'a> EvalContext<'a> {
    pub fn new(model: &'a Model, engine: &'a BuildEngine) -> Self {
        Self {
            model,
            engine,
            within: None,
        }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }

    pub fn engine(&self) -> &'a BuildEngine {
        self.engine
    }

    /// Returns a context resolving the arguments of `feature`.
    pub(crate) fn within<'b>(&self, feature: &'b Feature) -> EvalContext<'b>
    where
        'a: 'b,
    {
        EvalContext {
            model: self.model,
            engine: self.engine,
            within: Some(feature),
        }
    }

    fn upstream(&self, source: BuildError) -> BuildError {
        match self.within {
            Some(feature) => BuildError::Upstream {
                feature: feature.label(),
                source: Box::new(source),
            },
            None => source,
        }
    }

    fn binding(&self, name: &str, kind: SymbolKind) -> Result<&'a BoundValue, BuildError> {
        self.model
            .binding(name)
            .map(|binding| &binding.value)
            .ok_or_else(|| BuildError::UnresolvedReference {
                kind,
                name: name.to_string(),
            })
    }

    fn mismatch(name: &str, expected: SymbolKind, found: &BoundValue) -> BuildError {
        BuildError::KindMismatch {
            name: name.to_string(),
            expected,
            found: found.kind(),
        }
    }

    /// Evaluates a scalar expression.
    pub fn scalar(&self, expr: &ScalarExpr) -> Result<f64, BuildError> {
        match expr {
            ScalarExpr::Literal(value) => Ok(*value),
            ScalarExpr::Symbol(name) => match self.binding(name, SymbolKind::Scalar)? {
                BoundValue::Scalar(expr) => self.scalar(expr),
                other => Err(Self::mismatch(name, SymbolKind::Scalar, other)),
            },
            ScalarExpr::Neg(inner) => Ok(-self.scalar(inner)?),
            ScalarExpr::Binary { op, left, right } => {
                let left = self.scalar(left)?;
                let right = self.scalar(right)?;
                Ok(match op {
                    BinOp::Add => left + right,
                    BinOp::Sub => left - right,
                    BinOp::Mul => left * right,
                    BinOp::Div => left / right,
                    BinOp::Pow => left.powf(right),
                })
            }
            ScalarExpr::Call { func, arg } => Ok(func.apply(self.scalar(arg)?)),
            ScalarExpr::Dot(a, b) => Ok(self.vector(a)?.dot(self.vector(b)?)),
            ScalarExpr::Magnitude(v) => Ok(self.vector(v)?.length()),
            ScalarExpr::Component { vector, component } => {
                let v = self.vector(vector)?;
                Ok(match component {
                    Component::X => v.x,
                    Component::Y => v.y,
                    Component::Z => v.z,
                })
            }
            ScalarExpr::FeatureValue { feature, name } => {
                let result = self.build_feature(feature)?;
                result
                    .values
                    .get(name)
                    .copied()
                    .ok_or_else(|| BuildError::MissingReference {
                        feature: feature.to_string(),
                        category: "value",
                        name: name.clone(),
                    })
            }
        }
    }

    /// Evaluates a vector expression.
    pub fn vector(&self, expr: &VectorExpr) -> Result<DVec3, BuildError> {
        match expr {
            VectorExpr::Literal([x, y, z]) => Ok(DVec3::new(
                self.scalar(x)?,
                self.scalar(y)?,
                self.scalar(z)?,
            )),
            VectorExpr::Symbol(name) => match self.binding(name, SymbolKind::Vector)? {
                BoundValue::Vector(expr) => self.vector(expr),
                other => Err(Self::mismatch(name, SymbolKind::Vector, other)),
            },
            VectorExpr::Neg(inner) => Ok(-self.vector(inner)?),
            VectorExpr::Add(a, b) => Ok(self.vector(a)? + self.vector(b)?),
            VectorExpr::Sub(a, b) => Ok(self.vector(a)? - self.vector(b)?),
            VectorExpr::Scale { vector, factor } => Ok(self.vector(vector)? * self.scalar(factor)?),
            VectorExpr::Divide { vector, divisor } => {
                Ok(self.vector(vector)? / self.scalar(divisor)?)
            }
            VectorExpr::Cross(a, b) => Ok(self.vector(a)?.cross(self.vector(b)?)),
            VectorExpr::Normalize(inner) => unit(self.vector(inner)?, "normalize argument"),
            VectorExpr::FeaturePoint { feature, name } => {
                let result = self.build_feature(feature)?;
                result
                    .points
                    .get(name)
                    .copied()
                    .ok_or_else(|| BuildError::MissingReference {
                        feature: feature.to_string(),
                        category: "point",
                        name: name.clone(),
                    })
            }
            VectorExpr::DatumPart { datum, part } => {
                let datum = self.datum(datum)?;
                match (part, datum) {
                    (DatumPart::Origin, datum) => Ok(datum.origin()),
                    (DatumPart::Direction, Datum::Axis { direction, .. }) => Ok(direction),
                    (DatumPart::Normal, Datum::Plane { normal, .. }) => Ok(normal),
                    (part, datum) => Err(BuildError::Evaluation(format!(
                        "a {} datum has no {}",
                        datum.kind_name(),
                        part.name()
                    ))),
                }
            }
        }
    }

    /// Evaluates a datum expression; axis directions and plane normals are
    /// normalized.
    pub fn datum(&self, expr: &DatumExpr) -> Result<Datum, BuildError> {
        match expr {
            DatumExpr::Point(location) => Ok(Datum::Point(self.vector(location)?)),
            DatumExpr::Axis { origin, direction } => Ok(Datum::Axis {
                origin: self.vector(origin)?,
                direction: unit(self.vector(direction)?, "axis direction")?,
            }),
            DatumExpr::Plane { origin, normal } => Ok(Datum::Plane {
                origin: self.vector(origin)?,
                normal: unit(self.vector(normal)?, "plane normal")?,
            }),
            DatumExpr::Symbol(name) => match self.binding(name, SymbolKind::Datum)? {
                BoundValue::Datum(expr) => self.datum(expr),
                other => Err(Self::mismatch(name, SymbolKind::Datum, other)),
            },
        }
    }

    /// Evaluates a selection; the selected feature is built first.
    pub fn selection(&self, expr: &SelectionExpr) -> Result<Selection, BuildError> {
        match expr {
            SelectionExpr::Query {
                feature,
                kind,
                filter,
            } => {
                let target = self.resolve_feature(feature)?;
                let shape = self.build_resolved(&target)?;
                let ids = self
                    .engine
                    .backend()
                    .select(&shape, *kind, filter)
                    .map_err(|source| BuildError::Selection {
                        feature: target.label(),
                        kind: kind.name(),
                        source,
                    })?;
                Ok(Selection {
                    source: target.hash,
                    source_label: target.label(),
                    kind: *kind,
                    ids,
                    shape,
                })
            }
            SelectionExpr::Union(a, b) => {
                let (mut left, right) = self.compatible_pair(a, b)?;
                left.ids.extend(right.ids);
                Ok(left)
            }
            SelectionExpr::Difference(a, b) => {
                let (mut left, right) = self.compatible_pair(a, b)?;
                left.ids.retain(|id| !right.ids.contains(id));
                Ok(left)
            }
            SelectionExpr::Symbol(name) => match self.binding(name, SymbolKind::Selection)? {
                BoundValue::Selection(expr) => self.selection(expr),
                other => Err(Self::mismatch(name, SymbolKind::Selection, other)),
            },
        }
    }

    fn compatible_pair(
        &self,
        a: &SelectionExpr,
        b: &SelectionExpr,
    ) -> Result<(Selection, Selection), BuildError> {
        let left = self.selection(a)?;
        let right = self.selection(b)?;
        if left.source != right.source || left.kind != right.kind {
            return Err(BuildError::IncompatibleSelections {
                left: format!("{} of '{}'", left.kind.name(), left.source_label),
                right: format!("{} of '{}'", right.kind.name(), right.source_label),
            });
        }
        Ok((left, right))
    }

    /// Follows feature aliases to the designated feature and sub-result path.
    pub fn target(&self, reference: &FeatureRef) -> Result<(Rc<Feature>, Vec<String>), BuildError> {
        let mut visited = HashSet::new();
        self.target_inner(reference, &mut visited)
    }

    fn target_inner(
        &self,
        reference: &FeatureRef,
        visited: &mut HashSet<String>,
    ) -> Result<(Rc<Feature>, Vec<String>), BuildError> {
        match reference {
            FeatureRef::Inline(feature) => Ok((Rc::clone(feature), Vec::new())),
            FeatureRef::Named(name) => {
                if !visited.insert(name.clone()) {
                    return Err(BuildError::CircularDependency {
                        feature: name.clone(),
                    });
                }
                match self.binding(name, SymbolKind::Feature)? {
                    BoundValue::Feature(inner) => self.target_inner(inner, visited),
                    other => Err(Self::mismatch(name, SymbolKind::Feature, other)),
                }
            }
            FeatureRef::Sub { base, name } => {
                let (root, mut path) = self.target_inner(base, visited)?;
                path.push(name.clone());
                Ok((root, path))
            }
        }
    }

    /// Resolves a feature reference to its root feature and structural identity.
    pub fn resolve_feature(&self, reference: &FeatureRef) -> Result<ResolvedFeature, BuildError> {
        let (root, path) = self.target(reference)?;
        let root_hash = root
            .structural_hash(self)
            .map_err(|err| self.upstream(err))?;
        Ok(ResolvedFeature::new(root, path, root_hash))
    }

    /// Builds the feature a reference designates and descends its sub-results.
    pub fn build_feature(&self, reference: &FeatureRef) -> Result<Rc<BuildResult>, BuildError> {
        let (root, path) = self.target(reference)?;
        let result = self.dependency(&root)?;
        descend(&root.label(), result, &path)
    }

    fn build_resolved(&self, feature: &ResolvedFeature) -> Result<Rc<BuildResult>, BuildError> {
        let result = self.dependency(&feature.root)?;
        descend(&feature.root.label(), result, &feature.path)
    }

    fn dependency(&self, feature: &Feature) -> Result<Rc<BuildResult>, BuildError> {
        feature.ensure_built(self).map_err(|err| self.upstream(err))
    }

    pub(crate) fn resolve_argument(&self, argument: &Argument) -> Result<ResolvedArgument, BuildError> {
        Ok(match argument {
            Argument::Scalar(expr) => ResolvedArgument::Scalar(self.scalar(expr)?),
            Argument::Vector(expr) => ResolvedArgument::Vector(self.vector(expr)?),
            Argument::Datum(expr) => ResolvedArgument::Datum(self.datum(expr)?),
            Argument::Keyword(word) => ResolvedArgument::Keyword(word.clone()),
            Argument::Feature(reference) => {
                ResolvedArgument::Feature(self.resolve_feature(reference)?)
            }
            Argument::Selection(expr) => ResolvedArgument::Selection(self.selection(expr)?),
        })
    }

    /// Turns a resolved argument into a backend input, building feature inputs.
    pub(crate) fn input(&self, argument: ResolvedArgument) -> Result<Input, BuildError> {
        Ok(match argument {
            ResolvedArgument::Scalar(value) => Input::Scalar(value),
            ResolvedArgument::Vector(value) => Input::Vector(value),
            ResolvedArgument::Datum(datum) => Input::Datum(datum),
            ResolvedArgument::Keyword(word) => Input::Keyword(word),
            ResolvedArgument::Feature(feature) => Input::Shape(self.build_resolved(&feature)?),
            ResolvedArgument::Selection(selection) => Input::Selection(selection),
        })
    }
}

fn unit(v: DVec3, what: &str) -> Result<DVec3, BuildError> {
    if v.length_squared() == 0.0 || !v.is_finite() {
        return Err(BuildError::Evaluation(format!(
            "{what} must be a finite, non-zero vector"
        )));
    }
    Ok(v.normalize())
}

fn descend(label: &str, result: Rc<BuildResult>, path: &[String]) -> Result<Rc<BuildResult>, BuildError> {
    let mut current = result;
    let mut owner = label.to_string();
    for name in path {
        let next = current
            .sub_results
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::MissingSubResult {
                feature: owner.clone(),
                name: name.clone(),
            })?;
        owner.push('!');
        owner.push_str(name);
        current = next;
    }
    Ok(current)
}
