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

//! Recording backend.
//!
//! [`SymbolicBackend`] performs no geometry. Each build yields a
//! [`SymbolicShape`] holding the construction term (`Box([0, 0, 0], [1, 1, 1])`)
//! and a nominal entity count per [`EntityKind`], which is enough to drive the
//! engine, selections, and reference lookups in tests and dry runs.

use super::{
    BackendError, BackendResult, BuildRequest, BuildResult, EntityKind, GeometryBackend, Input,
    Shape,
};
use glam::DVec3;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

/// Shape payload produced by [`SymbolicBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicShape {
    pub feature_type: String,
    /// Construction term with resolved inputs.
    pub term: String,
    counts: [u32; 4],
}

impl SymbolicShape {
    /// Number of addressable entities of `kind`.
    pub fn count(&self, kind: EntityKind) -> u32 {
        self.counts[slot(kind)]
    }
}

fn slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Solid => 0,
        EntityKind::Face => 1,
        EntityKind::Edge => 2,
        EntityKind::Vertex => 3,
    }
}

/// Backend that records constructions as terms.
#[derive(Debug, Default)]
pub struct SymbolicBackend {
    failing: BTreeSet<String>,
    builds: Cell<usize>,
    log: RefCell<Vec<String>>,
}

impl SymbolicBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every build of `feature_type` fail.
    pub fn failing_on(mut self, feature_type: impl Into<String>) -> Self {
        self.failing.insert(feature_type.into());
        self
    }

    /// Number of `build` invocations so far.
    pub fn build_count(&self) -> usize {
        self.builds.get()
    }

    /// Labels of the built features, in invocation order.
    pub fn build_log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

fn vec_term(v: DVec3) -> String {
    format!("[{}, {}, {}]", v.x, v.y, v.z)
}

fn input_term(input: &Input) -> String {
    match input {
        Input::Scalar(value) => format!("{value}"),
        Input::Vector(v) => vec_term(*v),
        Input::Datum(datum) => match *datum {
            super::Datum::Point(p) => format!("Point({})", vec_term(p)),
            super::Datum::Axis { origin, direction } => {
                format!("Axis({}, {})", vec_term(origin), vec_term(direction))
            }
            super::Datum::Plane { origin, normal } => {
                format!("Plane({}, {})", vec_term(origin), vec_term(normal))
            }
        },
        Input::Keyword(word) => word.clone(),
        Input::Shape(result) => match result.shape.downcast_ref::<SymbolicShape>() {
            Some(shape) => shape.term.clone(),
            None => "<shape>".to_string(),
        },
        Input::Selection(selection) => {
            let ids: Vec<String> = selection.ids.iter().map(u32::to_string).collect();
            format!("{}{{{}}}", selection.kind.name(), ids.join(","))
        }
    }
}

/// Nominal topology of a construction.
fn entity_counts(feature_type: &str, inputs: &[Input]) -> [u32; 4] {
    match feature_type {
        "Box" => [1, 6, 12, 8],
        "Sphere" => [1, 1, 1, 2],
        "Cylinder" | "Cone" => [1, 3, 3, 2],
        _ => {
            let mut counts = [0u32; 4];
            for input in inputs {
                let result = match input {
                    Input::Shape(result) => result,
                    Input::Selection(selection) => &selection.shape,
                    _ => continue,
                };
                if let Some(shape) = result.shape.downcast_ref::<SymbolicShape>() {
                    for (total, count) in counts.iter_mut().zip(shape.counts) {
                        *total = total.saturating_add(count);
                    }
                }
            }
            counts[0] = counts[0].max(1);
            counts
        }
    }
}

fn check_feasible(request: &BuildRequest<'_>) -> BackendResult<()> {
    for (index, input) in request.inputs.iter().enumerate() {
        let Input::Scalar(value) = input else { continue };
        let name = request.parameter_name(index);
        if !value.is_finite() {
            return Err(BackendError::Infeasible(format!(
                "{} '{}': {name} is not finite",
                request.feature_type, request.label
            )));
        }
        if name == "D" && *value <= 0.0 {
            return Err(BackendError::Infeasible(format!(
                "{} '{}': diameter must be positive, got {value}",
                request.feature_type, request.label
            )));
        }
    }
    Ok(())
}

/// Parses `""` (all), `"none"`, or a comma separated id list.
fn parse_filter(filter: &str, count: u32) -> BackendResult<BTreeSet<u32>> {
    let filter = filter.trim();
    if filter.is_empty() {
        return Ok((0..count).collect());
    }
    if filter == "none" {
        return Ok(BTreeSet::new());
    }
    filter
        .split(',')
        .map(|part| {
            let id: u32 = part
                .trim()
                .parse()
                .map_err(|_| BackendError::InvalidFilter(format!("'{}' is not an id", part.trim())))?;
            if id >= count {
                return Err(BackendError::InvalidFilter(format!(
                    "id {id} out of range (0..{count})"
                )));
            }
            Ok(id)
        })
        .collect()
}

impl GeometryBackend for SymbolicBackend {
    fn name(&self) -> &str {
        "symbolic"
    }

    fn build(&self, request: &BuildRequest<'_>) -> BackendResult<BuildResult> {
        self.builds.set(self.builds.get() + 1);
        self.log.borrow_mut().push(request.label.to_string());

        if self.failing.contains(request.feature_type) {
            return Err(BackendError::OperationFailed(format!(
                "{} '{}' rejected by backend",
                request.feature_type, request.label
            )));
        }
        check_feasible(request)?;

        let terms: Vec<String> = request.inputs.iter().map(input_term).collect();
        let shape = SymbolicShape {
            feature_type: request.feature_type.to_string(),
            term: format!("{}({})", request.feature_type, terms.join(", ")),
            counts: entity_counts(request.feature_type, request.inputs),
        };

        let mut result = BuildResult::new(Shape::new(shape));
        for (index, input) in request.inputs.iter().enumerate() {
            let name = request.parameter_name(index);
            result = match input {
                Input::Scalar(value) => result.with_value(name, *value),
                Input::Vector(v) => result.with_point(name, *v),
                Input::Datum(datum) => result.with_point(name, datum.origin()),
                Input::Shape(shape) => result.with_sub_result(name, shape.clone()),
                Input::Keyword(_) | Input::Selection(_) => result,
            };
        }
        Ok(result)
    }

    fn select(
        &self,
        result: &BuildResult,
        kind: EntityKind,
        filter: &str,
    ) -> BackendResult<BTreeSet<u32>> {
        let shape = result.shape.downcast_ref::<SymbolicShape>().ok_or_else(|| {
            BackendError::OperationFailed("shape was not built by the symbolic backend".into())
        })?;
        parse_filter(filter, shape.count(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn box_result() -> BuildResult {
        let shape = SymbolicShape {
            feature_type: "Box".into(),
            term: "Box()".into(),
            counts: [1, 6, 12, 8],
        };
        BuildResult::new(Shape::new(shape))
    }

    #[test]
    fn filters_select_listed_ids() {
        let backend = SymbolicBackend::new();
        let result = box_result();
        let ids = backend
            .select(&result, EntityKind::Edge, "0, 2")
            .expect("valid filter");
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(
            backend.select(&result, EntityKind::Face, "").expect("all").len(),
            6
        );
        assert!(
            backend
                .select(&result, EntityKind::Vertex, "none")
                .expect("none")
                .is_empty()
        );
    }

    #[test]
    fn filters_reject_out_of_range_ids() {
        let backend = SymbolicBackend::new();
        let err = backend
            .select(&box_result(), EntityKind::Face, "6")
            .expect_err("face 6 does not exist");
        assert!(matches!(err, BackendError::InvalidFilter(_)));
    }

    #[test]
    fn combined_counts_saturate() {
        let huge = SymbolicShape {
            feature_type: "Union".into(),
            term: "Union()".into(),
            counts: [1, u32::MAX, u32::MAX - 1, 8],
        };
        let huge = Input::Shape(Rc::new(BuildResult::new(Shape::new(huge))));
        let boxed = Input::Shape(Rc::new(box_result()));
        let counts = entity_counts("Union", &[huge, boxed, Input::Scalar(1.0)]);
        assert_eq!(counts, [2, u32::MAX, u32::MAX, 16]);
    }
}
