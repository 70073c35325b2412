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

//! Rigid and scaling transforms.

use crate::ast::{Argument, DatumExpr, Span};
use crate::diagnostics::CompileErrorKind;
use crate::model::{BoundValue, Feature, Model};
use crate::parser::{Grammar, PResult, ws_char};
use crate::registry::{FeatureTypeDescriptor, Param, ParamKind, bind_arguments};
use nom::Parser;
use nom::{combinator::peek, error::context, sequence::terminated};

const TRANSLATE: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("delta", ParamKind::Vector),
];

const ROTATE: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("axis", ParamKind::Datum),
    Param::required("angle", ParamKind::Scalar),
];

const MIRROR: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("plane", ParamKind::Datum),
];

const SCALE: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("factor", ParamKind::Scalar),
];

const PLACE_ON_PLANE: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("plane", ParamKind::Datum),
];

const PLACE_IN_FRAME: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("origin", ParamKind::Vector),
    Param::required("ex", ParamKind::Vector),
    Param::required("ez", ParamKind::Vector),
];

/// Kind of a datum after following symbol bindings; `None` when unbound.
fn datum_kind(model: &Model, datum: &DatumExpr) -> Option<&'static str> {
    let mut current = datum;
    // Bounded by the binding count so alias cycles cannot loop.
    for _ in 0..=model.bindings().len() {
        match current {
            DatumExpr::Point(_) => return Some("point"),
            DatumExpr::Axis { .. } => return Some("axis"),
            DatumExpr::Plane { .. } => return Some("plane"),
            DatumExpr::Symbol(name) => match model.binding(name).map(|b| &b.value) {
                Some(BoundValue::Datum(inner)) => current = inner,
                _ => return None,
            },
        }
    }
    None
}

/// `Place(base, plane)` or `Place(base, origin, ex, ez)`.
fn place_arguments<'a>(
    g: &Grammar<'_>,
    _descriptor: &FeatureTypeDescriptor,
    input: Span<'a>,
) -> PResult<'a, Vec<Argument>> {
    let (input, base) = context("feature", |i| g.feature(i)).parse(input)?;
    let (input, _) = context("','", ws_char(',')).parse(input)?;
    let datum_start = input;

    // The datum form only applies when the datum closes the argument list.
    match terminated(|i| g.datum(i), peek(ws_char(')'))).parse(input) {
        Ok((rest, plane)) => {
            if let Some(kind) = datum_kind(g.model(), &plane).filter(|kind| *kind != "plane") {
                return g.fail(
                    datum_start,
                    rest,
                    CompileErrorKind::Syntax,
                    format!("Syntax error: Place expects a plane datum, found {kind}"),
                );
            }
            return Ok((rest, vec![Argument::Feature(base), Argument::Datum(plane)]));
        }
        Err(nom::Err::Error(_)) => {}
        Err(err) => return Err(err),
    }

    let (input, origin) = context("origin vector", |i| g.vector(i)).parse(input)?;
    let (input, _) = context("','", ws_char(',')).parse(input)?;
    let (input, ex) = context("x direction", |i| g.vector(i)).parse(input)?;
    let (input, _) = context("','", ws_char(',')).parse(input)?;
    let (input, ez) = context("z direction", |i| g.vector(i)).parse(input)?;
    Ok((
        input,
        vec![
            Argument::Feature(base),
            Argument::Vector(origin),
            Argument::Vector(ex),
            Argument::Vector(ez),
        ],
    ))
}

fn place_factory(
    descriptor: &FeatureTypeDescriptor,
    arguments: Vec<Argument>,
) -> Result<Feature, String> {
    let parameters = if arguments.len() == PLACE_ON_PLANE.len() {
        if let Some(Argument::Datum(datum)) = arguments.get(1) {
            let found = match datum.as_ref() {
                DatumExpr::Point(_) => Some("point"),
                DatumExpr::Axis { .. } => Some("axis"),
                DatumExpr::Plane { .. } | DatumExpr::Symbol(_) => None,
            };
            if let Some(found) = found {
                return Err(format!("Place expects a plane datum, found {found}"));
            }
        }
        PLACE_ON_PLANE
    } else {
        PLACE_IN_FRAME
    };
    let arguments = bind_arguments(parameters, arguments)?;
    Ok(Feature::new(descriptor.name, parameters, arguments))
}

pub(super) const TYPES: &[FeatureTypeDescriptor] = &[
    FeatureTypeDescriptor::new("Translate", TRANSLATE, "Moves `base` by `delta`."),
    FeatureTypeDescriptor::new(
        "Rotate",
        ROTATE,
        "Rotates `base` around `axis` by `angle` radians.",
    ),
    FeatureTypeDescriptor::new("Mirror", MIRROR, "Reflects `base` through `plane`."),
    FeatureTypeDescriptor::new(
        "Scale",
        SCALE,
        "Scales `base` uniformly about the origin.",
    ),
    FeatureTypeDescriptor::new(
        "Place",
        PLACE_ON_PLANE,
        "Moves `base` from the global frame into a local frame.\n\
         Also accepts `Place(base: feature, origin: vector, ex: vector, ez: vector)`.",
    )
    .with_grammar(place_arguments)
    .with_factory(place_factory),
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn place_factory_picks_signature_by_arity() {
        let descriptor = &TYPES[4];
        let on_plane = place_factory(
            descriptor,
            vec![
                Argument::feature("b"),
                Argument::Datum(Rc::new(DatumExpr::Symbol("pl".into()))),
            ],
        )
        .expect("plane form");
        assert_eq!(on_plane.parameters().len(), 2);

        let in_frame = place_factory(
            descriptor,
            vec![
                Argument::feature("b"),
                Argument::vector(0.0, 0.0, 0.0),
                Argument::vector(1.0, 0.0, 0.0),
                Argument::vector(0.0, 0.0, 1.0),
            ],
        )
        .expect("frame form");
        assert_eq!(in_frame.parameters()[3].name, "ez");

        assert!(place_factory(descriptor, vec![Argument::feature("b")]).is_err());
    }

    #[test]
    fn place_factory_rejects_non_plane_literals() {
        let descriptor = &TYPES[4];
        let origin = match Argument::vector(0.0, 0.0, 0.0) {
            Argument::Vector(v) => v,
            _ => unreachable!(),
        };
        let err = place_factory(
            descriptor,
            vec![
                Argument::feature("b"),
                Argument::Datum(Rc::new(DatumExpr::Point(origin))),
            ],
        )
        .expect_err("point is not a plane");
        assert!(err.contains("found point"), "{err}");
    }
}
