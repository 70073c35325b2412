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

//! Features derived from existing geometry: edge treatments and sweeps.

use crate::registry::{Fallback, FeatureTypeDescriptor, Param, ParamKind};
use std::f64::consts::TAU;

const FILLET: &[Param] = &[
    Param::required("edges", ParamKind::Selection),
    Param::required("r", ParamKind::Scalar),
];

const CHAMFER: &[Param] = &[
    Param::required("edges", ParamKind::Selection),
    Param::required("d", ParamKind::Scalar),
];

const EXTRUDE_MODES: &[&str] = &["forward", "centered"];

const EXTRUDE: &[Param] = &[
    Param::required("profile", ParamKind::Feature),
    Param::required("direction", ParamKind::Vector),
    Param::optional(
        "mode",
        ParamKind::Keyword(EXTRUDE_MODES),
        Fallback::Keyword("forward"),
    ),
];

const REVOLVE: &[Param] = &[
    Param::required("profile", ParamKind::Feature),
    Param::required("axis", ParamKind::Datum),
    Param::optional("angle", ParamKind::Scalar, Fallback::Scalar(TAU)),
];

pub(super) const TYPES: &[FeatureTypeDescriptor] = &[
    FeatureTypeDescriptor::new(
        "Fillet",
        FILLET,
        "Rounds the selected edges with radius `r`.",
    ),
    FeatureTypeDescriptor::new(
        "Chamfer",
        CHAMFER,
        "Bevels the selected edges by distance `d`.",
    ),
    FeatureTypeDescriptor::new(
        "Extrude",
        EXTRUDE,
        "Sweeps `profile` along `direction`.\n\
         `centered` extends half the distance to each side.",
    ),
    FeatureTypeDescriptor::new(
        "Revolve",
        REVOLVE,
        "Revolves `profile` around `axis` by `angle` radians (full turn by default).",
    ),
];
