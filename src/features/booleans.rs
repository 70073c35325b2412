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

//! Boolean combinations of solids.

use crate::registry::{FeatureTypeDescriptor, Param, ParamKind};

const UNION: &[Param] = &[Param::variadic("operands", ParamKind::Feature, 2)];

const SUBTRACT: &[Param] = &[
    Param::required("base", ParamKind::Feature),
    Param::required("tool", ParamKind::Feature),
];

const INTERSECTION: &[Param] = &[
    Param::required("a", ParamKind::Feature),
    Param::required("b", ParamKind::Feature),
];

const COMPOUND: &[Param] = &[Param::variadic("parts", ParamKind::Feature, 1)];

pub(super) const TYPES: &[FeatureTypeDescriptor] = &[
    FeatureTypeDescriptor::new("Union", UNION, "Fuses two or more solids."),
    FeatureTypeDescriptor::new("Subtract", SUBTRACT, "Removes `tool` from `base`."),
    FeatureTypeDescriptor::new(
        "Intersection",
        INTERSECTION,
        "Keeps the volume common to `a` and `b`.",
    ),
    FeatureTypeDescriptor::new(
        "Compound",
        COMPOUND,
        "Groups shapes without fusing them.",
    ),
];
