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

//! Primitive solids.

use crate::registry::{Fallback, FeatureTypeDescriptor, Param, ParamKind};

const BOX: &[Param] = &[
    Param::required("corner", ParamKind::Vector),
    Param::required("size", ParamKind::Vector),
];

const SPHERE: &[Param] = &[
    Param::required("center", ParamKind::Vector),
    Param::required("D", ParamKind::Scalar),
];

const CYLINDER: &[Param] = &[
    Param::required("p0", ParamKind::Vector),
    Param::required("p1", ParamKind::Vector),
    Param::required("D", ParamKind::Scalar),
    Param::optional("Di", ParamKind::Scalar, Fallback::Scalar(0.0)),
];

const CONE: &[Param] = &[
    Param::required("p0", ParamKind::Vector),
    Param::required("p1", ParamKind::Vector),
    Param::required("D0", ParamKind::Scalar),
    Param::required("D1", ParamKind::Scalar),
];

pub(super) const TYPES: &[FeatureTypeDescriptor] = &[
    FeatureTypeDescriptor::new(
        "Box",
        BOX,
        "Axis-aligned box with one corner at `corner` and edge lengths `size`.",
    ),
    FeatureTypeDescriptor::new("Sphere", SPHERE, "Sphere of diameter `D` around `center`."),
    FeatureTypeDescriptor::new(
        "Cylinder",
        CYLINDER,
        "Cylinder from `p0` to `p1` with outer diameter `D`.\n\
         A non-zero inner diameter `Di` makes it a tube.",
    ),
    FeatureTypeDescriptor::new(
        "Cone",
        CONE,
        "Truncated cone from `p0` (diameter `D0`) to `p1` (diameter `D1`).",
    ),
];
