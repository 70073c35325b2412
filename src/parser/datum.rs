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

//! Datum expressions: `Point(v)`, `Axis(origin, direction)`,
//! `Plane(origin, normal)`, parenthesized datums and datum names.

use crate::ast::{DatumExpr, Span};
use crate::model::SymbolKind;
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{cut, map},
    error::context,
    sequence::{delimited, separated_pair},
};
use std::rc::Rc;

use super::utils::{identifier, reject, ws0, ws_char};
use super::{DATUM, Grammar, PResult};

impl Grammar<'_> {
    pub fn datum<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<DatumExpr>> {
        self.datum_primary(input)
    }

    pub(super) fn datum_primary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<DatumExpr>> {
        context(
            DATUM,
            alt((
                |i| self.datum_call(i),
                delimited(
                    ws_char('('),
                    |i| self.datum_primary(i),
                    context("')'", ws_char(')')),
                ),
                map(
                    |i| self.symbol(SymbolKind::Datum, i),
                    |name| Rc::new(DatumExpr::Symbol(name)),
                ),
            )),
        )
        .parse(input)
    }

    fn datum_call<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<DatumExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        let (rest, _) = ws_char('(').parse(rest)?;
        let pair = |rest: Span<'a>| {
            cut(separated_pair(
                |i| self.vector(i),
                context("','", ws_char(',')),
                |i| self.vector(i),
            ))
            .parse(rest)
        };
        let (rest, datum) = match name.as_str() {
            "Point" => map(cut(|i| self.vector(i)), DatumExpr::Point).parse(rest)?,
            "Axis" => {
                let (rest, (origin, direction)) = pair(rest)?;
                (rest, DatumExpr::Axis { origin, direction })
            }
            "Plane" => {
                let (rest, (origin, normal)) = pair(rest)?;
                (rest, DatumExpr::Plane { origin, normal })
            }
            _ => return reject(start),
        };
        let (rest, _) = cut(context("')'", ws_char(')'))).parse(rest)?;
        Ok((rest, Rc::new(datum)))
    }
}
