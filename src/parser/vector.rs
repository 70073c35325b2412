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

//! Vector expressions.
//!
//! ```text
//! sum     := term (('+' | '-') term)*
//! term    := factor (('*' | '/') scalar-unary)*
//! factor  := scalar-unary '*' factor | unary
//! unary   := '-' unary | primary
//! primary := '[' s ',' s ',' s ']' | Vector(s, s, s) | cross(v, v)
//!          | normalize(v) | datum '.' part | feature '@' name
//!          | '(' sum ')' | vector-name
//! ```

use crate::ast::{DatumPart, Span, VectorExpr};
use crate::model::SymbolKind;
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{cut, map, opt},
    error::context,
    sequence::{delimited, terminated, tuple},
};
use std::rc::Rc;

use super::utils::{identifier, reject, ws, ws0, ws_char};
use super::{Grammar, PResult, VECTOR};

impl Grammar<'_> {
    pub fn vector<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (mut input, mut expr) = self.vector_term(input)?;
        loop {
            let (next, op) = opt(alt((ws_char('+'), ws_char('-')))).parse(input)?;
            let Some(op) = op else { break };
            let (next, right) = self.vector_term(next)?;
            expr = Rc::new(if op == '+' {
                VectorExpr::Add(expr, right)
            } else {
                VectorExpr::Sub(expr, right)
            });
            input = next;
        }
        Ok((input, expr))
    }

    fn vector_term<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (mut input, mut expr) = self.vector_factor(input)?;
        loop {
            let (next, op) = opt(alt((ws_char('*'), ws_char('/')))).parse(input)?;
            let Some(op) = op else { break };
            let (next, scalar) = self.scalar_unary(next)?;
            expr = Rc::new(if op == '*' {
                VectorExpr::Scale {
                    vector: expr,
                    factor: scalar,
                }
            } else {
                VectorExpr::Divide {
                    vector: expr,
                    divisor: scalar,
                }
            });
            input = next;
        }
        Ok((input, expr))
    }

    /// Scalar factors on the left: `2 * v`, `-s * t * v`.
    fn vector_factor<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        match terminated(|i| self.scalar_unary(i), ws_char('*')).parse(input) {
            Ok((rest, factor)) => match self.vector_factor(rest) {
                Ok((rest, vector)) => {
                    return Ok((rest, Rc::new(VectorExpr::Scale { vector, factor })));
                }
                Err(nom::Err::Error(_)) => {}
                Err(err) => return Err(err),
            },
            Err(nom::Err::Error(_)) => {}
            Err(err) => return Err(err),
        }
        self.vector_unary(input)
    }

    fn vector_unary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        if let Ok((rest, _)) = ws_char('-').parse(input) {
            let (rest, inner) = self.vector_unary(rest)?;
            return Ok((rest, Rc::new(VectorExpr::Neg(inner))));
        }
        self.vector_primary(input)
    }

    pub(super) fn vector_primary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        context(
            VECTOR,
            alt((
                |i| self.vector_literal(i),
                |i| self.vector_call(i),
                |i| self.datum_part(i),
                |i| self.feature_point(i),
                delimited(
                    ws_char('('),
                    |i| self.vector(i),
                    context("')'", ws_char(')')),
                ),
                map(
                    |i| self.symbol(SymbolKind::Vector, i),
                    |name| Rc::new(VectorExpr::Symbol(name)),
                ),
            )),
        )
        .parse(input)
    }

    /// Three comma separated scalars, closed by `close`.
    fn components<'a>(&self, close: char, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let comma = || context("','", ws_char(','));
        let (input, (x, _, y, _, z)) = cut(tuple((
            |i| self.scalar(i),
            comma(),
            |i| self.scalar(i),
            comma(),
            |i| self.scalar(i),
        )))
        .parse(input)?;
        let (input, _) = cut(context(
            if close == ']' { "']'" } else { "')'" },
            ws_char(close),
        ))
        .parse(input)?;
        Ok((input, Rc::new(VectorExpr::Literal([x, y, z]))))
    }

    fn vector_literal<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (input, _) = ws_char('[').parse(input)?;
        self.components(']', input)
    }

    /// `Vector(x, y, z)`, `cross(a, b)`, `normalize(v)`.
    fn vector_call<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        let (rest, _) = ws_char('(').parse(rest)?;
        let (rest, expr) = match name.as_str() {
            "Vector" => return self.components(')', rest),
            "cross" => {
                let (rest, a) = cut(|i| self.vector(i)).parse(rest)?;
                let (rest, _) = cut(context("','", ws_char(','))).parse(rest)?;
                let (rest, b) = cut(|i| self.vector(i)).parse(rest)?;
                (rest, VectorExpr::Cross(a, b))
            }
            "normalize" => map(cut(|i| self.vector(i)), VectorExpr::Normalize).parse(rest)?,
            _ => return reject(start),
        };
        let (rest, _) = cut(context("')'", ws_char(')'))).parse(rest)?;
        Ok((rest, Rc::new(expr)))
    }

    /// `datum.origin`, `axis.direction`, `plane.normal`.
    fn datum_part<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, datum) = self.datum_primary(input)?;
        let Ok((rest, _)) = ws_char('.').parse(rest) else {
            return reject(start);
        };
        let Ok((rest, word)) = ws(identifier).parse(rest) else {
            return reject(start);
        };
        let Some(&(_, part)) = DatumPart::ALL.iter().find(|(name, _)| *name == word) else {
            return reject(start);
        };
        Ok((rest, Rc::new(VectorExpr::DatumPart { datum, part })))
    }

    /// `feature@name`.
    fn feature_point<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<VectorExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, feature) = self.feature(input)?;
        let Ok((rest, _)) = ws_char('@').parse(rest) else {
            return reject(start);
        };
        let (rest, name) = cut(context("reference point name", ws(identifier))).parse(rest)?;
        Ok((rest, Rc::new(VectorExpr::FeaturePoint { feature, name })))
    }
}
