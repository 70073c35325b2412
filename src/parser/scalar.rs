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

//! Scalar expressions.
//!
//! ```text
//! sum     := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := '-' unary | power
//! power   := primary ('^' unary)?
//! primary := number | call | vector '.' (x|y|z) | '(' sum ')'
//!          | feature '$' name | scalar-name
//! ```

use crate::ast::{BinOp, Component, ScalarExpr, ScalarFn, Span};
use crate::model::SymbolKind;
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{cut, map, opt},
    error::context,
    sequence::{delimited, separated_pair},
};
use std::rc::Rc;

use super::utils::{identifier, number, reject, ws, ws0, ws_char};
use super::{Grammar, PResult, SCALAR};

fn binary(op: BinOp, left: Rc<ScalarExpr>, right: Rc<ScalarExpr>) -> Rc<ScalarExpr> {
    Rc::new(ScalarExpr::Binary { op, left, right })
}

impl Grammar<'_> {
    pub fn scalar<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        let (mut input, mut expr) = self.scalar_term(input)?;
        loop {
            let (next, op) = opt(alt((ws_char('+'), ws_char('-')))).parse(input)?;
            let Some(op) = op else { break };
            let (next, right) = self.scalar_term(next)?;
            let op = if op == '+' { BinOp::Add } else { BinOp::Sub };
            expr = binary(op, expr, right);
            input = next;
        }
        Ok((input, expr))
    }

    fn scalar_term<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        let (mut input, mut expr) = self.scalar_unary(input)?;
        loop {
            let (next, op) = opt(alt((ws_char('*'), ws_char('/')))).parse(input)?;
            let Some(op) = op else { break };
            let (next, right) = self.scalar_unary(next)?;
            let op = if op == '*' { BinOp::Mul } else { BinOp::Div };
            expr = binary(op, expr, right);
            input = next;
        }
        Ok((input, expr))
    }

    pub(super) fn scalar_unary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        if let Ok((rest, _)) = ws_char('-').parse(input) {
            let (rest, inner) = self.scalar_unary(rest)?;
            return Ok((rest, Rc::new(ScalarExpr::Neg(inner))));
        }
        let (input, base) = self.scalar_primary(input)?;
        let (input, exponent) = opt(ws_char('^')).parse(input)?;
        if exponent.is_none() {
            return Ok((input, base));
        }
        // Right associative: `2^-1`, `a^b^c`.
        let (input, exponent) = self.scalar_unary(input)?;
        Ok((input, binary(BinOp::Pow, base, exponent)))
    }

    fn scalar_primary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        context(
            SCALAR,
            alt((
                map(number, |value| Rc::new(ScalarExpr::Literal(value))),
                |i| self.scalar_call(i),
                |i| self.component(i),
                delimited(
                    ws_char('('),
                    |i| self.scalar(i),
                    context("')'", ws_char(')')),
                ),
                |i| self.feature_value(i),
                map(
                    |i| self.symbol(SymbolKind::Scalar, i),
                    |name| Rc::new(ScalarExpr::Symbol(name)),
                ),
            )),
        )
        .parse(input)
    }

    /// `sin(s)` and friends, `dot(v, v)`, `mag(v)`.
    fn scalar_call<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        let (rest, _) = ws_char('(').parse(rest)?;
        let (rest, expr) = match name.as_str() {
            "dot" => map(
                cut(separated_pair(
                    |i| self.vector(i),
                    context("','", ws_char(',')),
                    |i| self.vector(i),
                )),
                |(a, b)| ScalarExpr::Dot(a, b),
            )
            .parse(rest)?,
            "mag" => map(cut(|i| self.vector(i)), ScalarExpr::Magnitude).parse(rest)?,
            _ => {
                let Some(&(_, func)) = ScalarFn::ALL.iter().find(|(word, _)| *word == name) else {
                    return reject(start);
                };
                map(cut(|i| self.scalar(i)), |arg| ScalarExpr::Call { func, arg }).parse(rest)?
            }
        };
        let (rest, _) = cut(context("')'", ws_char(')'))).parse(rest)?;
        Ok((rest, Rc::new(expr)))
    }

    /// `vector.x`, `vector.y`, `vector.z`.
    fn component<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, vector) = self.vector_primary(input)?;
        let Ok((rest, _)) = ws_char('.').parse(rest) else {
            return reject(start);
        };
        let (rest, word) = ws(identifier).parse(rest)?;
        let component = match word.as_str() {
            "x" => Component::X,
            "y" => Component::Y,
            "z" => Component::Z,
            _ => return reject(start),
        };
        Ok((rest, Rc::new(ScalarExpr::Component { vector, component })))
    }

    /// `feature$name`.
    fn feature_value<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<ScalarExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, feature) = self.feature(input)?;
        let Ok((rest, _)) = ws_char('$').parse(rest) else {
            return reject(start);
        };
        let (rest, name) = cut(context("reference value name", ws(identifier))).parse(rest)?;
        Ok((rest, Rc::new(ScalarExpr::FeatureValue { feature, name })))
    }
}
