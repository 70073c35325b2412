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

//! Selection expressions.
//!
//! ```text
//! selection := primary (('|' | '-') primary)*
//! primary   := kind '(' feature (',' STRING)? ')' | '(' selection ')' | selection-name
//! kind      := solids | faces | edges | vertices
//! ```

use crate::ast::{SelectionExpr, Span};
use crate::backend::EntityKind;
use crate::model::SymbolKind;
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{cut, map, opt},
    error::context,
    sequence::{delimited, preceded},
};
use std::rc::Rc;

use super::utils::{identifier, reject, string_literal, ws, ws0, ws_char};
use super::{Grammar, PResult, SELECTION};

impl Grammar<'_> {
    pub fn selection<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<SelectionExpr>> {
        let (mut input, mut expr) = self.selection_primary(input)?;
        loop {
            let (next, op) = opt(alt((ws_char('|'), ws_char('-')))).parse(input)?;
            let Some(op) = op else { break };
            let (next, right) = self.selection_primary(next)?;
            expr = Rc::new(if op == '|' {
                SelectionExpr::Union(expr, right)
            } else {
                SelectionExpr::Difference(expr, right)
            });
            input = next;
        }
        Ok((input, expr))
    }

    fn selection_primary<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<SelectionExpr>> {
        context(
            SELECTION,
            alt((
                |i| self.query(i),
                delimited(
                    ws_char('('),
                    |i| self.selection(i),
                    context("')'", ws_char(')')),
                ),
                map(
                    |i| self.symbol(SymbolKind::Selection, i),
                    |name| Rc::new(SelectionExpr::Symbol(name)),
                ),
            )),
        )
        .parse(input)
    }

    /// `edges(F)`, `faces(F, "filter")`, ...
    fn query<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<SelectionExpr>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        let Some(&(_, kind)) = EntityKind::ALL.iter().find(|(word, _)| *word == name) else {
            return reject(start);
        };
        let (rest, _) = ws_char('(').parse(rest)?;
        let (rest, feature) = cut(|i| self.feature(i)).parse(rest)?;
        let (rest, filter) = opt(preceded(
            ws_char(','),
            cut(context("filter string", ws(string_literal))),
        ))
        .parse(rest)?;
        let (rest, _) = cut(context("')'", ws_char(')'))).parse(rest)?;
        let query = SelectionExpr::Query {
            feature,
            kind,
            filter: filter.unwrap_or_default(),
        };
        Ok((rest, Rc::new(query)))
    }
}
