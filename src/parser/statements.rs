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

//! Statement parsers.

use crate::ast::{FeatureRef, SourceSpan, Span};
use crate::diagnostics::CompileErrorKind;
use crate::model::BoundValue;
use crate::registry::is_reserved;
use nom::Parser;
use nom::{
    combinator::{cut, map, opt},
    error::{VerboseError, context},
    sequence::{preceded, terminated},
};

use super::utils::{attempt, exhausted, identifier, keyword, string_literal, ws, ws0, ws_char};
use super::{Grammar, PResult};

/// One leading `import "path";` declaration.
#[derive(Debug, Clone)]
pub(crate) struct ImportDecl {
    pub(crate) path: String,
    pub(crate) span: SourceSpan,
}

/// One parsed statement.
pub(super) enum Statement {
    Binding { name: String, value: BoundValue },
    Export { feature: FeatureRef, path: Option<String> },
}

/// Parses one import declaration (`import "path";`).
pub(super) fn import_decl(input: Span<'_>) -> PResult<'_, ImportDecl> {
    let (input, _) = ws0(input)?;
    let start = input;
    let (input, _) = keyword("import").parse(input)?;
    let (input, path) = cut(context("import path", ws(string_literal))).parse(input)?;
    let (input, _) = cut(context("';'", ws_char(';'))).parse(input)?;
    let span = SourceSpan::from_bounds(start, input);
    Ok((input, ImportDecl { path, span }))
}

fn semicolon<'a>() -> impl FnMut(Span<'a>) -> PResult<'a, char> {
    context("';'", ws_char(';'))
}

impl Grammar<'_> {
    /// Parses one binding or export statement.
    pub(super) fn statement<'a>(&self, input: Span<'a>) -> PResult<'a, Statement> {
        if let Ok((rest, _)) = keyword("export").parse(input) {
            return cut(|i| self.export_body(i)).parse(rest);
        }
        self.binding(input)
    }

    fn export_body<'a>(&self, input: Span<'a>) -> PResult<'a, Statement> {
        let (input, feature) = self.feature(input)?;
        let (input, path) = opt(preceded(
            keyword("as"),
            cut(context("output path", ws(string_literal))),
        ))
        .parse(input)?;
        let (input, _) = semicolon().parse(input)?;
        Ok((input, Statement::Export { feature, path }))
    }

    /// Parses `name = value;`.
    fn binding<'a>(&self, input: Span<'a>) -> PResult<'a, Statement> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (input, name) = context("statement", identifier).parse(input)?;
        let name_end = input;
        let (input, _) = context("'='", ws_char('=')).parse(input)?;
        if is_reserved(&name) || self.registry.contains(&name) {
            return self.fail(
                start,
                name_end,
                CompileErrorKind::ReservedName,
                format!("'{name}' is reserved and cannot be bound"),
            );
        }
        if let Some(previous) = self.model.binding(&name) {
            return self.fail(
                start,
                name_end,
                CompileErrorKind::DuplicateSymbol,
                format!(
                    "Duplicate symbol '{name}' (first bound at {}:{})",
                    previous.file, previous.span.line
                ),
            );
        }
        let (input, value) = cut(|i| self.bound_value(i)).parse(input)?;
        Ok((input, Statement::Binding { name, value }))
    }

    /// Right-hand side of a binding, tried as feature, selection, datum,
    /// vector, then scalar. Each alternative must reach the closing `;`.
    fn bound_value<'a>(&self, input: Span<'a>) -> PResult<'a, BoundValue> {
        let mut furthest: Option<VerboseError<Span<'a>>> = None;

        let mut feature = map(terminated(|i| self.feature(i), semicolon()), BoundValue::Feature);
        if let Some(parsed) = attempt(feature.parse(input), &mut furthest)? {
            return Ok(parsed);
        }
        let mut selection = map(terminated(|i| self.selection(i), semicolon()), BoundValue::Selection);
        if let Some(parsed) = attempt(selection.parse(input), &mut furthest)? {
            return Ok(parsed);
        }
        let mut datum = map(terminated(|i| self.datum(i), semicolon()), BoundValue::Datum);
        if let Some(parsed) = attempt(datum.parse(input), &mut furthest)? {
            return Ok(parsed);
        }
        let mut vector = map(terminated(|i| self.vector(i), semicolon()), BoundValue::Vector);
        if let Some(parsed) = attempt(vector.parse(input), &mut furthest)? {
            return Ok(parsed);
        }
        let mut scalar = map(terminated(|i| self.scalar(i), semicolon()), BoundValue::Scalar);
        if let Some(parsed) = attempt(scalar.parse(input), &mut furthest)? {
            return Ok(parsed);
        }
        exhausted(input, furthest)
    }
}
