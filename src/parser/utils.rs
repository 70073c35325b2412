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

//! Parser trivia and lexical helpers.

use crate::ast::Span;
use nom::Parser;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, multispace1, satisfy},
    combinator::{map, map_res, not, opt, recognize, value},
    error::{ErrorKind, ParseError, VerboseError, context},
    multi::many0,
    number::complete::recognize_float,
    sequence::{pair, terminated},
};

use super::PResult;

/// Parses a simple double-quoted string literal.
///
/// Escape processing is intentionally minimal: paths and filters are
/// consumed as raw text between quotes.
pub fn string_literal(input: Span<'_>) -> PResult<'_, String> {
    map(
        nom::sequence::delimited(
            char('"'),
            take_while(|c| c != '"' && c != '\n' && c != '\r'),
            context("closing quote", char('"')),
        ),
        |s: Span<'_>| s.fragment().to_string(),
    )
    .parse(input)
}

/// Parses identifiers (`[A-Za-z_][A-Za-z0-9_]*`).
pub fn identifier(input: Span<'_>) -> PResult<'_, String> {
    map(
        recognize(pair(
            take_while1(is_ident_start),
            take_while(is_ident_continue),
        )),
        |s: Span<'_>| s.fragment().to_string(),
    )
    .parse(input)
}

/// Returns whether a char can start an identifier.
fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// Returns whether a char can continue an identifier.
fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

/// Parses a reserved word, surrounded by trivia and not followed by an
/// identifier character.
pub fn keyword<'a>(word: &'static str) -> impl FnMut(Span<'a>) -> PResult<'a, Span<'a>> {
    ws(terminated(tag(word), not(satisfy(is_ident_continue))))
}

/// Parses a floating point literal.
pub(super) fn number(input: Span<'_>) -> PResult<'_, f64> {
    ws(map_res(recognize_float, |s: Span<'_>| {
        s.fragment().parse::<f64>()
    }))
    .parse(input)
}

/// Skips zero-or-more whitespace/comments.
pub(super) fn ws0(input: Span<'_>) -> PResult<'_, ()> {
    // Treat spaces/newlines and comments uniformly as trivia.
    value((), many0(alt((value((), multispace1), comment)))).parse(input)
}

/// Parses line comments (`// ...` and `# ...`).
fn comment(input: Span<'_>) -> PResult<'_, ()> {
    value(
        (),
        alt((
            pair(tag("//"), opt(nom::character::complete::not_line_ending)),
            pair(tag("#"), opt(nom::character::complete::not_line_ending)),
        )),
    )
    .parse(input)
}

/// Wraps a parser with leading/trailing whitespace/comment skipping.
pub(super) fn ws<'a, O, P>(mut parser: P) -> impl FnMut(Span<'a>) -> PResult<'a, O>
where
    P: FnMut(Span<'a>) -> PResult<'a, O>,
{
    move |input| nom::sequence::delimited(ws0, &mut parser, ws0)(input)
}

/// Parses a specific character token with surrounding whitespace/comments.
pub fn ws_char<'a>(c: char) -> impl FnMut(Span<'a>) -> PResult<'a, char> {
    ws(char(c))
}

/// Backtracking failure at `at`.
pub(super) fn reject<'a, O>(at: Span<'a>) -> PResult<'a, O> {
    Err(nom::Err::Error(VerboseError::from_error_kind(
        at,
        ErrorKind::Verify,
    )))
}

/// Runs one alternative of an ordered choice.
///
/// A recoverable error is stored in `furthest` when it got further into the
/// input than the errors seen so far; committed failures propagate.
pub(super) fn attempt<'a, O>(
    result: PResult<'a, O>,
    furthest: &mut Option<VerboseError<Span<'a>>>,
) -> Result<Option<(Span<'a>, O)>, nom::Err<VerboseError<Span<'a>>>> {
    match result {
        Ok(parsed) => Ok(Some(parsed)),
        Err(nom::Err::Error(err)) => {
            if furthest
                .as_ref()
                .is_none_or(|best| error_offset(&err) > error_offset(best))
            {
                *furthest = Some(err);
            }
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Closes an ordered choice whose alternatives all failed.
pub(super) fn exhausted<'a, O>(
    input: Span<'a>,
    furthest: Option<VerboseError<Span<'a>>>,
) -> PResult<'a, O> {
    Err(nom::Err::Error(furthest.unwrap_or_else(|| {
        VerboseError::from_error_kind(input, ErrorKind::Alt)
    })))
}

fn error_offset(err: &VerboseError<Span<'_>>) -> usize {
    err.errors
        .iter()
        .map(|(span, _)| span.location_offset())
        .max()
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_requires_word_boundary() {
        assert!(keyword("as").parse(Span::new(" as \"x\"")).is_ok());
        assert!(keyword("as").parse(Span::new("asset")).is_err());
    }

    #[test]
    fn comments_are_trivia() {
        let (rest, _) = ws0(Span::new("  // note\n # other\n  x")).expect("trivia");
        assert_eq!(*rest.fragment(), "x");
    }

    #[test]
    fn numbers_accept_exponents() {
        let (_, value) = number(Span::new(" 2.5e1 ")).expect("number");
        assert_eq!(value, 25.0);
    }
}
