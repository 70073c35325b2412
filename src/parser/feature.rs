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

//! Feature expressions, constructor calls, and argument lists.

use crate::ast::{Argument, FeatureRef, SourceSpan, Span};
use crate::diagnostics::CompileErrorKind;
use crate::model::{Feature, SymbolKind};
use crate::registry::{Arity, FeatureTypeDescriptor, ParamKind, is_reserved};
use nom::Parser;
use nom::{
    branch::alt,
    combinator::{cut, map, opt},
    error::{ContextError, ErrorKind, ParseError, VerboseError, context},
    sequence::{delimited, preceded},
};
use std::rc::Rc;

use super::utils::{identifier, reject, ws, ws0, ws_char};
use super::{FEATURE, Grammar, PResult};

impl Grammar<'_> {
    /// Parses a feature expression followed by any number of `!name`
    /// sub-result accesses.
    pub fn feature<'a>(&self, input: Span<'a>) -> PResult<'a, FeatureRef> {
        let (mut input, mut feature) = context(FEATURE, |i| self.feature_primary(i)).parse(input)?;
        loop {
            let (next, sub) = opt(preceded(ws_char('!'), ws(identifier))).parse(input)?;
            let Some(name) = sub else { break };
            feature = FeatureRef::Sub {
                base: Box::new(feature),
                name,
            };
            input = next;
        }
        Ok((input, feature))
    }

    fn feature_primary<'a>(&self, input: Span<'a>) -> PResult<'a, FeatureRef> {
        alt((
            map(|i| self.constructor(i), FeatureRef::Inline),
            delimited(ws_char('('), |i| self.feature(i), ws_char(')')),
            |i| self.feature_name(i),
        ))
        .parse(input)
    }

    /// Feature names may refer to bindings declared later in the script.
    fn feature_name<'a>(&self, input: Span<'a>) -> PResult<'a, FeatureRef> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        if is_reserved(&name) || self.registry.contains(&name) {
            return reject(start);
        }
        match self.model.kind_of(&name) {
            None | Some(SymbolKind::Feature) => {}
            Some(_) => return reject(start),
        }
        let (rest, _) = ws0(rest)?;
        Ok((rest, FeatureRef::Named(name)))
    }

    /// Parses `Type(arguments)` for a registered feature type.
    ///
    /// The call commits once `Type(` has matched. Unregistered names that are
    /// not reserved words are reported as unknown feature types.
    pub fn constructor<'a>(&self, input: Span<'a>) -> PResult<'a, Rc<Feature>> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (after_name, name) = identifier(input)?;
        let (after_paren, _) = ws_char('(').parse(after_name)?;
        let descriptor = match self.registry.lookup(&name) {
            Ok(descriptor) => descriptor,
            Err(_) if is_reserved(&name) => return reject(start),
            Err(err) => {
                return self.fail(
                    start,
                    after_name,
                    CompileErrorKind::UnknownFeatureType,
                    err.to_string(),
                );
            }
        };

        let (input, arguments) =
            cut(|i| (descriptor.grammar)(self, descriptor, i)).parse(after_paren)?;
        let (input, _) = cut(context("')'", ws_char(')'))).parse(input)?;
        match (descriptor.factory)(descriptor, arguments) {
            Ok(feature) => {
                let span = SourceSpan::from_bounds(start, input);
                Ok((input, Rc::new(feature.with_span(span))))
            }
            Err(message) => self.fail(
                start,
                input,
                CompileErrorKind::Syntax,
                format!("Invalid arguments for {}: {message}", descriptor.name),
            ),
        }
    }

    /// Parses one argument of the given kind.
    pub fn argument<'a>(&self, kind: &ParamKind, input: Span<'a>) -> PResult<'a, Argument> {
        match kind {
            ParamKind::Scalar => map(|i| self.scalar(i), Argument::Scalar).parse(input),
            ParamKind::Vector => map(|i| self.vector(i), Argument::Vector).parse(input),
            ParamKind::Datum => map(|i| self.datum(i), Argument::Datum).parse(input),
            ParamKind::Feature => map(|i| self.feature(i), Argument::Feature).parse(input),
            ParamKind::Selection => map(|i| self.selection(i), Argument::Selection).parse(input),
            ParamKind::Keyword(choices) => {
                map(|i| self.option_word(choices, i), Argument::Keyword).parse(input)
            }
        }
    }

    /// Parses one of a fixed set of bare words.
    fn option_word<'a>(&self, choices: &[&str], input: Span<'a>) -> PResult<'a, String> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, word) = match identifier(input) {
            Ok(parsed) => parsed,
            Err(_) => return option_error(start),
        };
        if !choices.contains(&word.as_str()) {
            return option_error(start);
        }
        let (rest, _) = ws0(rest)?;
        Ok((rest, word))
    }
}

fn option_error<O>(at: Span<'_>) -> PResult<'_, O> {
    Err(nom::Err::Error(VerboseError::add_context(
        at,
        "option word",
        VerboseError::from_error_kind(at, ErrorKind::Tag),
    )))
}

/// Default argument production: parses the comma separated arguments the
/// descriptor's parameter list declares.
///
/// An omitted optional parameter ends the list, so later optional
/// parameters are omitted too. A variadic parameter takes at least its
/// minimum number of arguments.
pub fn signature_arguments<'a>(
    g: &Grammar<'_>,
    descriptor: &FeatureTypeDescriptor,
    mut input: Span<'a>,
) -> PResult<'a, Vec<Argument>> {
    let mut arguments = Vec::new();
    'params: for param in descriptor.parameters {
        let (min, max) = match param.arity {
            Arity::Required => (1, 1),
            Arity::Optional(_) => (0, 1),
            Arity::Variadic(min) => (min, usize::MAX),
        };
        let mut count = 0;
        while count < max {
            let mandatory = count < min;
            let mut at = input;
            if !arguments.is_empty() {
                match ws_char(',').parse(input) {
                    Ok((next, _)) => at = next,
                    Err(nom::Err::Error(_)) if !mandatory => break 'params,
                    Err(nom::Err::Error(_)) => {
                        return g.fail(
                            input,
                            input,
                            CompileErrorKind::Syntax,
                            format!(
                                "Syntax error: {} expects argument '{}'",
                                descriptor.name,
                                param.usage()
                            ),
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
            match g.argument(&param.kind, at) {
                Ok((next, argument)) => {
                    arguments.push(argument);
                    input = next;
                    count += 1;
                }
                Err(nom::Err::Error(_)) if !mandatory && arguments.is_empty() => break 'params,
                Err(err) => return Err(err),
            }
        }
    }
    Ok((input, arguments))
}
