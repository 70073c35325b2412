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

//! `nom` grammar for feature scripts.
//!
//! The grammar is composed at run time. [`Grammar`] carries the shared
//! sub-grammars (scalar, vector, datum, selection, and feature expressions)
//! and every registered feature type contributes the production for its own
//! argument list (see [`ArgumentGrammar`]). Adding a feature type never
//! touches the shared sub-grammars.
//!
//! Statements:
//! - leading `import "path";` declarations
//! - `name = value;` bindings of features, selections, datums, vectors or scalars
//! - `export feature (as "path")?;` output requests
//!
//! A constructor commits once its type name and `(` have matched; later
//! mismatches are reported where they occur instead of trying other
//! alternatives.

mod datum;
mod feature;
mod scalar;
mod selection;
mod statements;
mod utils;
mod vector;

use crate::ast::{Argument, SourceSpan, Span};
use crate::diagnostics::{CompileError, CompileErrorKind};
use crate::model::{Binding, Model, OutputRequest, SymbolKind};
use crate::registry::{FeatureRegistry, FeatureTypeDescriptor, is_reserved};
use nom::Parser;
use nom::{
    IResult,
    error::{ErrorKind, ParseError, VerboseError, VerboseErrorKind},
};
use std::cell::RefCell;

pub use feature::signature_arguments;
pub(crate) use statements::ImportDecl;
pub use utils::{identifier, keyword, string_literal, ws_char};

use self::statements::{Statement, import_decl};
use self::utils::{reject, ws0};

/// Parser result over located spans with verbose errors.
pub type PResult<'a, O> = IResult<Span<'a>, O, VerboseError<Span<'a>>>;

/// Argument production a feature type contributes to the grammar.
///
/// It parses everything between the constructor's parentheses.
pub type ArgumentGrammar = for<'a> fn(
    &Grammar<'_>,
    &FeatureTypeDescriptor,
    Span<'a>,
) -> PResult<'a, Vec<Argument>>;

// Context labels of the value sub-grammars.
const SCALAR: &str = "scalar expression";
const VECTOR: &str = "vector expression";
const DATUM: &str = "datum";
const SELECTION: &str = "selection";
const FEATURE: &str = "feature";

/// Diagnostic recorded next to a committed failure.
struct Pending {
    kind: CompileErrorKind,
    message: String,
    span: SourceSpan,
}

/// Shared grammar handle passed to every feature production.
///
/// Name references are checked against the symbol table: scalar, vector,
/// datum and selection names must already be bound with the matching kind,
/// feature names may refer forward.
pub struct Grammar<'r> {
    registry: &'r FeatureRegistry,
    model: &'r Model,
    pending: RefCell<Option<Pending>>,
}

impl<'r> Grammar<'r> {
    pub fn new(registry: &'r FeatureRegistry, model: &'r Model) -> Self {
        Self {
            registry,
            model,
            pending: RefCell::new(None),
        }
    }

    pub fn registry(&self) -> &'r FeatureRegistry {
        self.registry
    }

    pub fn model(&self) -> &'r Model {
        self.model
    }

    /// Fails with a diagnostic that is reported verbatim.
    pub fn fail<'a, O>(
        &self,
        start: Span<'a>,
        end: Span<'a>,
        kind: CompileErrorKind,
        message: String,
    ) -> PResult<'a, O> {
        self.pending.replace(Some(Pending {
            kind,
            message,
            span: SourceSpan::from_bounds(start, end),
        }));
        Err(nom::Err::Failure(VerboseError::from_error_kind(
            start,
            ErrorKind::Verify,
        )))
    }

    /// Parses a name bound with `kind`.
    fn symbol<'a>(&self, kind: SymbolKind, input: Span<'a>) -> PResult<'a, String> {
        let (input, _) = ws0(input)?;
        let start = input;
        let (rest, name) = identifier(input)?;
        if self.model.kind_of(&name) != Some(kind) {
            return reject(start);
        }
        let (rest, _) = ws0(rest)?;
        Ok((rest, name))
    }

    /// Converts a parse failure into a compile error.
    fn diagnostic(
        &self,
        err: nom::Err<VerboseError<Span<'_>>>,
        file: &str,
        source: &str,
    ) -> CompileError {
        if let Some(pending) = self.pending.take() {
            return CompileError::at(pending.kind, pending.message, file, source, &pending.span);
        }
        let detail = match &err {
            nom::Err::Error(e) | nom::Err::Failure(e) => {
                furthest(e).and_then(|(span, kind)| self.name_detail(*span, kind))
            }
            nom::Err::Incomplete(_) => None,
        };
        let mut error = syntax_error(err, file, source);
        if let Some(detail) = detail {
            error.message = detail;
        }
        error
    }

    /// Explains a value expression that stopped at a name of the wrong kind.
    fn name_detail(&self, at: Span<'_>, kind: &VerboseErrorKind) -> Option<String> {
        let VerboseErrorKind::Context(expected) = kind else {
            return None;
        };
        if ![SCALAR, VECTOR, DATUM, SELECTION].contains(expected) {
            return None;
        }
        let (_, word) = identifier(at).ok()?;
        if is_reserved(&word) || self.registry.contains(&word) {
            return None;
        }
        Some(match self.model.kind_of(&word) {
            None => format!("Syntax error: unknown identifier '{word}'"),
            Some(found) => format!("Syntax error: '{word}' is a {found}, expected {expected}"),
        })
    }
}

/// Picks the error entry at the furthest offset, preferring the innermost
/// context recorded there.
fn furthest<'e, 'a>(e: &'e VerboseError<Span<'a>>) -> Option<&'e (Span<'a>, VerboseErrorKind)> {
    let offset = e
        .errors
        .iter()
        .map(|(span, _)| span.location_offset())
        .max()?;
    let mut at_offset = e
        .errors
        .iter()
        .filter(move |(span, _)| span.location_offset() == offset);
    let first = at_offset.clone().next();
    at_offset
        .find(|(_, kind)| matches!(kind, VerboseErrorKind::Context(_)))
        .or(first)
}

/// Converts a `nom` verbose error to crate-level compile diagnostics.
fn syntax_error(err: nom::Err<VerboseError<Span<'_>>>, file: &str, source: &str) -> CompileError {
    match err {
        nom::Err::Incomplete(_) => {
            CompileError::in_file(CompileErrorKind::Syntax, "Incomplete input", file)
        }
        nom::Err::Error(e) | nom::Err::Failure(e) => {
            let Some((span, kind)) = furthest(&e) else {
                return CompileError::in_file(CompileErrorKind::Syntax, "Syntax error", file);
            };
            let detail = match kind {
                VerboseErrorKind::Context(ctx) => format!("Syntax error: expected {ctx}"),
                VerboseErrorKind::Char(c) => format!("Syntax error: expected '{c}'"),
                VerboseErrorKind::Nom(kind) => format!("Syntax error near {kind:?}"),
            };
            let span = SourceSpan::from_bounds(*span, *span);
            CompileError::at(CompileErrorKind::Syntax, detail, file, source, &span)
        }
    }
}

/// Parses the leading import declarations of a module.
pub(crate) fn parse_imports(source: &str, file: &str) -> Result<Vec<ImportDecl>, CompileError> {
    let mut input = Span::new(source);
    let mut imports = Vec::new();
    loop {
        match import_decl(input) {
            Ok((rest, import)) => {
                imports.push(import);
                input = rest;
            }
            Err(nom::Err::Error(_)) => return Ok(imports),
            Err(err) => return Err(syntax_error(err, file, source)),
        }
    }
}

/// Parses one module and adds its bindings and output requests to `model`.
///
/// Statements are applied in order, so each statement sees the names bound
/// before it. On error `model` may hold a prefix of the module; callers parse
/// into a staged copy.
pub(crate) fn parse_module(
    source: &str,
    file: &str,
    registry: &FeatureRegistry,
    model: &mut Model,
) -> Result<(), CompileError> {
    let mut input = Span::new(source);
    // Imports were resolved by the project loader.
    loop {
        match import_decl(input) {
            Ok((rest, _)) => input = rest,
            Err(nom::Err::Error(_)) => break,
            Err(err) => return Err(syntax_error(err, file, source)),
        }
    }

    loop {
        let (rest, _) = ws0(input).map_err(|err| syntax_error(err, file, source))?;
        if rest.fragment().is_empty() {
            return Ok(());
        }
        if let Ok((after, _)) = keyword("import").parse(rest) {
            return Err(CompileError::at(
                CompileErrorKind::Syntax,
                "Syntax error: imports must precede all other statements",
                file,
                source,
                &SourceSpan::from_bounds(rest, after),
            ));
        }

        let parsed = {
            let grammar = Grammar::new(registry, model);
            grammar
                .statement(rest)
                .map_err(|err| grammar.diagnostic(err, file, source))
        };
        let (next, statement) = parsed?;
        let span = SourceSpan::from_bounds(rest, next);
        match statement {
            Statement::Binding { name, value } => {
                model
                    .bind(Binding {
                        name,
                        value,
                        span,
                        file: file.to_string(),
                    })
                    .map_err(|binding| {
                        CompileError::at(
                            CompileErrorKind::DuplicateSymbol,
                            format!("Duplicate symbol '{}'", binding.name),
                            file,
                            source,
                            &binding.span,
                        )
                    })?;
            }
            Statement::Export { feature, path } => model.request_output(OutputRequest {
                feature,
                path,
                span,
                file: file.to_string(),
            }),
        }
        input = next;
    }
}
