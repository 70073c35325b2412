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

//! Script diagnostics with source snippets and caret pointers.

use crate::ast::SourceSpan;
use std::fmt;

/// Category of a script load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// Grammar mismatch (including wrong argument arity or value kind).
    Syntax,
    /// A constructor call names a type that was never registered.
    UnknownFeatureType,
    /// A binding reuses a name already bound in the session.
    DuplicateSymbol,
    /// A binding uses a keyword or a registered type name.
    ReservedName,
    /// A module could not be loaded or the imports form a cycle.
    Import,
}

/// Error returned when script text cannot be turned into a model.
///
/// Every variant aborts loading of the whole script; the session keeps the
/// model it had before the load started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    /// Human-readable error message.
    pub message: String,
    /// Source file/path label (`""` when unavailable).
    pub file: String,
    /// 1-based line number (`0` when unavailable).
    pub line: usize,
    /// 1-based column number (`0` when unavailable).
    pub column: usize,
    /// Source line where the error occurred.
    pub snippet: String,
    /// Caret pointer aligned to `snippet`.
    pub pointer: String,
}

impl CompileError {
    /// Creates an error attached to a file but not to a position.
    pub fn in_file(
        kind: CompileErrorKind,
        message: impl Into<String>,
        file: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            file: file.into(),
            line: 0,
            column: 0,
            snippet: String::new(),
            pointer: String::new(),
        }
    }

    /// Creates a source-mapped diagnostic.
    pub fn at(
        kind: CompileErrorKind,
        message: impl Into<String>,
        file: impl Into<String>,
        source: &str,
        span: &SourceSpan,
    ) -> Self {
        let snippet = source
            .lines()
            .nth(span.line.saturating_sub(1))
            .unwrap_or("")
            .to_string();
        // Clamp the caret to the reported line even when the span runs past it.
        let line_len = snippet.chars().count();
        let caret_column = span.column.saturating_sub(1).min(line_len);
        let caret_len = span
            .len()
            .max(1)
            .min(line_len.saturating_sub(caret_column).max(1));
        let pointer = format!("{}{}", " ".repeat(caret_column), "^".repeat(caret_len));

        Self {
            kind,
            message: message.into(),
            file: file.into(),
            line: span.line,
            column: span.column,
            snippet,
            pointer,
        }
    }

    /// Returns whether the error carries a line/column anchor.
    pub fn has_location(&self) -> bool {
        self.line != 0 && self.column != 0
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.has_location() {
            if self.file.is_empty() {
                return f.write_str(&self.message);
            }
            return write!(f, "{} ({})", self.message, self.file);
        }

        let location = if self.file.is_empty() {
            format!("line {}, column {}", self.line, self.column)
        } else {
            format!("{}:{}:{}", self.file, self.line, self.column)
        };

        write!(
            f,
            "{}\n --> {}\n  |\n{:>3} | {}\n  | {}",
            self.message, location, self.line, self.snippet, self.pointer
        )
    }
}

impl std::error::Error for CompileError {}
