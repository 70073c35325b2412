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

//! Feature type registry.
//!
//! Every feature type is described by a [`FeatureTypeDescriptor`]: its name,
//! argument signature, the argument production it contributes to the script
//! grammar, the factory that turns parsed arguments into a [`Feature`], and
//! its help text. Registration order is the order types are listed in
//! documentation and tried by tooling.

use crate::ast::{Argument, ScalarExpr, ScalarFn};
use crate::backend::EntityKind;
use crate::features;
use crate::model::Feature;
use crate::parser::{ArgumentGrammar, signature_arguments};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::sync::OnceLock;
use thiserror::Error;

/// Value kind accepted by a constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind {
    Scalar,
    Vector,
    Datum,
    Feature,
    Selection,
    /// One of a fixed set of option words.
    Keyword(&'static [&'static str]),
}

impl ParamKind {
    pub fn name(&self) -> &'static str {
        match self {
            ParamKind::Scalar => "scalar",
            ParamKind::Vector => "vector",
            ParamKind::Datum => "datum",
            ParamKind::Feature => "feature",
            ParamKind::Selection => "selection",
            ParamKind::Keyword(_) => "keyword",
        }
    }

    fn accepts(&self, argument: &Argument) -> bool {
        match (self, argument) {
            (ParamKind::Scalar, Argument::Scalar(_))
            | (ParamKind::Vector, Argument::Vector(_))
            | (ParamKind::Datum, Argument::Datum(_))
            | (ParamKind::Feature, Argument::Feature(_))
            | (ParamKind::Selection, Argument::Selection(_)) => true,
            (ParamKind::Keyword(choices), Argument::Keyword(word)) => choices.contains(&word.as_str()),
            _ => false,
        }
    }
}

/// Value substituted for an omitted optional argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Fallback {
    Scalar(f64),
    Keyword(&'static str),
}

impl Fallback {
    fn to_argument(self) -> Argument {
        match self {
            Fallback::Scalar(value) => Argument::Scalar(Rc::new(ScalarExpr::Literal(value))),
            Fallback::Keyword(word) => Argument::Keyword(word.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arity {
    Required,
    Optional(Fallback),
    /// Consumes every remaining argument; at least `min` of them.
    Variadic(usize),
}

/// One declared constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
    pub arity: Arity,
}

impl Param {
    pub const fn required(name: &'static str, kind: ParamKind) -> Self {
        Self {
            name,
            kind,
            arity: Arity::Required,
        }
    }

    pub const fn optional(name: &'static str, kind: ParamKind, fallback: Fallback) -> Self {
        Self {
            name,
            kind,
            arity: Arity::Optional(fallback),
        }
    }

    pub const fn variadic(name: &'static str, kind: ParamKind, min: usize) -> Self {
        Self {
            name,
            kind,
            arity: Arity::Variadic(min),
        }
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.arity, Arity::Variadic(_))
    }

    pub fn usage(&self) -> String {
        let kind = match self.kind {
            ParamKind::Keyword(choices) => choices.join("|"),
            kind => kind.name().to_string(),
        };
        match self.arity {
            Arity::Required => format!("{}: {kind}", self.name),
            Arity::Optional(Fallback::Scalar(value)) => format!("{}: {kind} = {value}", self.name),
            Arity::Optional(Fallback::Keyword(word)) => format!("{}: {kind} = {word}", self.name),
            Arity::Variadic(min) => format!("{}: {kind}... (at least {min})", self.name),
        }
    }
}

/// Factory turning parsed arguments into a feature.
pub type Factory = fn(&FeatureTypeDescriptor, Vec<Argument>) -> Result<Feature, String>;

/// Static description of one feature type.
#[derive(Clone, Copy)]
pub struct FeatureTypeDescriptor {
    pub name: &'static str,
    pub parameters: &'static [Param],
    /// Argument production between the constructor's parentheses.
    pub grammar: ArgumentGrammar,
    pub factory: Factory,
    pub doc: &'static str,
}

impl FeatureTypeDescriptor {
    /// Describes a type whose syntax and validation follow `parameters`.
    pub const fn new(name: &'static str, parameters: &'static [Param], doc: &'static str) -> Self {
        Self {
            name,
            parameters,
            grammar: signature_arguments,
            factory: standard_factory,
            doc,
        }
    }

    pub const fn with_grammar(mut self, grammar: ArgumentGrammar) -> Self {
        self.grammar = grammar;
        self
    }

    pub const fn with_factory(mut self, factory: Factory) -> Self {
        self.factory = factory;
        self
    }

    /// Renders `Name(param: kind, ...)`.
    pub fn usage(&self) -> String {
        signature_usage(self.name, self.parameters)
    }
}

impl fmt::Debug for FeatureTypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureTypeDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

pub(crate) fn signature_usage(name: &str, parameters: &[Param]) -> String {
    let params: Vec<String> = parameters.iter().map(Param::usage).collect();
    format!("{name}({})", params.join(", "))
}

/// Checks arguments against a signature and fills omitted optional ones.
pub fn bind_arguments(
    parameters: &[Param],
    arguments: Vec<Argument>,
) -> Result<Vec<Argument>, String> {
    let mut remaining = arguments.into_iter().peekable();
    let mut bound = Vec::new();
    for param in parameters {
        match param.arity {
            Arity::Required => {
                let arg = remaining
                    .next()
                    .ok_or_else(|| format!("missing argument '{}'", param.name))?;
                check_kind(param, &arg)?;
                bound.push(arg);
            }
            Arity::Optional(fallback) => match remaining.next() {
                Some(arg) => {
                    check_kind(param, &arg)?;
                    bound.push(arg);
                }
                None => bound.push(fallback.to_argument()),
            },
            Arity::Variadic(min) => {
                let mut count = 0;
                for arg in remaining.by_ref() {
                    check_kind(param, &arg)?;
                    bound.push(arg);
                    count += 1;
                }
                if count < min {
                    return Err(format!(
                        "'{}' needs at least {min} arguments, got {count}",
                        param.name
                    ));
                }
            }
        }
    }
    if remaining.peek().is_some() {
        return Err(format!(
            "expected at most {} arguments, got {}",
            parameters.len(),
            bound.len() + remaining.count()
        ));
    }
    Ok(bound)
}

fn check_kind(param: &Param, argument: &Argument) -> Result<(), String> {
    if param.kind.accepts(argument) {
        return Ok(());
    }
    Err(format!(
        "argument '{}' expects a {}, got a {}",
        param.name,
        param.kind.name(),
        argument.kind_name()
    ))
}

/// Default factory: validates against the descriptor's own signature.
pub fn standard_factory(
    descriptor: &FeatureTypeDescriptor,
    arguments: Vec<Argument>,
) -> Result<Feature, String> {
    let arguments = bind_arguments(descriptor.parameters, arguments)?;
    Ok(Feature::new(descriptor.name, descriptor.parameters, arguments))
}

/// Registry failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("feature type '{0}' is already registered")]
    DuplicateType(String),

    #[error("'{0}' is reserved and cannot name a feature type")]
    ReservedName(String),

    #[error("Unknown feature type '{0}'")]
    UnknownFeatureType(String),

    #[error("invalid arguments for {feature_type}: {message}")]
    InvalidArguments {
        feature_type: String,
        message: String,
    },
}

/// Words claimed by the statement and value grammars.
const KEYWORDS: &[&str] = &[
    "import", "export", "as", "Vector", "Point", "Axis", "Plane", "dot", "mag", "cross",
    "normalize",
];

/// Returns whether `name` is claimed by the shared grammar.
pub fn is_reserved(name: &str) -> bool {
    KEYWORDS.contains(&name)
        || ScalarFn::ALL.iter().any(|(word, _)| *word == name)
        || EntityKind::ALL.iter().any(|(word, _)| *word == name)
}

/// Ordered set of feature types.
#[derive(Debug, Clone, Default)]
pub struct FeatureRegistry {
    types: Vec<FeatureTypeDescriptor>,
    index: HashMap<&'static str, usize>,
}

impl FeatureRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in feature types.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in features::builtin_types() {
            registry
                .register(*descriptor)
                .expect("built-in feature types have unique, unreserved names");
        }
        registry
    }

    /// Returns the process-wide registry of built-in types.
    ///
    /// It is populated on first use and read-only afterwards.
    pub fn global() -> &'static FeatureRegistry {
        static GLOBAL: OnceLock<FeatureRegistry> = OnceLock::new();
        GLOBAL.get_or_init(FeatureRegistry::with_builtins)
    }

    /// Appends a feature type.
    pub fn register(&mut self, descriptor: FeatureTypeDescriptor) -> Result<(), RegistryError> {
        if is_reserved(descriptor.name) {
            return Err(RegistryError::ReservedName(descriptor.name.to_string()));
        }
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateType(descriptor.name.to_string()));
        }
        self.index.insert(descriptor.name, self.types.len());
        self.types.push(descriptor);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&FeatureTypeDescriptor, RegistryError> {
        self.index
            .get(name)
            .map(|&idx| &self.types[idx])
            .ok_or_else(|| RegistryError::UnknownFeatureType(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns descriptors in registration order.
    pub fn types(&self) -> impl Iterator<Item = &FeatureTypeDescriptor> {
        self.types.iter()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Creates a feature programmatically, bypassing the script grammar.
    pub fn instantiate(
        &self,
        name: &str,
        arguments: Vec<Argument>,
    ) -> Result<Rc<Feature>, RegistryError> {
        let descriptor = self.lookup(name)?;
        (descriptor.factory)(descriptor, arguments)
            .map(Rc::new)
            .map_err(|message| RegistryError::InvalidArguments {
                feature_type: name.to_string(),
                message,
            })
    }

    /// Renders the help text of every type in registration order.
    pub fn documentation(&self) -> String {
        let mut out = String::new();
        for descriptor in &self.types {
            out.push_str(&descriptor.usage());
            out.push('\n');
            for line in descriptor.doc.lines() {
                out.push_str("    ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: &[Param] = &[
        Param::required("a", ParamKind::Scalar),
        Param::optional("b", ParamKind::Scalar, Fallback::Scalar(0.0)),
    ];

    #[test]
    fn optional_arguments_are_filled() {
        let bound = bind_arguments(PAIR, vec![Argument::scalar(1.0)]).expect("bind");
        assert_eq!(bound.len(), 2);
        match &bound[1] {
            Argument::Scalar(expr) => assert!(matches!(**expr, ScalarExpr::Literal(v) if v == 0.0)),
            other => panic!("unexpected argument {other:?}"),
        }
    }

    #[test]
    fn wrong_kind_and_extra_arguments_are_rejected() {
        let err = bind_arguments(PAIR, vec![Argument::vector(0.0, 0.0, 0.0)]).expect_err("kind");
        assert!(err.contains("expects a scalar"));
        let err = bind_arguments(
            PAIR,
            vec![Argument::scalar(1.0), Argument::scalar(2.0), Argument::scalar(3.0)],
        )
        .expect_err("extra");
        assert!(err.contains("at most 2"));
    }

    #[test]
    fn variadic_minimum_is_enforced() {
        const PARTS: &[Param] = &[Param::variadic("parts", ParamKind::Feature, 2)];
        let err = bind_arguments(PARTS, vec![Argument::feature("a")]).expect_err("min");
        assert!(err.contains("at least 2"));
        let bound = bind_arguments(
            PARTS,
            vec![Argument::feature("a"), Argument::feature("b"), Argument::feature("c")],
        )
        .expect("bind");
        assert_eq!(bound.len(), 3);
    }

    #[test]
    fn registration_rejects_duplicates_and_reserved_names() {
        let mut registry = FeatureRegistry::new();
        let descriptor = FeatureTypeDescriptor::new("Widget", PAIR, "A test type.");
        registry.register(descriptor).expect("first registration");
        assert_eq!(
            registry.register(descriptor),
            Err(RegistryError::DuplicateType("Widget".into()))
        );
        assert_eq!(
            registry.register(FeatureTypeDescriptor::new("edges", PAIR, "")),
            Err(RegistryError::ReservedName("edges".into()))
        );
        assert!(matches!(
            registry.lookup("Gadget"),
            Err(RegistryError::UnknownFeatureType(name)) if name == "Gadget"
        ));
    }

    #[test]
    fn usage_lists_signature() {
        let descriptor = FeatureTypeDescriptor::new("Widget", PAIR, "");
        assert_eq!(descriptor.usage(), "Widget(a: scalar, b: scalar = 0)");
    }

    #[test]
    fn global_registry_holds_builtins_in_order() {
        let registry = FeatureRegistry::global();
        let names: Vec<&str> = registry.types().map(|d| d.name).collect();
        assert_eq!(&names[..4], &["Box", "Sphere", "Cylinder", "Cone"]);
        assert!(registry.contains("Revolve"));
        assert!(registry.documentation().contains("Cone(p0: vector, p1: vector"));
    }
}
