//! A `JSONPath` engine with read and write modes.
//!
//! Expressions are compiled once into a [`JsonPath`] and evaluated against
//! [`serde_json::Value`] documents any number of times. Read mode
//! ([`JsonPath::get`]) collects matched values; write mode
//! ([`JsonPath::set`]) replaces every matched location and materializes
//! missing intermediate objects and arrays along the way, so assigning to
//! `$.a.b.c` on an empty document creates `{"a": {"b": {"c": …}}}`.
//!
//! The recognized surface covers dot and bracket field access, wildcards,
//! recursive descent, array indexes, slices, comma unions, and filter
//! predicates with comparison operators or bare existence, with `$` and
//! `@` accepted as positioning markers.
//!
//! ```
//! use serde_json::json;
//!
//! let doc = json!([{"id": 42, "name": "forty-two"}, {"id": 1, "name": "one"}]);
//! let found = jsonpath_rw::find("$[?(@.id==42)].name", &doc).unwrap();
//! assert_eq!(found, vec![json!("forty-two")]);
//! ```

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    elided_lifetimes_in_paths,
    explicit_outlives_requirements,
    missing_abi,
    noop_method_call,
    semicolon_in_expressions_from_macros,
    unused_import_braces,
    unused_lifetimes,
    clippy::missing_panics_doc,
    clippy::doc_markdown,
    clippy::cloned_instead_of_copied,
    clippy::unreadable_literal
)]

use log::debug;
use serde_json::Value;

use crate::ast::eval::EvalCtx;
use crate::ast::parse;
use crate::ast::Node;
use crate::error::{EvalError, ParseError, PathError};
use crate::idx::IdxPath;

mod ast;
mod cmp;
pub mod error;
mod footprint;
mod idx;
mod utils;

#[cfg(test)]
mod tests;

/// Find a pattern in the provided JSON value. Recompiles the pattern every
/// call; if the same pattern is used a lot, compile it once with
/// [`JsonPath::compile`].
///
/// # Errors
///
/// - If the provided pattern fails to parse as a valid JSON path
/// - If evaluation hits a structural impossibility (see [`EvalError`])
pub fn find(pattern: &str, value: &Value) -> Result<Vec<Value>, PathError> {
    let mut path = JsonPath::compile(pattern, pattern)?;
    Ok(path.get(value)?)
}

/// Find a pattern in the provided JSON string. Recompiles the pattern every
/// call; if the same pattern is used a lot, compile it once with
/// [`JsonPath::compile`].
///
/// # Errors
///
/// - If the provided pattern fails to parse as a valid JSON path
/// - If the provided value fails to deserialize
/// - If evaluation hits a structural impossibility (see [`EvalError`])
pub fn find_str(pattern: &str, value: &str) -> Result<Vec<Value>, PathError> {
    let value = serde_json::from_str(value)?;
    find(pattern, &value)
}

/// A compiled JSON path. Can be evaluated against documents any number of
/// times, preventing recompilation of the same pattern.
///
/// Evaluation methods take `&mut self` because the path owns the warning
/// accumulator for its most recent run; the compiled expression itself is
/// never modified by evaluation.
#[derive(Debug, Clone)]
pub struct JsonPath {
    name: String,
    segments: Vec<Node>,
    warnings: Vec<String>,
}

impl JsonPath {
    /// Compile a JSON path. `name` is opaque and only used in diagnostics.
    ///
    /// The expression is framed in `{`…`}` delimiters before scanning, so
    /// the full free-text grammar of the inner parser applies.
    ///
    /// # Errors
    ///
    /// - If the provided pattern fails to parse as a valid JSON path
    /// - If the expression contains no segments at all
    pub fn compile(name: &str, expression: &str) -> Result<JsonPath, ParseError> {
        let segments = parse::parse_action(expression)?;
        if segments.is_empty() {
            return Err(ParseError::Empty {
                name: name.to_string(),
            });
        }
        debug!("compiled jsonpath {name}: {expression:?}");
        Ok(JsonPath {
            name: name.to_string(),
            segments,
            warnings: Vec::new(),
        })
    }

    /// The name this path was compiled under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate this path in read mode, returning an owned copy of every
    /// matched value. Non-fatal problems (a missing field, an index applied
    /// to a non-array) skip the offending match and are reported through
    /// [`warnings`](JsonPath::warnings).
    ///
    /// # Errors
    ///
    /// - If evaluation hits a structural impossibility (see [`EvalError`])
    pub fn get(&mut self, doc: &Value) -> Result<Vec<Value>, EvalError> {
        self.warnings.clear();
        let mut ctx = EvalCtx::read(doc);
        let result = ctx.get(&self.segments);
        self.warnings = ctx.into_warnings();
        result
    }

    /// Evaluate this path in write mode, replacing every matched location
    /// with a deep clone of `change`. Missing intermediate objects are
    /// created and arrays are grown with nulls as needed.
    ///
    /// A failed `set` may leave the document partially mutated; callers
    /// that need atomicity should snapshot first.
    ///
    /// # Errors
    ///
    /// - If the single index of a set-mode segment is negative or
    ///   unspecified
    /// - If a non-virtual selection cannot be coerced to the required
    ///   container kind
    /// - If evaluation hits any other structural impossibility (see
    ///   [`EvalError`])
    pub fn set(&mut self, doc: &mut Value, change: Value) -> Result<(), EvalError> {
        self.warnings.clear();
        let mut ctx = EvalCtx::write(doc);
        let result = ctx.set(&self.segments, &change);
        self.warnings = ctx.into_warnings();
        result
    }

    /// Replace every matched location with the value the closure returns
    /// for its current contents, operating in place.
    ///
    /// Unlike [`set`](JsonPath::set), matches are located in read mode, so
    /// nothing is materialized along the way.
    ///
    /// # Errors
    ///
    /// - If evaluation hits a structural impossibility (see [`EvalError`])
    pub fn replace(
        &mut self,
        doc: &mut Value,
        f: impl FnMut(&Value) -> Value,
    ) -> Result<(), EvalError> {
        let paths = self.locate(doc)?;
        utils::replace_paths(paths, doc, f)
    }

    /// Delete every matched location from the document, operating in
    /// place. Deeper matches are removed first, so deleting a parent and
    /// one of its children in the same run is well defined.
    ///
    /// # Errors
    ///
    /// - If evaluation hits a structural impossibility (see [`EvalError`])
    pub fn delete(&mut self, doc: &mut Value) -> Result<(), EvalError> {
        let paths = self.locate(doc)?;
        utils::delete_paths(paths, doc)
    }

    fn locate(&mut self, doc: &Value) -> Result<Vec<IdxPath>, EvalError> {
        self.warnings.clear();
        let mut ctx = EvalCtx::read(doc);
        let paths = ctx.matched_paths(&self.segments);
        self.warnings = ctx.into_warnings();
        paths
    }

    /// Non-fatal diagnostics accumulated during the most recent run, in
    /// the order they were recorded.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}
