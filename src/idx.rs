//! Paths of indices locating a value inside a document.
//!
//! Footprints never hold references into the document; they remember where
//! a container lives as a chain of keys and indexes and resolve it freshly
//! against the live document each time it is needed. This keeps write-mode
//! evaluation free of aliasing even though earlier segments may have grown
//! or replaced containers along the way.

use core::fmt;

use serde_json::Value;

use crate::error::{EvalError, JsonTy};

/// A single step into a JSON container: an object key or an array index.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Idx {
    /// Step into an object by key
    Key(String),
    /// Step into an array by position
    Index(usize),
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Idx::Key(key) => write!(f, "{key:?}"),
            Idx::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

impl From<&str> for Idx {
    fn from(key: &str) -> Self {
        Idx::Key(key.to_string())
    }
}

impl From<usize> for Idx {
    fn from(idx: usize) -> Self {
        Idx::Index(idx)
    }
}

/// A chain of steps from the document root down to one value. The empty
/// path is the document root itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct IdxPath(Vec<Idx>);

impl IdxPath {
    /// The path of the document root
    pub fn root() -> IdxPath {
        IdxPath(Vec::new())
    }

    /// A new path one step deeper than this one
    pub fn child(&self, idx: impl Into<Idx>) -> IdxPath {
        let mut steps = self.0.clone();
        steps.push(idx.into());
        IdxPath(steps)
    }

    /// Split into the parent path and the final step; `None` at the root.
    pub fn split_last(&self) -> Option<(IdxPath, &Idx)> {
        let (last, parent) = self.0.split_last()?;
        Some((IdxPath(parent.to_vec()), last))
    }

    /// Resolve this path against a document, returning the value it names
    pub fn resolve_on<'a>(&self, value: &'a Value) -> Result<&'a Value, EvalError> {
        let mut cur = value;
        for idx in &self.0 {
            cur = match idx {
                Idx::Index(i) => cur
                    .as_array()
                    .ok_or_else(|| mismatch(JsonTy::Array, cur))?
                    .get(*i)
                    .ok_or_else(|| EvalError::PathMissing(idx.to_string()))?,
                Idx::Key(k) => cur
                    .as_object()
                    .ok_or_else(|| mismatch(JsonTy::Object, cur))?
                    .get(k)
                    .ok_or_else(|| EvalError::PathMissing(idx.to_string()))?,
            };
        }
        Ok(cur)
    }

    /// Resolve this path against a document for mutation
    pub fn resolve_on_mut<'a>(&self, value: &'a mut Value) -> Result<&'a mut Value, EvalError> {
        let mut cur = value;
        for idx in &self.0 {
            cur = match idx {
                Idx::Index(i) => {
                    let actual = JsonTy::from(&*cur);
                    cur.as_array_mut()
                        .ok_or(EvalError::PathType {
                            expected: JsonTy::Array,
                            actual,
                        })?
                        .get_mut(*i)
                        .ok_or_else(|| EvalError::PathMissing(idx.to_string()))?
                }
                Idx::Key(k) => {
                    let actual = JsonTy::from(&*cur);
                    cur.as_object_mut()
                        .ok_or(EvalError::PathType {
                            expected: JsonTy::Object,
                            actual,
                        })?
                        .get_mut(k)
                        .ok_or_else(|| EvalError::PathMissing(idx.to_string()))?
                }
            };
        }
        Ok(cur)
    }
}

fn mismatch(expected: JsonTy, got: &Value) -> EvalError {
    EvalError::PathType {
        expected,
        actual: got.into(),
    }
}
