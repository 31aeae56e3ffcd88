//! Errors returned by fallible methods

use core::fmt;

use serde_json::Value;
use thiserror::Error;

/// Error returned by a failure to parse a provided JSON path
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The expression ended before its closing delimiter
    #[error("unclosed action")]
    UnclosedAction,
    /// A `[` segment ran into the end of the expression or a newline
    #[error("unterminated array")]
    UnterminatedArray,
    /// A `[?(` segment ran into the end of the expression or a newline
    #[error("unterminated filter")]
    UnterminatedFilter,
    /// A quoted string ran into the end of the expression or a newline
    #[error("unterminated quoted string")]
    UnterminatedString,
    /// An opening quote has no matching closer
    #[error("cannot find the next {0}")]
    UnmatchedQuote(char),
    /// A rune with no meaning at this position
    #[error("unrecognized character in action: {0:?}")]
    UnrecognizedCharacter(char),
    /// Bracket contents that are neither a wildcard, quoted key, union nor slice
    #[error("invalid array index {0}")]
    InvalidArrayIndex(String),
    /// A numeric literal that parses as neither integer nor float
    #[error("cannot parse number {0}")]
    InvalidNumber(String),
    /// Two recursive descent operators in a row
    #[error("invalid multiple recursive descent")]
    MultipleRecursive,
    /// A filter's closing `)` was not followed by `]`
    #[error("unclosed array, expected ] after filter")]
    ExpectedFilterClose,
    /// A quoted string literal with a malformed escape or quoting
    #[error("cannot unquote string {0}")]
    InvalidQuotedString(String),
    /// The expression contains no segments at all
    #[error("{name} is an empty jsonpath expression")]
    Empty {
        /// Name the path was compiled under
        name: String,
    },
}

/// Error returned by a failure during evaluation of a compiled path
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum EvalError {
    /// A node kind that carries no evaluation rule was reached
    #[error("unexpected {0} node during evaluation")]
    UnexpectedNode(&'static str),
    /// A filter comparison side produced more than one result
    #[error("can only compare one element at a time")]
    MultiResultCompare,
    /// Set mode rejects negative single indexes
    #[error("cannot use a negative index in set mode")]
    NegativeIndex,
    /// Set mode rejects unspecified single indexes
    #[error("array index must be specified in set mode")]
    UnknownIndex,
    /// The operation has no meaning for this footprint kind
    #[error("{op} is not supported on a {on} footprint")]
    Unsupported {
        /// Operation that was attempted
        op: &'static str,
        /// Kind of footprint it was attempted on
        on: &'static str,
    },
    /// A selected child must be an object but is something else and not virtual
    #[error("selection is a {0}, not an object and not virtual")]
    NotAnObject(JsonTy),
    /// A selected child must be an array but is something else and not virtual
    #[error("selection is a {0}, not an array and not virtual")]
    NotAnArray(JsonTy),
    /// A virtual selection cannot be materialized to a wildcard-sized array
    #[error("cannot use a wildcard to size a virtual array")]
    WildcardOnVirtual,
    /// A selected key vanished between selection and enforcement
    #[error("cannot find the element by key: {0}")]
    MissingKey(String),
    /// A selected index lies outside the array during enforcement
    #[error("invalid index during enforcement: {0}")]
    IndexOutOfBounds(usize),
    /// A footprint path no longer resolves to the expected container kind
    #[error("path step expected a {expected}, found a {actual}")]
    PathType {
        /// Kind the path step requires
        expected: JsonTy,
        /// Kind actually found in the document
        actual: JsonTy,
    },
    /// A footprint path names a child that does not exist
    #[error("path step {0} does not exist")]
    PathMissing(String),
    /// Mutation was attempted while evaluating in read mode
    #[error("cannot mutate the document in read mode")]
    ReadOnly,
}

/// Enum for an error from one of the crate-level convenience functions,
/// which parse, evaluate, and possibly deserialize in one go
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PathError {
    /// Error was a failure to parse the JSON path
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// Error was a failure while evaluating the compiled path
    #[error(transparent)]
    Eval(#[from] EvalError),
    /// Error was a failure to deserialize JSON data
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Type of a JSON value for error info
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum JsonTy {
    /// `null`
    Null,
    /// `true` or `false`
    Bool,
    /// `1.5` or similar
    Number,
    /// `"foo"` or similar
    String,
    /// `[1, 2, 3]` or similar
    Array,
    /// `{"a": false}` or similar
    Object,
}

impl fmt::Display for JsonTy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsonTy::Null => write!(f, "null"),
            JsonTy::Bool => write!(f, "bool"),
            JsonTy::Number => write!(f, "number"),
            JsonTy::String => write!(f, "string"),
            JsonTy::Array => write!(f, "array"),
            JsonTy::Object => write!(f, "object"),
        }
    }
}

impl From<&Value> for JsonTy {
    fn from(val: &Value) -> Self {
        match val {
            Value::Null => JsonTy::Null,
            Value::Bool(_) => JsonTy::Bool,
            Value::Number(_) => JsonTy::Number,
            Value::String(_) => JsonTy::String,
            Value::Array(_) => JsonTy::Array,
            Value::Object(_) => JsonTy::Object,
        }
    }
}
