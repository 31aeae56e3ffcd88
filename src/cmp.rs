//! Scalar comparison used by filter predicates.
//!
//! Operators are validated here rather than at parse time, so an unknown
//! operator surfaces as a per-element warning instead of a compile error.

use std::cmp::Ordering;

use serde_json::Value;
use thiserror::Error;

use crate::error::JsonTy;

#[derive(Debug, Clone, PartialEq, Error)]
pub(crate) enum CompareError {
    #[error("cannot compare {left} with {right}")]
    MismatchedKinds { left: JsonTy, right: JsonTy },
    #[error("{0} values cannot be compared")]
    Uncomparable(JsonTy),
    #[error("{0} values have no ordering")]
    Unordered(JsonTy),
    #[error("unrecognized filter operator {0}")]
    UnknownOperator(String),
}

/// Apply `op` to two scalar values. Numeric comparisons widen int and
/// float uniformly; strings compare lexicographically; `==`/`!=` also
/// cover null and bool. Containers and kind mismatches are errors.
pub(crate) fn compare(op: &str, left: &Value, right: &Value) -> Result<bool, CompareError> {
    match op {
        "==" => equal(left, right),
        "!=" => equal(left, right).map(|eq| !eq),
        "<" => ordering(left, right).map(|ord| ord == Ordering::Less),
        ">" => ordering(left, right).map(|ord| ord == Ordering::Greater),
        "<=" => ordering(left, right).map(|ord| ord != Ordering::Greater),
        ">=" => ordering(left, right).map(|ord| ord != Ordering::Less),
        other => Err(CompareError::UnknownOperator(other.to_string())),
    }
}

fn equal(left: &Value, right: &Value) -> Result<bool, CompareError> {
    check_kinds(left, right)?;
    Ok(match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::String(a), Value::String(b)) => a == b,
        _ => false,
    })
}

fn ordering(left: &Value, right: &Value) -> Result<Ordering, CompareError> {
    let kind = check_kinds(left, right)?;
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => Ok(x.cmp(&y)),
            _ => a
                .as_f64()
                .zip(b.as_f64())
                .and_then(|(x, y)| x.partial_cmp(&y))
                .ok_or(CompareError::Unordered(JsonTy::Number)),
        },
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(CompareError::Unordered(kind)),
    }
}

/// Reject containers and mixed operand kinds, returning the shared kind.
fn check_kinds(left: &Value, right: &Value) -> Result<JsonTy, CompareError> {
    let (lk, rk) = (JsonTy::from(left), JsonTy::from(right));
    for kind in [lk, rk] {
        if matches!(kind, JsonTy::Array | JsonTy::Object) {
            return Err(CompareError::Uncomparable(kind));
        }
    }
    if lk != rk {
        return Err(CompareError::MismatchedKinds {
            left: lk,
            right: rk,
        });
    }
    Ok(lk)
}
