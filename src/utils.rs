//! In-place edits applied to a batch of matched locations.

use serde_json::Value;

use crate::error::EvalError;
use crate::idx::{Idx, IdxPath};

/// Replace the value at every path with whatever the closure returns for
/// the current one.
pub(crate) fn replace_paths(
    paths: Vec<IdxPath>,
    out: &mut Value,
    mut f: impl FnMut(&Value) -> Value,
) -> Result<(), EvalError> {
    for path in paths {
        let slot = path.resolve_on_mut(out)?;
        let new = f(&*slot);
        *slot = new;
    }
    Ok(())
}

/// Remove the value at every path from its parent container.
///
/// Paths are processed in descending order: an ancestor sorts before its
/// descendants and a lower array index before a higher one, so earlier
/// removals never shift or orphan the targets of later ones.
pub(crate) fn delete_paths(mut paths: Vec<IdxPath>, out: &mut Value) -> Result<(), EvalError> {
    paths.sort_unstable_by(|a, b| b.cmp(a));
    for path in paths {
        let Some((parent, last)) = path.split_last() else {
            continue;
        };
        match (parent.resolve_on_mut(out)?, last) {
            (Value::Array(arr), Idx::Index(i)) => {
                if *i < arr.len() {
                    arr.remove(*i);
                }
            }
            (Value::Object(obj), Idx::Key(key)) => {
                obj.remove(key);
            }
            _ => {}
        }
    }
    Ok(())
}
