//! Selection cursors threaded through evaluation.
//!
//! A footprint pairs the location of one container with the set of
//! children selected inside it. Containers are located by [`IdxPath`] and
//! resolved against the live document on every access, so write-mode
//! materialization never invalidates an earlier cursor.
//!
//! Selections the user referenced but that do not physically exist yet are
//! marked virtual; write mode materializes them on demand. `real_size`
//! records an array's length before any growth, letting later segments
//! tell appended indexes apart from pre-existing ones.

use serde_json::{Map, Value};

use crate::error::{EvalError, JsonTy};
use crate::idx::IdxPath;

/// Virtuality of one selection entry. `real_size == -1` means unknown
/// (either never measured, or the container itself was just materialized).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct VirtualInfo {
    pub is_virtual: bool,
    pub real_size: i64,
}

impl Default for VirtualInfo {
    fn default() -> Self {
        VirtualInfo {
            is_virtual: false,
            real_size: -1,
        }
    }
}

impl VirtualInfo {
    pub(crate) fn virtual_entry() -> VirtualInfo {
        VirtualInfo {
            is_virtual: true,
            real_size: -1,
        }
    }
}

/// One selected key of an object container.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectionKey {
    pub key: String,
    pub info: VirtualInfo,
}

/// One selected index of an array container.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SelectionIndex {
    pub index: usize,
    pub info: VirtualInfo,
}

/// Cursor over an object container.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MapFootprint {
    pub path: IdxPath,
    pub keys: Vec<SelectionKey>,
    pub leave_as_is: bool,
}

/// Cursor over an array container. `info` is inherited from the selection
/// entry this footprint was expanded out of.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArrayFootprint {
    pub path: IdxPath,
    pub indexes: Vec<SelectionIndex>,
    pub info: VirtualInfo,
    pub leave_as_is: bool,
}

/// An owned scalar, such as a filter literal or a leaf value reached by
/// expansion. It cannot be expanded or updated.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct NonRefFootprint {
    pub value: Value,
    pub leave_as_is: bool,
}

/// The synthetic single-element holder wrapped around the document root at
/// the start of evaluation; its one selection is the document itself.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RootFootprint {
    pub info: VirtualInfo,
    pub leave_as_is: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Footprint {
    Root(RootFootprint),
    Map(MapFootprint),
    Array(ArrayFootprint),
    NonRef(NonRefFootprint),
}

impl Footprint {
    /// The initial footprint set is exactly one of these.
    pub fn root() -> Footprint {
        Footprint::Root(RootFootprint {
            info: VirtualInfo::default(),
            leave_as_is: false,
        })
    }

    /// Build a footprint for the value at `path`, picking the variant from
    /// the value's kind. Scalars are copied out into an owned footprint.
    pub fn at(path: IdxPath, doc: &Value, info: VirtualInfo) -> Result<Footprint, EvalError> {
        let value = path.resolve_on(doc)?;
        Ok(match value {
            Value::Object(_) => Footprint::Map(MapFootprint {
                path,
                keys: Vec::new(),
                leave_as_is: false,
            }),
            Value::Array(_) => Footprint::Array(ArrayFootprint {
                path,
                indexes: Vec::new(),
                info,
                leave_as_is: false,
            }),
            other => Footprint::NonRef(NonRefFootprint {
                value: other.clone(),
                leave_as_is: false,
            }),
        })
    }

    /// A literal produced inside a filter sub-expression.
    pub fn scalar(value: impl Into<Value>) -> Footprint {
        Footprint::NonRef(NonRefFootprint {
            value: value.into(),
            leave_as_is: false,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Footprint::Root(_) => "root holder",
            Footprint::Map(_) => "object",
            Footprint::Array(_) => "array",
            Footprint::NonRef(_) => "scalar",
        }
    }

    /// A copy flagged to survive its next expansion unchanged.
    pub fn leave_as_is(&self) -> Footprint {
        let mut fp = self.clone();
        match &mut fp {
            Footprint::Root(r) => r.leave_as_is = true,
            Footprint::Map(m) => m.leave_as_is = true,
            Footprint::Array(a) => a.leave_as_is = true,
            Footprint::NonRef(n) => n.leave_as_is = true,
        }
        fp
    }

    /// The document location of every selected child. Owned scalars have
    /// no location; the root holder's selection is the document itself.
    pub fn selected_paths(&self) -> Vec<IdxPath> {
        match self {
            Footprint::Root(_) => vec![IdxPath::root()],
            Footprint::Map(m) => m
                .keys
                .iter()
                .map(|sk| m.path.child(sk.key.as_str()))
                .collect(),
            Footprint::Array(a) => a
                .indexes
                .iter()
                .map(|si| a.path.child(si.index))
                .collect(),
            Footprint::NonRef(_) => Vec::new(),
        }
    }

    /// An owned copy of the value this footprint stands for.
    pub fn value_of(&self, doc: &Value) -> Result<Value, EvalError> {
        Ok(match self {
            Footprint::Root(_) => doc.clone(),
            Footprint::Map(m) => m.path.resolve_on(doc)?.clone(),
            Footprint::Array(a) => a.path.resolve_on(doc)?.clone(),
            Footprint::NonRef(n) => n.value.clone(),
        })
    }

    /// One new footprint per selection entry, each pointing at the selected
    /// child and inheriting the entry's virtuality. A footprint flagged
    /// `leave_as_is` yields itself once, with the flag cleared. An empty
    /// selection yields nothing. Scalars refuse expansion outright, flag or
    /// not; existence filters and wildcards over scalar leaves rely on this.
    pub fn expand(&self, doc: &Value) -> Result<Vec<Footprint>, EvalError> {
        match self {
            Footprint::NonRef(_) => Err(EvalError::Unsupported {
                op: "expand",
                on: "scalar",
            }),
            Footprint::Root(r) => {
                if r.leave_as_is {
                    let mut fp = r.clone();
                    fp.leave_as_is = false;
                    return Ok(vec![Footprint::Root(fp)]);
                }
                Ok(vec![Footprint::at(IdxPath::root(), doc, r.info)?])
            }
            Footprint::Map(m) => {
                if m.leave_as_is {
                    let mut fp = m.clone();
                    fp.leave_as_is = false;
                    return Ok(vec![Footprint::Map(fp)]);
                }
                m.keys
                    .iter()
                    .map(|sk| Footprint::at(m.path.child(sk.key.as_str()), doc, sk.info))
                    .collect()
            }
            Footprint::Array(a) => {
                if a.leave_as_is {
                    let mut fp = a.clone();
                    fp.leave_as_is = false;
                    return Ok(vec![Footprint::Array(fp)]);
                }
                a.indexes
                    .iter()
                    .map(|si| Footprint::at(a.path.child(si.index), doc, si.info))
                    .collect()
            }
        }
    }

    /// A copy of this footprint selecting every child of its container:
    /// all keys of an object, all indexes of an array ascending.
    pub fn select_all(&self, doc: &Value) -> Result<Footprint, EvalError> {
        match self {
            Footprint::Root(r) => Ok(Footprint::Root(r.clone())),
            Footprint::Map(m) => {
                let obj = as_object(m.path.resolve_on(doc)?)?;
                let keys = obj
                    .keys()
                    .map(|key| SelectionKey {
                        key: key.clone(),
                        info: VirtualInfo::default(),
                    })
                    .collect();
                Ok(Footprint::Map(MapFootprint {
                    path: m.path.clone(),
                    keys,
                    leave_as_is: false,
                }))
            }
            Footprint::Array(a) => {
                let arr = as_array(a.path.resolve_on(doc)?)?;
                let indexes = (0..arr.len())
                    .map(|index| SelectionIndex {
                        index,
                        info: VirtualInfo::default(),
                    })
                    .collect();
                Ok(Footprint::Array(ArrayFootprint {
                    path: a.path.clone(),
                    indexes,
                    info: a.info,
                    leave_as_is: false,
                }))
            }
            Footprint::NonRef(_) => Err(EvalError::Unsupported {
                op: "select_all",
                on: "scalar",
            }),
        }
    }

    /// Write a clone of `change` into every selected child.
    pub fn update_all(&self, doc: &mut Value, change: &Value) -> Result<(), EvalError> {
        match self {
            Footprint::Map(m) => {
                let obj = as_object_mut(m.path.resolve_on_mut(doc)?)?;
                for sk in &m.keys {
                    obj.insert(sk.key.clone(), change.clone());
                }
                Ok(())
            }
            Footprint::Array(a) => {
                let arr = as_array_mut(a.path.resolve_on_mut(doc)?)?;
                for si in &a.indexes {
                    *arr
                        .get_mut(si.index)
                        .ok_or(EvalError::IndexOutOfBounds(si.index))? = change.clone();
                }
                Ok(())
            }
            other => Err(EvalError::Unsupported {
                op: "update_all",
                on: other.kind(),
            }),
        }
    }

    /// Ensure every selected child is an object, materializing virtual
    /// selections into empty objects.
    pub fn enforce_object_selection(&self, doc: &mut Value) -> Result<(), EvalError> {
        match self {
            Footprint::Root(_) => match doc {
                Value::Object(_) => Ok(()),
                other => Err(EvalError::NotAnObject((&*other).into())),
            },
            Footprint::Map(m) => {
                let obj = as_object_mut(m.path.resolve_on_mut(doc)?)?;
                for sk in &m.keys {
                    let Some(existing) = obj.get(&sk.key) else {
                        return Err(EvalError::MissingKey(sk.key.clone()));
                    };
                    if existing.is_object() {
                        continue;
                    }
                    if !sk.info.is_virtual {
                        return Err(EvalError::NotAnObject(existing.into()));
                    }
                    obj.insert(sk.key.clone(), Value::Object(Map::new()));
                }
                Ok(())
            }
            Footprint::Array(a) => {
                let arr = as_array_mut(a.path.resolve_on_mut(doc)?)?;
                for si in &a.indexes {
                    let existing = arr
                        .get_mut(si.index)
                        .ok_or(EvalError::IndexOutOfBounds(si.index))?;
                    if existing.is_object() {
                        continue;
                    }
                    if !si.info.is_virtual {
                        return Err(EvalError::NotAnObject((&*existing).into()));
                    }
                    *existing = Value::Object(Map::new());
                }
                Ok(())
            }
            Footprint::NonRef(_) => Err(EvalError::Unsupported {
                op: "enforce_object_selection",
                on: "scalar",
            }),
        }
    }

    /// Ensure every selected child is an array of at least `size` entries,
    /// growing with nulls or materializing virtual selections as needed.
    /// `size == -1` means "whatever is there" (a wildcard), which cannot
    /// materialize anything. Records each entry's pre-growth length.
    pub fn enforce_array_selection(&mut self, doc: &mut Value, size: i64) -> Result<(), EvalError> {
        match self {
            Footprint::Root(r) => match doc {
                Value::Array(arr) => {
                    r.info.real_size = arr.len() as i64;
                    grow(arr, size);
                    Ok(())
                }
                other => Err(EvalError::NotAnArray((&*other).into())),
            },
            Footprint::Map(m) => {
                let obj = as_object_mut(m.path.resolve_on_mut(doc)?)?;
                for sk in &mut m.keys {
                    let Some(existing) = obj.get_mut(&sk.key) else {
                        return Err(EvalError::MissingKey(sk.key.clone()));
                    };
                    enforce_entry(existing, &mut sk.info, size)?;
                }
                Ok(())
            }
            Footprint::Array(a) => {
                let arr = as_array_mut(a.path.resolve_on_mut(doc)?)?;
                for si in &mut a.indexes {
                    let existing = arr
                        .get_mut(si.index)
                        .ok_or(EvalError::IndexOutOfBounds(si.index))?;
                    enforce_entry(existing, &mut si.info, size)?;
                }
                Ok(())
            }
            Footprint::NonRef(_) => Err(EvalError::Unsupported {
                op: "enforce_array_selection",
                on: "scalar",
            }),
        }
    }
}

fn enforce_entry(existing: &mut Value, info: &mut VirtualInfo, size: i64) -> Result<(), EvalError> {
    match existing {
        Value::Array(arr) => {
            info.real_size = arr.len() as i64;
            grow(arr, size);
        }
        other => {
            if !info.is_virtual {
                return Err(EvalError::NotAnArray((&*other).into()));
            }
            // Covers the wildcard sentinel and negative pre-sizes alike; a
            // virtual selection can only be materialized to a known extent.
            if size < 0 {
                return Err(EvalError::WildcardOnVirtual);
            }
            info.real_size = -1;
            *other = Value::Array(vec![Value::Null; size as usize]);
        }
    }
    Ok(())
}

fn grow(arr: &mut Vec<Value>, size: i64) {
    if size != -1 && (arr.len() as i64) < size {
        arr.resize(size as usize, Value::Null);
    }
}

fn as_object(value: &Value) -> Result<&Map<String, Value>, EvalError> {
    value.as_object().ok_or_else(|| EvalError::PathType {
        expected: JsonTy::Object,
        actual: value.into(),
    })
}

fn as_object_mut(value: &mut Value) -> Result<&mut Map<String, Value>, EvalError> {
    let actual = JsonTy::from(&*value);
    value.as_object_mut().ok_or(EvalError::PathType {
        expected: JsonTy::Object,
        actual,
    })
}

fn as_array(value: &Value) -> Result<&Vec<Value>, EvalError> {
    value.as_array().ok_or_else(|| EvalError::PathType {
        expected: JsonTy::Array,
        actual: value.into(),
    })
}

fn as_array_mut(value: &mut Value) -> Result<&mut Vec<Value>, EvalError> {
    let actual = JsonTy::from(&*value);
    value.as_array_mut().ok_or(EvalError::PathType {
        expected: JsonTy::Array,
        actual,
    })
}
