//! Evaluation of a compiled expression against a document.
//!
//! Each segment maps the current footprint set to a new one. Write mode
//! runs the same walk with a mutable document handle, which is what lets
//! field and index segments materialize missing containers before
//! selecting into them.

use log::warn;
use serde_json::{Map, Value};

use crate::ast::{FilterNode, Node, ParamEntry};
use crate::cmp;
use crate::error::{EvalError, JsonTy};
use crate::footprint::{
    ArrayFootprint, Footprint, MapFootprint, SelectionIndex, SelectionKey, VirtualInfo,
};
use crate::idx::IdxPath;

/// The document under evaluation. Read mode can never mutate, by type.
pub(crate) enum DocHandle<'a> {
    Read(&'a Value),
    Write(&'a mut Value),
}

pub(crate) struct EvalCtx<'a> {
    doc: DocHandle<'a>,
    warnings: Vec<String>,
}

impl<'a> EvalCtx<'a> {
    pub fn read(doc: &'a Value) -> EvalCtx<'a> {
        EvalCtx {
            doc: DocHandle::Read(doc),
            warnings: Vec::new(),
        }
    }

    pub fn write(doc: &'a mut Value) -> EvalCtx<'a> {
        EvalCtx {
            doc: DocHandle::Write(doc),
            warnings: Vec::new(),
        }
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }

    fn write_mode(&self) -> bool {
        matches!(self.doc, DocHandle::Write(_))
    }

    fn doc(&self) -> &Value {
        match &self.doc {
            DocHandle::Read(doc) => doc,
            DocHandle::Write(doc) => doc,
        }
    }

    fn doc_mut(&mut self) -> Result<&mut Value, EvalError> {
        match &mut self.doc {
            DocHandle::Write(doc) => Ok(doc),
            DocHandle::Read(_) => Err(EvalError::ReadOnly),
        }
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Evaluate the whole expression and dereference the matches.
    pub fn get(&mut self, segments: &[Node]) -> Result<Vec<Value>, EvalError> {
        let fps = self.find_result(segments)?;
        let fps = expand_footprints(fps, self.doc(), true);
        fps.iter().map(|fp| fp.value_of(self.doc())).collect()
    }

    /// Evaluate the whole expression and write a clone of `change` into
    /// every matched location.
    pub fn set(&mut self, segments: &[Node], change: &Value) -> Result<(), EvalError> {
        let fps = self.find_result(segments)?;
        for fp in fps {
            fp.update_all(self.doc_mut()?, change)?;
        }
        Ok(())
    }

    /// Evaluate the whole expression and return the location of every
    /// matched selection. Owned scalars (filter literals) have none.
    pub fn matched_paths(&mut self, segments: &[Node]) -> Result<Vec<IdxPath>, EvalError> {
        let fps = self.find_result(segments)?;
        Ok(fps.iter().flat_map(Footprint::selected_paths).collect())
    }

    fn find_result(&mut self, segments: &[Node]) -> Result<Vec<Footprint>, EvalError> {
        self.eval_list(vec![Footprint::root()], segments)
    }

    fn eval_list(
        &mut self,
        mut fps: Vec<Footprint>,
        nodes: &[Node],
    ) -> Result<Vec<Footprint>, EvalError> {
        for node in nodes {
            fps = self.walk(fps, node)?;
        }
        Ok(fps)
    }

    fn walk(&mut self, fps: Vec<Footprint>, node: &Node) -> Result<Vec<Footprint>, EvalError> {
        match node {
            Node::List(nodes) => self.eval_list(fps, nodes),
            Node::Field(name) => self.eval_field(fps, name),
            Node::Wildcard => self.eval_wildcard(fps),
            Node::Recursive => self.eval_recursive(fps),
            Node::Slice(params) => self.eval_slice(fps, params),
            Node::Element(entry) => self.eval_element(fps, *entry),
            Node::Union(children) => self.eval_union(fps, children),
            Node::Filter(filter) => self.eval_filter(fps, filter),
            Node::Int(i) => self.eval_literal(fps, Value::from(*i)),
            Node::Float(f) => self.eval_literal(fps, Value::from(*f)),
            Node::Bool(b) => self.eval_literal(fps, Value::from(*b)),
            other @ (Node::Text(_) | Node::Ident(_)) => {
                Err(EvalError::UnexpectedNode(other.kind()))
            }
        }
    }

    fn eval_field(
        &mut self,
        fps: Vec<Footprint>,
        name: &str,
    ) -> Result<Vec<Footprint>, EvalError> {
        if self.write_mode() {
            for fp in &fps {
                fp.enforce_object_selection(self.doc_mut()?)?;
            }
        }
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in fps {
            match fp {
                Footprint::Map(m) => {
                    let exists = m
                        .path
                        .resolve_on(self.doc())?
                        .as_object()
                        .is_some_and(|obj| obj.contains_key(name));
                    if exists {
                        result.push(Footprint::Map(MapFootprint {
                            path: m.path,
                            keys: vec![SelectionKey {
                                key: name.to_string(),
                                info: VirtualInfo::default(),
                            }],
                            leave_as_is: false,
                        }));
                    } else if self.write_mode() {
                        match m.path.resolve_on_mut(self.doc_mut()?)? {
                            Value::Object(obj) => {
                                obj.insert(name.to_string(), Value::Object(Map::new()));
                            }
                            other => {
                                return Err(EvalError::PathType {
                                    expected: JsonTy::Object,
                                    actual: (&*other).into(),
                                })
                            }
                        }
                        result.push(Footprint::Map(MapFootprint {
                            path: m.path,
                            keys: vec![SelectionKey {
                                key: name.to_string(),
                                info: VirtualInfo::virtual_entry(),
                            }],
                            leave_as_is: false,
                        }));
                    } else {
                        self.warn(format!("cannot find the field: {name}"));
                    }
                }
                _ => self.warn(format!(
                    "cannot use field {name} to select from a non-object value"
                )),
            }
        }
        Ok(result)
    }

    fn eval_wildcard(&mut self, fps: Vec<Footprint>) -> Result<Vec<Footprint>, EvalError> {
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in fps {
            match fp.select_all(self.doc()) {
                Ok(selected) => result.push(selected),
                Err(_) => {
                    warn!("wildcard is only supported by objects and arrays");
                    self.warn("wildcard is only supported by objects and arrays");
                    result.push(fp);
                }
            }
        }
        Ok(result)
    }

    fn eval_recursive(&mut self, fps: Vec<Footprint>) -> Result<Vec<Footprint>, EvalError> {
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in &fps {
            self.collect_recursive(fp, &mut result);
        }
        Ok(result)
    }

    /// Pre-order walk emitting a `leave_as_is` copy of every visited
    /// footprint, the starting one included.
    fn collect_recursive(&self, fp: &Footprint, result: &mut Vec<Footprint>) {
        result.push(fp.leave_as_is());
        let Ok(selected) = fp.select_all(self.doc()) else {
            return;
        };
        let children = selected.expand(self.doc()).unwrap_or_default();
        for child in &children {
            self.collect_recursive(child, result);
        }
    }

    fn eval_slice(
        &mut self,
        fps: Vec<Footprint>,
        params: &[ParamEntry; 3],
    ) -> Result<Vec<Footprint>, EvalError> {
        let mut fps = fps;
        if self.write_mode() {
            let start = if params[0].known { params[0].value } else { 0 };
            let mut tail = if params[1].known {
                params[1].value
            } else {
                start + 1
            };
            if start == 0 && params[1].value == 0 && params[2].value == 0 {
                // Indistinguishable from a full-range slice; size like a wildcard.
                tail = -1;
            }
            for fp in &mut fps {
                fp.enforce_array_selection(self.doc_mut()?, tail)?;
            }
        }
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in fps {
            match fp {
                Footprint::Array(afp) => {
                    let len = afp
                        .path
                        .resolve_on(self.doc())?
                        .as_array()
                        .map_or(0, Vec::len) as i64;
                    let (base, limit, step, invert) = infer_slice(len, params);
                    let real_size = afp.info.real_size;
                    let mut indexes = Vec::new();
                    let mut i = base;
                    loop {
                        let within = if invert { i > limit } else { i < limit };
                        if !(i < len && i > -1 && within) {
                            break;
                        }
                        indexes.push(SelectionIndex {
                            index: i as usize,
                            info: VirtualInfo {
                                is_virtual: self.write_mode() && i >= real_size,
                                real_size: -1,
                            },
                        });
                        i += step;
                    }
                    result.push(Footprint::Array(ArrayFootprint {
                        path: afp.path,
                        indexes,
                        info: afp.info,
                        leave_as_is: false,
                    }));
                }
                _ => self.warn("cannot use an index to select from a non-array value"),
            }
        }
        Ok(result)
    }

    fn eval_element(
        &mut self,
        fps: Vec<Footprint>,
        entry: ParamEntry,
    ) -> Result<Vec<Footprint>, EvalError> {
        let mut fps = fps;
        if self.write_mode() {
            if entry.value < 0 {
                return Err(EvalError::NegativeIndex);
            }
            if !entry.known {
                return Err(EvalError::UnknownIndex);
            }
            for fp in &mut fps {
                fp.enforce_array_selection(self.doc_mut()?, entry.value + 1)?;
            }
        }
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in fps {
            match fp {
                Footprint::Array(afp) => {
                    let len = afp
                        .path
                        .resolve_on(self.doc())?
                        .as_array()
                        .map_or(0, Vec::len) as i64;
                    let real_size = afp.info.real_size;
                    let mut i = -1;
                    if entry.value >= 0 && entry.value <= len - 1 {
                        i = entry.value;
                    } else if entry.value >= -len {
                        i = entry.value + len;
                    }
                    let mut indexes = Vec::new();
                    if i >= 0 && i < len {
                        indexes.push(SelectionIndex {
                            index: i as usize,
                            info: VirtualInfo {
                                is_virtual: self.write_mode() && i >= real_size,
                                real_size: -1,
                            },
                        });
                    }
                    result.push(Footprint::Array(ArrayFootprint {
                        path: afp.path,
                        indexes,
                        info: afp.info,
                        leave_as_is: false,
                    }));
                }
                _ => self.warn("cannot use an index to select from a non-array value"),
            }
        }
        Ok(result)
    }

    fn eval_union(
        &mut self,
        fps: Vec<Footprint>,
        children: &[Vec<Node>],
    ) -> Result<Vec<Footprint>, EvalError> {
        let mut result = Vec::new();
        for child in children {
            result.extend(self.eval_list(fps.clone(), child)?);
        }
        Ok(result)
    }

    fn eval_filter(
        &mut self,
        fps: Vec<Footprint>,
        filter: &FilterNode,
    ) -> Result<Vec<Footprint>, EvalError> {
        let fps = expand_footprints(fps, self.doc(), false);
        let mut result = Vec::new();
        for fp in fps {
            let Ok(selected) = fp.select_all(self.doc()) else {
                continue;
            };
            let elements = selected.expand(self.doc()).unwrap_or_default();
            for element in elements {
                let element = element.leave_as_is();
                let lefts = self.eval_list(vec![element.clone()], &filter.left);
                if filter.op == "exists" {
                    // A failed sub-evaluation counts as "no result" here.
                    if matches!(&lefts, Ok(found) if !found.is_empty()) {
                        result.push(element);
                    }
                    continue;
                }

                let lefts = expand_footprints(lefts?, self.doc(), true);
                if lefts.is_empty() {
                    continue;
                }
                if lefts.len() > 1 {
                    return Err(EvalError::MultiResultCompare);
                }
                let left = lefts[0].value_of(self.doc())?;

                let rights = self.eval_list(vec![element.clone()], &filter.right)?;
                let rights = expand_footprints(rights, self.doc(), true);
                if rights.is_empty() {
                    continue;
                }
                if rights.len() > 1 {
                    return Err(EvalError::MultiResultCompare);
                }
                let right = rights[0].value_of(self.doc())?;

                match cmp::compare(&filter.op, &left, &right) {
                    Ok(true) => result.push(element),
                    Ok(false) => {}
                    Err(err) => self.warn(err.to_string()),
                }
            }
        }
        Ok(result)
    }

    /// Literal nodes inside filters yield one owned scalar footprint per
    /// incoming footprint, keeping comparison sides paired one to one.
    fn eval_literal(
        &mut self,
        fps: Vec<Footprint>,
        value: Value,
    ) -> Result<Vec<Footprint>, EvalError> {
        let fps = expand_footprints(fps, self.doc(), false);
        Ok(fps.iter().map(|_| Footprint::scalar(value.clone())).collect())
    }
}

/// Expand every footprint one level. A footprint that refuses expansion (an
/// owned scalar) is kept as-is when `keep_scalars` is set and dropped
/// otherwise; filter comparison sides and the final dereference keep them.
fn expand_footprints(fps: Vec<Footprint>, doc: &Value, keep_scalars: bool) -> Vec<Footprint> {
    let mut result = Vec::new();
    for fp in fps {
        match fp.expand(doc) {
            Ok(children) => result.extend(children),
            Err(_) if keep_scalars => result.push(fp),
            Err(_) => {}
        }
    }
    result
}

/// Resolve slice parameters against a concrete array length, yielding the
/// loop bounds. A zero step is coerced to one; a negative step walks
/// backwards with an exclusive lower limit.
fn infer_slice(len: i64, params: &[ParamEntry; 3]) -> (i64, i64, i64, bool) {
    let (x, y, z) = (params[0], params[1], params[2]);

    let mut step = if z.known { z.value } else { 0 };
    let mut invert = false;
    if step == 0 {
        step = 1;
    } else if step < 0 {
        invert = true;
    }

    let mut base = if x.value > len - 1 {
        if step < 0 {
            len - 1
        } else {
            x.value
        }
    } else if x.value >= 0 {
        x.value
    } else if x.value >= -len {
        x.value + len
    } else {
        0
    };

    let mut limit = if y.value >= 0 {
        y.value
    } else if y.value >= -len {
        y.value + len
    } else {
        -1
    };

    if !x.known {
        base = if step > 0 { 0 } else { len - 1 };
    }
    if !y.known {
        limit = if step > 0 { len } else { -1 };
    }

    (base, limit, step, invert)
}
