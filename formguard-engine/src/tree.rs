//! The field tree host.
//!
//! The engine never keeps its own copy of values or interaction flags; it
//! reads and writes them through [`FieldHost`]. [`FieldTree`] is the
//! in-process implementation: a uniform tree of fields and groups addressed
//! by dot paths, with numeric segments for array items.

use formguard_rules::ValueSource;
use formguard_types::{
    Error as TypesError, ErrorEntry, FieldPath, FieldValue, Result as TypesResult,
    ValidationSnapshot,
};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// What the engine needs from whoever owns the fields.
pub trait FieldHost: ValueSource + Send {
    /// Stores a new value. `false` when `path` is not a field.
    fn set_value(&mut self, path: &FieldPath, value: FieldValue) -> bool;

    /// `false` when `path` is not a field.
    fn mark_dirty(&mut self, path: &FieldPath) -> bool;

    /// Marks a field or group as visited. `false` when `path` does not exist.
    fn mark_touched(&mut self, path: &FieldPath) -> bool;

    fn is_dirty(&self, path: &FieldPath) -> bool;

    fn is_touched(&self, path: &FieldPath) -> bool;

    /// Marks every field and group as touched.
    fn mark_all_touched(&mut self);

    /// Stores the engine's latest result.
    fn apply_snapshot(&mut self, snapshot: &ValidationSnapshot);

    /// Every field path, depth first in insertion order.
    fn field_paths(&self) -> Vec<FieldPath>;
}

/// One leaf value slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Field {
    pub value: FieldValue,
    pub dirty: bool,
    pub touched: bool,
    /// Entries from the last applied snapshot.
    pub errors: Vec<ErrorEntry>,
    /// Whether a remote check was outstanding in the last applied snapshot.
    pub pending: bool,
}

impl Field {
    pub fn new(value: impl Into<FieldValue>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// A named collection of fields and nested groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Group {
    pub children: Vec<(String, FieldNode)>,
    pub touched: bool,
}

impl Group {
    fn child(&self, name: &str) -> Option<&FieldNode> {
        self.children.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut FieldNode> {
        self.children
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    fn touch_all(&mut self) {
        self.touched = true;
        for (_, child) in &mut self.children {
            match child {
                FieldNode::Field(field) => field.touched = true,
                FieldNode::Group(group) => group.touch_all(),
            }
        }
    }

    fn walk<'a>(&'a self, prefix: Option<&FieldPath>, f: &mut dyn FnMut(FieldPath, &'a Field)) {
        for (name, child) in &self.children {
            let path = match prefix {
                Some(p) => p.child(name),
                None => FieldPath::from_segment(name),
            };
            match child {
                FieldNode::Field(field) => f(path, field),
                FieldNode::Group(group) => group.walk(Some(&path), f),
            }
        }
    }

    fn walk_mut(&mut self, prefix: Option<&FieldPath>, f: &mut dyn FnMut(&FieldPath, &mut Field)) {
        for (name, child) in &mut self.children {
            let path = match prefix {
                Some(p) => p.child(name),
                None => FieldPath::from_segment(name),
            };
            match child {
                FieldNode::Field(field) => f(&path, field),
                FieldNode::Group(group) => group.walk_mut(Some(&path), f),
            }
        }
    }
}

/// A node of the field tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum FieldNode {
    Field(Field),
    Group(Group),
}

/// An in-memory field tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldTree {
    root: Group,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldTree::insert`].
    pub fn with_field(mut self, path: &str, value: impl Into<FieldValue>) -> TypesResult<Self> {
        let path = FieldPath::parse(path)?;
        self.insert(&path, value.into())?;
        Ok(self)
    }

    /// Adds a field, creating intermediate groups. Replaces the value of an
    /// existing field; fails when a prefix of `path` is a field or `path`
    /// itself is a group.
    pub fn insert(&mut self, path: &FieldPath, value: FieldValue) -> TypesResult<()> {
        let segments: Vec<&str> = path.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Err(TypesError::InvalidPath(path.to_string()));
        };
        let mut group = &mut self.root;
        for segment in parents {
            if group.child(segment).is_none() {
                group
                    .children
                    .push(((*segment).to_string(), FieldNode::Group(Group::default())));
            }
            group = match group.child_mut(segment) {
                Some(FieldNode::Group(g)) => g,
                _ => return Err(TypesError::InvalidPath(path.to_string())),
            };
        }
        match group.child_mut(last) {
            Some(FieldNode::Field(field)) => field.value = value,
            Some(FieldNode::Group(_)) => return Err(TypesError::InvalidPath(path.to_string())),
            None => group
                .children
                .push(((*last).to_string(), FieldNode::Field(Field::new(value)))),
        }
        Ok(())
    }

    /// Builds a tree from a JSON document. Objects become groups, arrays
    /// become groups keyed by index, everything else becomes a field.
    pub fn from_json(doc: &JsonValue) -> TypesResult<Self> {
        let mut tree = Self::new();
        if let JsonValue::Object(_) | JsonValue::Array(_) = doc {
            tree.root = group_from_json(doc)?;
        }
        Ok(tree)
    }

    pub fn get(&self, path: &FieldPath) -> Option<&FieldNode> {
        let mut segments = path.segments();
        let mut node = self.root.child(segments.next()?)?;
        for segment in segments {
            node = match node {
                FieldNode::Group(g) => g.child(segment)?,
                FieldNode::Field(_) => return None,
            };
        }
        Some(node)
    }

    fn get_mut(&mut self, path: &FieldPath) -> Option<&mut FieldNode> {
        let mut segments = path.segments();
        let mut node = self.root.child_mut(segments.next()?)?;
        for segment in segments {
            node = match node {
                FieldNode::Group(g) => g.child_mut(segment)?,
                FieldNode::Field(_) => return None,
            };
        }
        Some(node)
    }

    pub fn field(&self, path: &FieldPath) -> Option<&Field> {
        match self.get(path)? {
            FieldNode::Field(f) => Some(f),
            FieldNode::Group(_) => None,
        }
    }

    fn field_mut(&mut self, path: &FieldPath) -> Option<&mut Field> {
        match self.get_mut(path)? {
            FieldNode::Field(f) => Some(f),
            FieldNode::Group(_) => None,
        }
    }

    /// Removes a field or group. Returns the removed node.
    pub fn remove(&mut self, path: &FieldPath) -> Option<FieldNode> {
        let children = match path.parent() {
            Some(parent) => match self.get_mut(&parent)? {
                FieldNode::Group(g) => &mut g.children,
                FieldNode::Field(_) => return None,
            },
            None => &mut self.root.children,
        };
        let index = children.iter().position(|(n, _)| n == path.name())?;
        Some(children.remove(index).1)
    }

    /// Visits every field, depth first in insertion order.
    pub fn walk<'a>(&'a self, mut f: impl FnMut(FieldPath, &'a Field)) {
        self.root.walk(None, &mut f);
    }

    /// Every field's path and errors from the last applied snapshot.
    pub fn errors(&self) -> Vec<(FieldPath, &[ErrorEntry])> {
        let mut out = Vec::new();
        self.walk(|path, field| {
            if !field.errors.is_empty() {
                out.push((path, field.errors.as_slice()));
            }
        });
        out
    }
}

fn group_from_json(doc: &JsonValue) -> TypesResult<Group> {
    let entries: Vec<(String, &JsonValue)> = match doc {
        JsonValue::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        JsonValue::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    };
    let mut group = Group::default();
    for (name, value) in entries {
        if name.is_empty() || name.contains('.') {
            return Err(TypesError::InvalidPath(name));
        }
        let node = match value {
            JsonValue::Object(_) | JsonValue::Array(_) => FieldNode::Group(group_from_json(value)?),
            scalar => FieldNode::Field(Field::new(FieldValue::from_json(scalar))),
        };
        group.children.push((name, node));
    }
    Ok(group)
}

impl ValueSource for FieldTree {
    fn value(&self, path: &FieldPath) -> Option<&FieldValue> {
        self.field(path).map(|f| &f.value)
    }
}

impl FieldHost for FieldTree {
    fn set_value(&mut self, path: &FieldPath, value: FieldValue) -> bool {
        match self.field_mut(path) {
            Some(field) => {
                field.value = value;
                true
            }
            None => false,
        }
    }

    fn mark_dirty(&mut self, path: &FieldPath) -> bool {
        match self.field_mut(path) {
            Some(field) => {
                field.dirty = true;
                true
            }
            None => false,
        }
    }

    fn mark_touched(&mut self, path: &FieldPath) -> bool {
        match self.get_mut(path) {
            Some(FieldNode::Field(field)) => field.touched = true,
            Some(FieldNode::Group(group)) => group.touched = true,
            None => return false,
        }
        true
    }

    fn is_dirty(&self, path: &FieldPath) -> bool {
        self.field(path).is_some_and(|f| f.dirty)
    }

    fn is_touched(&self, path: &FieldPath) -> bool {
        match self.get(path) {
            Some(FieldNode::Field(field)) => field.touched,
            Some(FieldNode::Group(group)) => group.touched,
            None => false,
        }
    }

    fn mark_all_touched(&mut self) {
        self.root.touch_all();
    }

    fn apply_snapshot(&mut self, snapshot: &ValidationSnapshot) {
        self.root.walk_mut(None, &mut |path, field| {
            field.errors = snapshot.errors_for(path).to_vec();
            field.pending = snapshot.is_pending(path);
        });
    }

    fn field_paths(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        self.walk(|path, _| out.push(path));
        out
    }
}
