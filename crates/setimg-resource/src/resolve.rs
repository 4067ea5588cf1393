//! Field path resolution
//!
//! [`resolve`] walks a compiled [`FieldSelector`] over a [`Resource`] and
//! yields every string scalar the pattern reaches, each tagged with its
//! concrete [`FieldPath`].

use crate::document::Resource;
use crate::fieldspec::{FieldSelector, PathSegment};
use crate::path::FieldPath;
use serde_yaml::Value;

/// A string scalar reached by a field selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeLocation<'a> {
    /// Concrete path of the node
    pub path: FieldPath,
    /// Current scalar value
    pub value: &'a str,
}

/// Lazy traversal produced by [`resolve`]
///
/// Yields locations in document order: mapping entries in insertion order,
/// sequence elements by position. Missing keys, type mismatches and
/// non-string terminals simply produce nothing for that branch.
#[derive(Debug)]
pub struct Locations<'a> {
    pattern: &'a [PathSegment],
    stack: Vec<(&'a Value, usize, FieldPath)>,
}

impl<'a> Locations<'a> {
    fn new(pattern: &'a [PathSegment], root: Option<&'a Value>) -> Self {
        Self {
            pattern,
            stack: root
                .map(|r| vec![(r, 0, FieldPath::root())])
                .unwrap_or_default(),
        }
    }
}

impl<'a> Iterator for Locations<'a> {
    type Item = NodeLocation<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth, path)) = self.stack.pop() {
            let Some(segment) = self.pattern.get(depth) else {
                if let Value::String(value) = node {
                    return Some(NodeLocation { path, value });
                }
                continue;
            };

            match (segment, node) {
                (PathSegment::Key(key), Value::Mapping(map)) => {
                    if let Some(child) = map.get(key.as_str()) {
                        self.stack.push((child, depth + 1, path.child_key(key.as_str())));
                    }
                }
                (PathSegment::AnyElement, Value::Sequence(seq)) => {
                    // Reverse push keeps pops in document order.
                    for (index, child) in seq.iter().enumerate().rev() {
                        self.stack.push((child, depth + 1, path.child_index(index)));
                    }
                }
                (PathSegment::AnyValue, Value::Mapping(map)) => {
                    let children: Vec<_> = map
                        .iter()
                        .filter_map(|(k, v)| k.as_str().map(|k| (k, v)))
                        .collect();
                    for (key, child) in children.into_iter().rev() {
                        self.stack.push((child, depth + 1, path.child_key(key)));
                    }
                }
                _ => {}
            }
        }
        None
    }
}

/// Resolve a selector against a resource
///
/// Yields nothing when the selector's group/version/kind does not match.
#[must_use]
pub fn resolve<'a>(selector: &'a FieldSelector, resource: &'a Resource) -> Locations<'a> {
    let id = resource.id();
    let root = selector
        .gvk()
        .selects(&id.api_version, &id.kind)
        .then(|| resource.tree());
    Locations::new(selector.pattern(), root)
}
