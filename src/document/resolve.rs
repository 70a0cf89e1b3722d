//! Conversion of tree nodes into `serde_yaml` values.
//!
//! Resolution follows aliases and applies merge keys the way YAML loaders
//! do: keys written in the mapping itself win over merged keys, and among
//! several merge sources the first one listed wins. The result is the
//! effective data a consumer sees, which makes it the natural way to check
//! what a merge-key rewrite actually changed.

use super::node::{tags, NodeKind, YamlNode};
use super::tree::{NodeId, YamlTree};
use serde_yaml::{Mapping, Number, Value};
use std::collections::HashSet;
use thiserror::Error;

/// Errors raised while resolving a node into a value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("node {0} does not belong to the tree")]
    UnknownNode(NodeId),
    #[error("alias {0} has no target")]
    DanglingAlias(NodeId),
    #[error("alias cycle through node {0}")]
    AliasCycle(NodeId),
    #[error("merge value {0} is not a mapping or a list of mappings")]
    InvalidMerge(NodeId),
}

/// Resolves `id` into a `serde_yaml::Value`.
///
/// # Example
///
/// ```
/// use yamlwalk::document::parser::parse_yaml;
/// use yamlwalk::document::resolve::resolve;
///
/// let tree = parse_yaml("base: &b {x: 1}\nchild:\n  <<: *b\n  y: 2\n").unwrap();
/// let value = resolve(&tree, tree.documents()[0]).unwrap();
/// assert_eq!(value["child"]["x"], serde_yaml::Value::from(1));
/// ```
pub fn resolve(tree: &YamlTree, id: NodeId) -> Result<Value, ResolveError> {
    Resolver {
        tree,
        active: HashSet::new(),
    }
    .value(id)
}

struct Resolver<'t> {
    tree: &'t YamlTree,
    active: HashSet<NodeId>,
}

impl<'t> Resolver<'t> {
    fn node(&self, id: NodeId) -> Result<&'t YamlNode, ResolveError> {
        self.tree.get(id).ok_or(ResolveError::UnknownNode(id))
    }

    fn value(&mut self, id: NodeId) -> Result<Value, ResolveError> {
        let node = self.node(id)?;
        match node.kind {
            NodeKind::Document => match node.content.first() {
                Some(content) => self.value(*content),
                None => Ok(Value::Null),
            },
            NodeKind::Scalar => Ok(scalar_value(node)),
            NodeKind::Alias => {
                let target = node.alias.ok_or(ResolveError::DanglingAlias(id))?;
                if !self.active.insert(target) {
                    return Err(ResolveError::AliasCycle(target));
                }
                let value = self.value(target);
                self.active.remove(&target);
                value
            }
            NodeKind::Sequence => {
                let items = node.content.clone();
                items
                    .into_iter()
                    .map(|item| self.value(item))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Value::Sequence)
            }
            NodeKind::Mapping => self.mapping(id),
        }
    }

    fn mapping(&mut self, id: NodeId) -> Result<Value, ResolveError> {
        let pairs: Vec<(NodeId, NodeId)> = self.tree.pairs(id).collect();
        let mut result = Mapping::new();
        let mut merges = Vec::new();
        for (key, value) in pairs {
            if self.node(key)?.is_merge_key() {
                merges.push(value);
                continue;
            }
            let key = self.value(key)?;
            let value = self.value(value)?;
            result.insert(key, value);
        }

        for merge in merges {
            for source in self.merge_sources(merge)? {
                for (key, value) in source {
                    if !result.contains_key(&key) {
                        result.insert(key, value);
                    }
                }
            }
        }
        Ok(Value::Mapping(result))
    }

    /// Mappings contributed by one merge value, in priority order.
    fn merge_sources(&mut self, merge: NodeId) -> Result<Vec<Mapping>, ResolveError> {
        let targets = match self.node(merge)?.kind {
            NodeKind::Sequence => self.node(merge)?.content.clone(),
            _ => vec![merge],
        };
        targets
            .into_iter()
            .map(|target| match self.value(target)? {
                Value::Mapping(mapping) => Ok(mapping),
                _ => Err(ResolveError::InvalidMerge(merge)),
            })
            .collect()
    }
}

fn scalar_value(node: &YamlNode) -> Value {
    let text = node.value.as_str();
    match node.tag.as_str() {
        tags::NULL => Value::Null,
        tags::BOOL => Value::Bool(text.eq_ignore_ascii_case("true")),
        tags::INT => parse_int(text)
            .map(|i| Value::Number(Number::from(i)))
            .unwrap_or_else(|| Value::String(text.to_string())),
        tags::FLOAT => parse_float(text)
            .map(|f| Value::Number(Number::from(f)))
            .unwrap_or_else(|| Value::String(text.to_string())),
        _ => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<i64> {
    if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(oct) = text.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else {
        text.parse().ok()
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}
