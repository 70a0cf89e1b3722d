use super::ast::{Comparison, Condition, Filter, Literal, PathSegment};
use super::error::YamlPathError;
use crate::document::node::{tags, NodeKind};
use crate::document::tree::{NodeId, PathRoot, YamlTree};
use indexmap::IndexSet;

/// Evaluates parsed YAMLPath segments against one document of a tree.
///
/// Results are node ids in document order of discovery, without duplicates.
/// Alias nodes are treated as leaves: evaluation never follows them into
/// their anchors.
pub struct Evaluator<'a> {
    tree: &'a YamlTree,
    root: Option<PathRoot>,
}

impl<'a> Evaluator<'a> {
    /// Creates an evaluator rooted at `root`.
    ///
    /// When `root` is a document node, `$` refers to the document's content.
    pub fn new(tree: &'a YamlTree, root: NodeId) -> Result<Self, YamlPathError> {
        Self::with_root(tree, PathRoot::Node(root))
    }

    /// Creates an evaluator for any [`PathRoot`], including a lone key/value
    /// pair standing for a one-entry mapping.
    pub fn with_root(tree: &'a YamlTree, root: PathRoot) -> Result<Self, YamlPathError> {
        let root = match root {
            PathRoot::Node(id) => {
                let node = tree.get(id).ok_or(YamlPathError::UnknownNode(id))?;
                match node.kind {
                    NodeKind::Document => node.content.first().copied().map(PathRoot::Node),
                    _ => Some(root),
                }
            }
            PathRoot::Pair { key, value } => {
                for id in [key, value] {
                    if !tree.contains(id) {
                        return Err(YamlPathError::UnknownNode(id));
                    }
                }
                Some(root)
            }
        };
        Ok(Evaluator { tree, root })
    }

    pub fn evaluate(&self, segments: &[PathSegment]) -> Vec<NodeId> {
        let Some(root) = self.root else {
            return vec![];
        };
        if segments.is_empty() {
            return vec![];
        }

        let (mut current, segments): (IndexSet<NodeId>, &[PathSegment]) = match root {
            PathRoot::Node(node) => (IndexSet::from([node]), segments),
            PathRoot::Pair { key, value } => {
                // `$` has no node, so the step after it reads the pair itself.
                let rest = match segments.split_first() {
                    Some((PathSegment::Root, rest)) => rest,
                    _ => segments,
                };
                let Some((first, rest)) = rest.split_first() else {
                    return vec![];
                };
                (self.pair_segment(key, value, first).into_iter().collect(), rest)
            }
        };

        for segment in segments {
            let mut next = IndexSet::new();
            for node in &current {
                next.extend(self.evaluate_segment(*node, segment));
            }
            current = next;
        }

        current.into_iter().collect()
    }

    /// Applies `segment` to the one-entry mapping `{key: value}`.
    fn pair_segment(&self, key: NodeId, value: NodeId, segment: &PathSegment) -> Vec<NodeId> {
        let selected = match segment {
            PathSegment::Child(name) => self.key_matches(key, name),
            PathSegment::MultiProperty(names) => names.iter().any(|n| self.key_matches(key, n)),
            PathSegment::Wildcard => true,
            PathSegment::Filter(filter) => self.filter_matches(value, filter),
            PathSegment::RecursiveDescent(prop) => {
                let mut results = Vec::new();
                if prop.as_deref().map_or(true, |name| self.key_matches(key, name)) {
                    results.push(value);
                }
                self.walk(value, prop.as_deref(), &mut results);
                return results;
            }
            PathSegment::DescendantOrSelf => {
                let mut results = vec![value];
                self.walk(value, None, &mut results);
                return results;
            }
            PathSegment::Root
            | PathSegment::Current
            | PathSegment::Index(_)
            | PathSegment::Slice(..) => false,
        };
        if selected {
            vec![value]
        } else {
            vec![]
        }
    }

    fn evaluate_segment(&self, node: NodeId, segment: &PathSegment) -> Vec<NodeId> {
        match segment {
            PathSegment::Root => match self.root {
                Some(PathRoot::Node(root)) => vec![root],
                _ => vec![],
            },
            PathSegment::Current => vec![node],
            PathSegment::Child(name) => self.find_child(node, name),
            PathSegment::Index(idx) => self.get_sequence_element(node, *idx),
            PathSegment::Wildcard => self.get_all_children(node),
            PathSegment::RecursiveDescent(prop) => {
                let mut results = Vec::new();
                self.walk(node, prop.as_deref(), &mut results);
                results
            }
            PathSegment::DescendantOrSelf => {
                let mut results = vec![node];
                self.walk(node, None, &mut results);
                results
            }
            PathSegment::Slice(start, end) => self.get_slice(node, *start, *end),
            PathSegment::MultiProperty(props) => props
                .iter()
                .flat_map(|prop| self.find_child(node, prop))
                .collect(),
            PathSegment::Filter(filter) => self
                .get_all_children(node)
                .into_iter()
                .filter(|child| self.filter_matches(*child, filter))
                .collect(),
        }
    }

    fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.tree.get(node).map(|n| n.kind)
    }

    fn find_child(&self, node: NodeId, name: &str) -> Vec<NodeId> {
        self.tree
            .pairs(node)
            .filter(|(key, _)| self.key_matches(*key, name))
            .map(|(_, value)| value)
            .collect()
    }

    fn key_matches(&self, key: NodeId, name: &str) -> bool {
        self.tree
            .get(key)
            .map(|k| k.kind == NodeKind::Scalar && k.value == name)
            .unwrap_or(false)
    }

    fn get_sequence_element(&self, node: NodeId, idx: isize) -> Vec<NodeId> {
        if self.kind(node) != Some(NodeKind::Sequence) {
            return vec![];
        }
        let items = self.tree.children(node);
        let len = items.len() as isize;
        let normalized_idx = if idx < 0 { len + idx } else { idx };
        if normalized_idx >= 0 && normalized_idx < len {
            vec![items[normalized_idx as usize]]
        } else {
            vec![]
        }
    }

    fn get_all_children(&self, node: NodeId) -> Vec<NodeId> {
        match self.kind(node) {
            Some(NodeKind::Mapping) => self.tree.pairs(node).map(|(_, v)| v).collect(),
            Some(NodeKind::Sequence) => self.tree.children(node).to_vec(),
            _ => vec![],
        }
    }

    fn get_slice(&self, node: NodeId, start: Option<isize>, end: Option<isize>) -> Vec<NodeId> {
        if self.kind(node) != Some(NodeKind::Sequence) {
            return vec![];
        }
        let items = self.tree.children(node);
        let len = items.len() as isize;

        let start_idx = match start {
            Some(s) if s < 0 => (len + s).max(0) as usize,
            Some(s) => s.min(len) as usize,
            None => 0,
        };
        let end_idx = match end {
            Some(e) if e < 0 => (len + e).max(0) as usize,
            Some(e) => e.min(len) as usize,
            None => len as usize,
        };

        if start_idx <= end_idx {
            items[start_idx..end_idx].to_vec()
        } else {
            vec![]
        }
    }

    /// Collects descendants of `node` in document order.
    ///
    /// With a property name only values stored under that key are collected.
    fn walk(&self, node: NodeId, prop: Option<&str>, results: &mut Vec<NodeId>) {
        match self.kind(node) {
            Some(NodeKind::Mapping) => {
                for (key, value) in self.tree.pairs(node) {
                    if prop.map(|name| self.key_matches(key, name)).unwrap_or(true) {
                        results.push(value);
                    }
                    self.walk(value, prop, results);
                }
            }
            Some(NodeKind::Sequence) => {
                for item in self.tree.children(node) {
                    if prop.is_none() {
                        results.push(*item);
                    }
                    self.walk(*item, prop, results);
                }
            }
            _ => {}
        }
    }

    fn filter_matches(&self, candidate: NodeId, filter: &Filter) -> bool {
        let mut target = Some(candidate);
        for key in &filter.path {
            target = target.and_then(|node| self.find_child(node, key).into_iter().next());
        }
        let Some(target) = target else {
            return false;
        };
        match &filter.condition {
            None => true,
            Some(condition) => self.condition_matches(target, condition),
        }
    }

    fn condition_matches(&self, target: NodeId, condition: &Condition) -> bool {
        let Some(node) = self.tree.get(target) else {
            return false;
        };
        if node.kind != NodeKind::Scalar {
            return false;
        }
        match condition {
            Condition::Matches(pattern) => pattern.is_match(&node.value),
            Condition::Compare(op, literal) => {
                let ordering = match literal {
                    Literal::Number(expected) => {
                        if node.tag != tags::INT && node.tag != tags::FLOAT {
                            return *op == Comparison::Ne;
                        }
                        match node.value.parse::<f64>() {
                            Ok(actual) => actual.partial_cmp(expected),
                            Err(_) => return *op == Comparison::Ne,
                        }
                    }
                    Literal::String(expected) => Some(node.value.as_str().cmp(expected.as_str())),
                    Literal::Bool(expected) => {
                        let actual = node.tag == tags::BOOL && node.value.eq_ignore_ascii_case("true");
                        let same = node.tag == tags::BOOL && actual == *expected;
                        return compare_equality(*op, same);
                    }
                    Literal::Null => return compare_equality(*op, node.tag == tags::NULL),
                };
                match ordering {
                    Some(ordering) => match op {
                        Comparison::Eq => ordering.is_eq(),
                        Comparison::Ne => ordering.is_ne(),
                        Comparison::Lt => ordering.is_lt(),
                        Comparison::Le => ordering.is_le(),
                        Comparison::Gt => ordering.is_gt(),
                        Comparison::Ge => ordering.is_ge(),
                    },
                    None => *op == Comparison::Ne,
                }
            }
        }
    }
}

fn compare_equality(op: Comparison, same: bool) -> bool {
    match op {
        Comparison::Eq => same,
        Comparison::Ne => !same,
        _ => false,
    }
}
