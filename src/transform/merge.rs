//! Collapsing of repeated `<<` merge keys.

use crate::document::node::{tags, NodeKind, NodeStyle, YamlNode};
use crate::document::tree::{NodeId, YamlTree};
use crate::error::Result;
use crate::visitor::{Handler, Scope, VisitsMapping};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Options for [`MergeKeyNormalizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    /// Keep collected merge sources in document order instead of reversing
    /// them.
    pub retain_merge_key_order: bool,
}

/// Rewrites mappings with several `<<` entries into a single `<<` entry.
///
/// The first merge key stays in place and receives a flow sequence of every
/// merge source of the mapping. Sources written as single aliases are
/// reversed, so that for consumers where the first listed source wins, the
/// source declared last still overrides the earlier ones. A lone alias is
/// written back as a plain alias.
///
/// Only the mapping's direct children are rewritten. Run it through a
/// [`Visitor`](crate::visitor::Visitor) to reach nested mappings.
///
/// # Example
///
/// ```
/// use yamlwalk::document::{emitter::emit_yaml, parser::parse_yaml};
/// use yamlwalk::transform::MergeKeyNormalizer;
/// use yamlwalk::visitor::{Scope, Visitor};
///
/// let input = "a: &a {x: 1}\nb: &b {y: 2}\nc:\n  <<: *a\n  <<: *b\n";
/// let mut tree = parse_yaml(input).unwrap();
/// let doc = tree.documents()[0];
/// Visitor::new(MergeKeyNormalizer::default())
///     .unwrap()
///     .visit(&Scope::new(), &mut tree, doc)
///     .unwrap();
/// assert!(emit_yaml(&tree).contains("<<: [*b, *a]"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MergeKeyNormalizer {
    options: MergeOptions,
}

impl MergeKeyNormalizer {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> MergeOptions {
        self.options
    }

    /// Rewrites the direct children of `mapping`. Returns true when the
    /// mapping had at least one merge key.
    pub fn normalize(&self, tree: &mut YamlTree, mapping: NodeId) -> bool {
        let pairs: Vec<(NodeId, NodeId)> = tree.pairs(mapping).collect();
        if !pairs.iter().any(|&(key, _)| tree[key].is_merge_key()) {
            return false;
        }

        let mut content = Vec::with_capacity(pairs.len() * 2);
        let mut sources = Vec::new();
        let mut merge_slot = None;
        let mut first_is_alias = false;

        for (key, value) in pairs {
            if !tree[key].is_merge_key() {
                content.extend([key, value]);
                continue;
            }
            if merge_slot.is_none() {
                merge_slot = Some(content.len() + 1);
                first_is_alias = tree[value].kind == NodeKind::Alias;
                content.extend([key, value]);
            }
            match tree[value].kind {
                NodeKind::Alias => sources.push(value),
                NodeKind::Sequence => sources.extend_from_slice(tree.children(value)),
                _ => {}
            }
        }

        let Some(slot) = merge_slot else {
            return false;
        };

        let count = sources.len();
        let first_value = content[slot];
        if count == 1 && first_is_alias {
            content[slot] = sources[0];
        } else if tree[first_value].kind == NodeKind::Sequence
            && tree[first_value].anchor.is_none()
        {
            // Reuse the existing list so repeated passes add no nodes. Anchored
            // lists are shared with their aliases and stay untouched.
            let list = &mut tree[first_value];
            list.content = sources;
            list.tag = tags::SEQ.to_string();
            list.style = NodeStyle::Flow;
        } else {
            if first_is_alias && !self.options.retain_merge_key_order {
                sources.reverse();
            }
            let collector = YamlNode::sequence()
                .with_tag(tags::SEQ)
                .with_style(NodeStyle::Flow)
                .with_content(sources);
            content[slot] = tree.push(collector);
        }

        debug!(mapping = %mapping, sources = count, "collapsed merge keys");
        tree[mapping].content = content;
        true
    }
}

impl VisitsMapping for MergeKeyNormalizer {
    fn visit_mapping(
        &mut self,
        _scope: &Scope,
        tree: &mut YamlTree,
        _key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        self.normalize(tree, value);
        Ok(())
    }
}

impl Handler for MergeKeyNormalizer {
    fn as_mapping(&mut self) -> Option<&mut dyn VisitsMapping> {
        Some(self)
    }
}
