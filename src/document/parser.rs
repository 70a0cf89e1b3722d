//! YAML parsing into the arena tree.
//!
//! This module turns YAML text into a [`YamlTree`] using the `yaml-rust2`
//! event parser. Anchors and aliases become alias back-references, explicit
//! tags are kept, plain scalars get their core-schema tag resolved, and flow
//! collections are remembered as [`NodeStyle::Flow`].
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::parser::parse_yaml;
//!
//! let tree = parse_yaml("a: 1\n---\nb: 2\n").unwrap();
//! assert_eq!(tree.documents().len(), 2);
//! ```

use super::node::{resolve_plain_tag, tags, NodeKind, NodeStyle, YamlNode};
use super::tree::{NodeId, YamlTree};
use anyhow::{anyhow, Context, Result};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, Scanner, TScalarStyle, TokenType};

/// Parses a YAML stream into a tree holding one node per document.
///
/// Empty input yields a tree without documents.
///
/// # Errors
///
/// Returns an error when the text is not well-formed YAML or an alias refers
/// to an anchor that was never declared.
pub fn parse_yaml(source: &str) -> Result<YamlTree> {
    let mut builder = TreeBuilder::new(source);
    let mut parser = Parser::new_from_str(source);
    parser
        .load(&mut builder, true)
        .map_err(|e| anyhow!("{}", e))
        .context("Failed to parse YAML")?;
    builder.finish()
}

/// Anchor names in declaration order.
///
/// The event parser only reports numeric anchor ids, assigned sequentially
/// from 1 in the order anchors appear in the stream, so the nth anchor token
/// carries id `n`.
fn scan_anchor_names(source: &str) -> Vec<String> {
    Scanner::new(source.chars())
        .filter_map(|token| match token.1 {
            TokenType::Anchor(name) => Some(name),
            _ => None,
        })
        .collect()
}

fn tag_name(tag: &Tag) -> String {
    if tag.handle == "tag:yaml.org,2002:" {
        format!("!!{}", tag.suffix)
    } else {
        format!("{}{}", tag.handle, tag.suffix)
    }
}

fn scalar_style(style: TScalarStyle) -> NodeStyle {
    match style {
        TScalarStyle::Plain => NodeStyle::Plain,
        TScalarStyle::SingleQuoted => NodeStyle::SingleQuoted,
        TScalarStyle::DoubleQuoted => NodeStyle::DoubleQuoted,
        TScalarStyle::Literal => NodeStyle::Literal,
        TScalarStyle::Folded => NodeStyle::Folded,
    }
}

struct TreeBuilder {
    source: Vec<char>,
    anchor_names: Vec<String>,
    tree: YamlTree,
    stack: Vec<NodeId>,
    anchors: HashMap<usize, NodeId>,
    error: Option<anyhow::Error>,
}

impl TreeBuilder {
    fn new(source: &str) -> Self {
        Self {
            source: source.chars().collect(),
            anchor_names: scan_anchor_names(source),
            tree: YamlTree::new(),
            stack: Vec::new(),
            anchors: HashMap::new(),
            error: None,
        }
    }

    fn finish(self) -> Result<YamlTree> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.tree),
        }
    }

    fn anchor_name(&self, anchor_id: usize) -> Option<String> {
        anchor_id
            .checked_sub(1)
            .and_then(|i| self.anchor_names.get(i))
            .cloned()
    }

    fn parent_is_flow(&self) -> bool {
        self.stack
            .last()
            .map(|p| self.tree[*p].style == NodeStyle::Flow)
            .unwrap_or(false)
    }

    fn attach(&mut self, mut node: YamlNode, anchor_id: usize) -> NodeId {
        if anchor_id > 0 {
            node.anchor = self.anchor_name(anchor_id);
        }
        let id = self.tree.push(node);
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, id);
        }
        if let Some(parent) = self.stack.last() {
            self.tree[*parent].content.push(id);
        }
        id
    }

    fn open_collection(&mut self, kind: NodeKind, anchor_id: usize, tag: Option<Tag>, mark: Marker) {
        let mut node = match kind {
            NodeKind::Mapping => YamlNode::mapping(),
            _ => YamlNode::sequence(),
        };
        if let Some(tag) = tag {
            node.tag = tag_name(&tag);
        }
        let opens_flow = matches!(self.source.get(mark.index()), Some('[') | Some('{'));
        if opens_flow || self.parent_is_flow() {
            node.style = NodeStyle::Flow;
        }
        let id = self.attach(node, anchor_id);
        self.stack.push(id);
    }

    fn handle(&mut self, event: Event, mark: Marker) -> Result<()> {
        match event {
            Event::Nothing | Event::StreamStart | Event::StreamEnd => {}
            Event::DocumentStart => {
                let id = self.tree.push_document(YamlNode::document());
                self.stack.push(id);
            }
            Event::DocumentEnd | Event::SequenceEnd | Event::MappingEnd => {
                self.stack.pop();
            }
            Event::Scalar(value, style, anchor_id, tag) => {
                let tag = match (tag, style) {
                    (Some(tag), _) => tag_name(&tag),
                    (None, TScalarStyle::Plain) => resolve_plain_tag(&value).to_string(),
                    (None, _) => tags::STR.to_string(),
                };
                let mut node = YamlNode::scalar(value).with_tag(tag);
                node.style = scalar_style(style);
                self.attach(node, anchor_id);
            }
            Event::SequenceStart(anchor_id, tag) => {
                self.open_collection(NodeKind::Sequence, anchor_id, tag, mark)
            }
            Event::MappingStart(anchor_id, tag) => {
                self.open_collection(NodeKind::Mapping, anchor_id, tag, mark)
            }
            Event::Alias(anchor_id) => {
                let target = self.anchors.get(&anchor_id).copied().ok_or_else(|| {
                    anyhow!(
                        "alias at line {} refers to an unknown anchor",
                        mark.line()
                    )
                })?;
                let name = self.anchor_name(anchor_id).unwrap_or_default();
                self.attach(YamlNode::alias(name, target), 0);
            }
        }
        Ok(())
    }
}

impl MarkedEventReceiver for TreeBuilder {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.handle(event, mark) {
            self.error = Some(err);
        }
    }
}
