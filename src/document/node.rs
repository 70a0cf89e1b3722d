//! Node types for the YAML document tree.
//!
//! A [`YamlNode`] is one element of a parsed document: a document wrapper, a
//! sequence, a mapping, a scalar or an alias. Nodes never own each other
//! directly. Children are referenced by [`NodeId`] into the owning
//! [`YamlTree`](super::tree::YamlTree), which keeps alias back-references
//! (and the cycles they may form) free of ownership concerns.
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::node::{tags, NodeKind, YamlNode};
//!
//! let port = YamlNode::scalar("8080");
//! assert_eq!(port.kind, NodeKind::Scalar);
//! assert_eq!(port.tag, tags::INT);
//!
//! let merge = YamlNode::scalar("<<");
//! assert!(merge.is_merge_key());
//! ```

use super::tree::NodeId;

/// Short spellings of the YAML core schema tags.
pub mod tags {
    /// Mapping tag.
    pub const MAP: &str = "!!map";
    /// Sequence tag.
    pub const SEQ: &str = "!!seq";
    /// String tag.
    pub const STR: &str = "!!str";
    /// Integer tag.
    pub const INT: &str = "!!int";
    /// Floating point tag.
    pub const FLOAT: &str = "!!float";
    /// Boolean tag.
    pub const BOOL: &str = "!!bool";
    /// Null tag.
    pub const NULL: &str = "!!null";
    /// Merge-key marker tag, carried by `<<` keys.
    pub const MERGE: &str = "!!merge";
}

/// The structural kind of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Top-level wrapper holding at most one content node.
    Document,
    /// Ordered list of elements.
    Sequence,
    /// Flattened key/value pairs: even positions are keys, odd positions values.
    Mapping,
    /// Leaf value.
    Scalar,
    /// Back-reference to an anchored node.
    Alias,
}

impl NodeKind {
    /// Returns a lowercase name suitable for log output.
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Document => "document",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
            NodeKind::Scalar => "scalar",
            NodeKind::Alias => "alias",
        }
    }
}

/// Presentation style of a node.
///
/// Scalars carry their quoting style. Collections are either block
/// (`Plain`) or `Flow` (`[a, b]`, `{a: b}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
    Flow,
}

/// A single node in a [`YamlTree`](super::tree::YamlTree).
///
/// Fields are public so handlers can rewrite nodes in place. The structural
/// invariants are:
///
/// - `content` of a mapping always has an even length,
/// - scalars and aliases never have `content`,
/// - `alias` is set only on alias nodes and never owns its target.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub kind: NodeKind,
    /// Resolved tag, e.g. `!!str` or `!!merge`. Empty for documents.
    pub tag: String,
    /// Scalar payload, or the anchor name an alias refers to.
    pub value: String,
    /// Anchor name declared on this node (`&name`).
    pub anchor: Option<String>,
    pub style: NodeStyle,
    /// Comment emitted on the lines above this node.
    pub head_comment: Option<String>,
    pub content: Vec<NodeId>,
    /// Target of an alias node.
    pub alias: Option<NodeId>,
}

impl YamlNode {
    fn with_kind(kind: NodeKind, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_string(),
            value: String::new(),
            anchor: None,
            style: NodeStyle::Plain,
            head_comment: None,
            content: Vec::new(),
            alias: None,
        }
    }

    /// Creates an empty document node.
    pub fn document() -> Self {
        Self::with_kind(NodeKind::Document, "")
    }

    /// Creates an empty block mapping.
    pub fn mapping() -> Self {
        Self::with_kind(NodeKind::Mapping, tags::MAP)
    }

    /// Creates an empty block sequence.
    pub fn sequence() -> Self {
        Self::with_kind(NodeKind::Sequence, tags::SEQ)
    }

    /// Creates a plain scalar whose tag is resolved from its text.
    ///
    /// # Example
    ///
    /// ```
    /// use yamlwalk::document::node::{tags, YamlNode};
    ///
    /// assert_eq!(YamlNode::scalar("true").tag, tags::BOOL);
    /// assert_eq!(YamlNode::scalar("~").tag, tags::NULL);
    /// assert_eq!(YamlNode::scalar("hello").tag, tags::STR);
    /// ```
    pub fn scalar(value: impl Into<String>) -> Self {
        let value = value.into();
        let mut node = Self::with_kind(NodeKind::Scalar, resolve_plain_tag(&value));
        node.value = value;
        node
    }

    /// Creates a double-quoted string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        let mut node = Self::with_kind(NodeKind::Scalar, tags::STR);
        node.value = value.into();
        node.style = NodeStyle::DoubleQuoted;
        node
    }

    /// Creates a `<<` merge-key scalar.
    pub fn merge_key() -> Self {
        let mut node = Self::with_kind(NodeKind::Scalar, tags::MERGE);
        node.value = "<<".to_string();
        node
    }

    /// Creates an alias node pointing at `target`, named `anchor`.
    pub fn alias(anchor: impl Into<String>, target: NodeId) -> Self {
        let mut node = Self::with_kind(NodeKind::Alias, "");
        node.value = anchor.into();
        node.alias = Some(target);
        node
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = tag.into();
        self
    }

    pub fn with_style(mut self, style: NodeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }

    pub fn with_content(mut self, content: Vec<NodeId>) -> Self {
        self.content = content;
        self
    }

    /// Returns true if this node is a key carrying the merge-marker tag.
    pub fn is_merge_key(&self) -> bool {
        self.kind == NodeKind::Scalar && self.tag == tags::MERGE
    }

    pub fn is_scalar(&self) -> bool {
        self.kind == NodeKind::Scalar
    }

    pub fn is_mapping(&self) -> bool {
        self.kind == NodeKind::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.kind == NodeKind::Sequence
    }
}

/// Resolves the core-schema tag of a plain (unquoted) scalar.
///
/// The plain key `<<` resolves to the merge tag.
pub fn resolve_plain_tag(value: &str) -> &'static str {
    match value {
        "<<" => tags::MERGE,
        "" | "~" | "null" | "Null" | "NULL" => tags::NULL,
        "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => tags::BOOL,
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf" | "-.INF"
        | ".nan" | ".NaN" | ".NAN" => tags::FLOAT,
        _ if is_int(value) => tags::INT,
        _ if is_float(value) => tags::FLOAT,
        _ => tags::STR,
    }
}

fn is_int(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(oct) = value.strip_prefix("0o") {
        return !oct.is_empty() && oct.chars().all(|c| c.is_digit(8));
    }
    let digits = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_float(value: &str) -> bool {
    let body = value
        .strip_prefix('-')
        .or_else(|| value.strip_prefix('+'))
        .unwrap_or(value);
    let starts_numeric = body
        .chars()
        .next()
        .map(|c| c.is_ascii_digit() || c == '.')
        .unwrap_or(false);
    starts_numeric
        && body.chars().any(|c| c.is_ascii_digit())
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '-' | '+'))
        && body.parse::<f64>().is_ok()
}
