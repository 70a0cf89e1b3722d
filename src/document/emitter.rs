//! YAML text output for arena trees.
//!
//! The emitter writes block-style YAML with two-space indentation. Flow
//! collections stay in flow style, anchors are written as `&name`, aliases as
//! `*name`, and head comments as `#` lines above their node. Plain strings
//! that would read back as another type are double-quoted.
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::emitter::emit_yaml;
//! use yamlwalk::document::parser::parse_yaml;
//!
//! let tree = parse_yaml("base: &b {x: 1}\nchild:\n  <<: *b\n").unwrap();
//! assert_eq!(emit_yaml(&tree), "base: &b {x: 1}\nchild:\n  <<: *b\n");
//! ```

use super::node::{resolve_plain_tag, tags, NodeKind, NodeStyle, YamlNode};
use super::tree::{NodeId, YamlTree};

const INDENT: usize = 2;

/// Emits every document of `tree`, separated by `---` lines.
pub fn emit_yaml(tree: &YamlTree) -> String {
    let mut emitter = Emitter::new(tree);
    for (i, doc) in tree.documents().iter().enumerate() {
        if i > 0 {
            emitter.out.push_str("---\n");
        }
        emitter.write_top(*doc);
    }
    emitter.out
}

/// Emits a single node, as if it were the content of a document.
pub fn emit_node(tree: &YamlTree, id: NodeId) -> String {
    let mut emitter = Emitter::new(tree);
    emitter.write_top(id);
    emitter.out
}

struct Emitter<'t> {
    tree: &'t YamlTree,
    out: String,
}

impl<'t> Emitter<'t> {
    fn new(tree: &'t YamlTree) -> Self {
        Self {
            tree,
            out: String::new(),
        }
    }

    fn write_top(&mut self, id: NodeId) {
        let tree = self.tree;
        let Some(node) = tree.get(id) else {
            return;
        };
        if node.kind == NodeKind::Document {
            match node.content.first() {
                Some(content) => self.write_top(*content),
                None => self.out.push_str("null\n"),
            }
            return;
        }
        self.write_comment(node, 0);
        match self.inline(id) {
            Some(text) => {
                self.out.push_str(&text);
                self.out.push('\n');
            }
            None => {
                let props = self.props(node);
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.out.push('\n');
                }
                self.write_block(id, 0, false);
            }
        }
    }

    fn write_comment(&mut self, node: &YamlNode, indent: usize) {
        if let Some(comment) = &node.head_comment {
            for line in comment.lines() {
                let line = line.trim_start_matches('#').trim();
                self.out.push_str(&" ".repeat(indent));
                if line.is_empty() {
                    self.out.push_str("#\n");
                } else {
                    self.out.push_str("# ");
                    self.out.push_str(line);
                    self.out.push('\n');
                }
            }
        }
    }

    /// Writes a block collection. When `continued` is set the first line
    /// follows a `- ` already written by the parent sequence.
    fn write_block(&mut self, id: NodeId, indent: usize, continued: bool) {
        let tree = self.tree;
        let node = &tree[id];
        match node.kind {
            NodeKind::Mapping => {
                for (i, pair) in node.content.chunks_exact(2).enumerate() {
                    let (key, value) = (pair[0], pair[1]);
                    let first_line = continued && i == 0;
                    if !first_line {
                        self.write_comment(&tree[key], indent);
                        self.out.push_str(&" ".repeat(indent));
                    }
                    let key_text = self.flow(key);
                    self.out.push_str(&key_text);
                    self.out.push(':');
                    self.write_entry_value(value, indent + INDENT);
                }
            }
            NodeKind::Sequence => {
                for (i, item) in node.content.iter().enumerate() {
                    let first_line = continued && i == 0;
                    if !first_line {
                        self.write_comment(&tree[*item], indent);
                        self.out.push_str(&" ".repeat(indent));
                    }
                    self.out.push('-');
                    match self.inline(*item) {
                        Some(text) => {
                            self.out.push(' ');
                            self.out.push_str(&text);
                            self.out.push('\n');
                        }
                        None => {
                            let props = self.props(&tree[*item]);
                            if props.is_empty() {
                                self.out.push(' ');
                                self.write_block(*item, indent + INDENT, true);
                            } else {
                                self.out.push(' ');
                                self.out.push_str(&props);
                                self.out.push('\n');
                                self.write_block(*item, indent + INDENT, false);
                            }
                        }
                    }
                }
            }
            _ => {
                if !continued {
                    self.out.push_str(&" ".repeat(indent));
                }
                let text = self.flow(id);
                self.out.push_str(&text);
                self.out.push('\n');
            }
        }
    }

    /// Writes what follows `key:` on a mapping line.
    fn write_entry_value(&mut self, value: NodeId, indent: usize) {
        match self.inline(value) {
            Some(text) if text.is_empty() => self.out.push('\n'),
            Some(text) => {
                self.out.push(' ');
                self.out.push_str(&text);
                self.out.push('\n');
            }
            None => {
                let tree = self.tree;
                let props = self.props(&tree[value]);
                if !props.is_empty() {
                    self.out.push(' ');
                    self.out.push_str(&props);
                }
                self.out.push('\n');
                self.write_block(value, indent, false);
            }
        }
    }

    /// Single-line rendering, for nodes that never need block layout.
    fn inline(&self, id: NodeId) -> Option<String> {
        let node = self.tree.get(id)?;
        let inline = match node.kind {
            NodeKind::Scalar | NodeKind::Alias => true,
            NodeKind::Sequence | NodeKind::Mapping => {
                node.style == NodeStyle::Flow || node.content.is_empty()
            }
            NodeKind::Document => false,
        };
        inline.then(|| self.flow(id))
    }

    /// Anchor and non-default tag of a collection, e.g. `&base !custom`.
    fn props(&self, node: &YamlNode) -> String {
        let mut parts = Vec::new();
        if let Some(anchor) = &node.anchor {
            parts.push(format!("&{}", anchor));
        }
        let default_tag = match node.kind {
            NodeKind::Mapping => tags::MAP,
            NodeKind::Sequence => tags::SEQ,
            _ => "",
        };
        if !node.tag.is_empty() && node.tag != default_tag {
            parts.push(node.tag.clone());
        }
        parts.join(" ")
    }

    fn flow(&self, id: NodeId) -> String {
        let Some(node) = self.tree.get(id) else {
            return String::new();
        };
        match node.kind {
            NodeKind::Alias => format!("*{}", node.value),
            NodeKind::Scalar => {
                let text = scalar_text(node);
                match &node.anchor {
                    Some(anchor) if text.is_empty() => format!("&{}", anchor),
                    Some(anchor) => format!("&{} {}", anchor, text),
                    None => text,
                }
            }
            NodeKind::Sequence => {
                let items: Vec<String> = node.content.iter().map(|c| self.flow(*c)).collect();
                self.with_props(node, format!("[{}]", items.join(", ")))
            }
            NodeKind::Mapping => {
                let pairs: Vec<String> = node
                    .content
                    .chunks_exact(2)
                    .map(|pair| format!("{}: {}", self.flow(pair[0]), self.flow(pair[1])))
                    .collect();
                self.with_props(node, format!("{{{}}}", pairs.join(", ")))
            }
            NodeKind::Document => node
                .content
                .first()
                .map(|c| self.flow(*c))
                .unwrap_or_else(|| "null".to_string()),
        }
    }

    fn with_props(&self, node: &YamlNode, body: String) -> String {
        let props = self.props(node);
        if props.is_empty() {
            body
        } else {
            format!("{} {}", props, body)
        }
    }
}

/// Text of a scalar including any tag it needs to read back the same way.
fn scalar_text(node: &YamlNode) -> String {
    if node.is_merge_key() && node.value == "<<" {
        return "<<".to_string();
    }
    match node.style {
        NodeStyle::Plain | NodeStyle::Flow => {
            let safe = is_plain_safe(&node.value);
            if safe && resolve_plain_tag(&node.value) == node.tag {
                node.value.clone()
            } else if node.tag == tags::STR {
                double_quoted(&node.value)
            } else if safe {
                format!("{} {}", node.tag, node.value)
            } else {
                format!("{} {}", node.tag, double_quoted(&node.value))
            }
        }
        NodeStyle::SingleQuoted if !node.value.contains('\n') => {
            tagged(node, format!("'{}'", node.value.replace('\'', "''")))
        }
        _ => tagged(node, double_quoted(&node.value)),
    }
}

fn tagged(node: &YamlNode, text: String) -> String {
    if node.tag.is_empty() || node.tag == tags::STR {
        text
    } else {
        format!("{} {}", node.tag, text)
    }
}

fn is_plain_safe(value: &str) -> bool {
    let Some(first) = value.chars().next() else {
        return true;
    };
    if value.trim() != value || value.contains('\n') {
        return false;
    }
    if "[]{},#&*!|>'\"%@`".contains(first) {
        return false;
    }
    if matches!(value, "-" | "?" | ":" | "<<")
        || value.starts_with("- ")
        || value.starts_with("? ")
        || value.starts_with(": ")
        || value.starts_with("---")
    {
        return false;
    }
    !(value.contains(": ") || value.contains(" #") || value.ends_with(':'))
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:02x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
