//! YAMLPath query parser and evaluator for structural YAML search.
//!
//! This module compiles path queries and evaluates them against a document
//! of a [`YamlTree`], returning the ids of the matching nodes.
//!
//! # Supported Syntax
//!
//! - `$` - Root node (the content of a document)
//! - `.property` - Named property access
//! - `['property']` - Bracket notation
//! - `[index]` - Sequence index (supports negative indices)
//! - `[*]` or `.*` - All children (wildcard)
//! - `..property` or `..*` - Recursive descent
//! - `[start:end]` - Sequence slicing
//! - `['prop1','prop2']` - Multiple properties
//! - `[?(@.key)]`, `[?(@.key == 'x')]`, `[?(@.key =~ /re/)]` - Filters
//!
//! # Examples
//!
//! ```
//! use yamlwalk::document::parser::parse_yaml;
//! use yamlwalk::yamlpath::YamlPath;
//!
//! let tree = parse_yaml("items:\n  - name: a\n  - name: b\n").unwrap();
//! let path = YamlPath::parse("$.items[*].name").unwrap();
//! let found = path.find(&tree, tree.documents()[0]).unwrap();
//! assert_eq!(found.len(), 2);
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{PathSegment, YamlPath};
pub use error::YamlPathError;
pub use evaluator::Evaluator;
pub use parser::Parser;

use crate::document::tree::{NodeId, PathRoot, YamlTree};

impl YamlPath {
    /// Compiles a query string.
    pub fn parse(query: &str) -> Result<Self, YamlPathError> {
        Parser::parse(query)
    }

    /// Evaluates the path against the document (or node) `root` of `tree`.
    pub fn find(&self, tree: &YamlTree, root: NodeId) -> Result<Vec<NodeId>, YamlPathError> {
        self.find_from(tree, PathRoot::Node(root))
    }

    /// Evaluates the path with `$` bound to `root`.
    pub fn find_from(&self, tree: &YamlTree, root: PathRoot) -> Result<Vec<NodeId>, YamlPathError> {
        Ok(Evaluator::with_root(tree, root)?.evaluate(&self.segments))
    }
}
