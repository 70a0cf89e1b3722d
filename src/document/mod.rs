//! YAML document model.
//!
//! This module holds the arena tree the visitor walks, plus the collaborators
//! that move trees in and out of text and `serde_yaml` values.

pub mod emitter;
pub mod node;
pub mod parser;
pub mod resolve;
pub mod tree;

pub use node::{NodeKind, NodeStyle, YamlNode};
pub use tree::{NodeId, PathRoot, RootRef, TreeId, YamlTree};
