//! Walk YAML document trees and dispatch their nodes to handlers.
//!
//! The [`visitor`] module holds the traversal engine, the handler traits and
//! the composite and path-gated handlers built on them. [`transform`] ships
//! handlers that rewrite trees, [`document`] the tree model with its parser
//! and emitter, and [`yamlpath`] the path queries used to gate handlers.

pub mod config;
pub mod document;
pub mod error;
pub mod file;
pub mod transform;
pub mod visitor;
pub mod yamlpath;

pub use error::{Error, Result};
