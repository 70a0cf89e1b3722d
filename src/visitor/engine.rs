//! The traversal engine.

use super::composite::CompositeHandler;
use super::scope::Scope;
use super::Handler;
use crate::document::node::NodeKind;
use crate::document::tree::{NodeId, YamlTree};
use crate::error::{Error, ErrorSet, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug_span, trace};

/// Options applied when a [`Visitor`] is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorOptions {
    /// Accept top-level nodes that are not documents.
    ///
    /// A non-document node with exactly two children is visited as a single
    /// key/value pair; any other node is treated as the content of a document
    /// and its children are visited. Neither case adds nodes to the tree.
    pub skip_document_check: bool,
}

/// Walks documents and dispatches every key/value pair to a handler.
///
/// Handler failures never stop the walk. A failing dispatch skips the
/// subtree below the failing value, siblings are still visited, and all
/// failures are returned together once the walk ends.
#[derive(Debug)]
pub struct Visitor<H> {
    handler: H,
    options: VisitorOptions,
}

impl<H: Handler> Visitor<H> {
    /// Creates a visitor with default options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCapabilities`] if `handler` exposes none of the
    /// visitor capabilities.
    pub fn new(handler: H) -> Result<Self> {
        Self::with_options(VisitorOptions::default(), handler)
    }

    pub fn with_options(options: VisitorOptions, mut handler: H) -> Result<Self> {
        if handler.capabilities().is_empty() {
            return Err(Error::NoCapabilities {
                handler: handler.name(),
            });
        }
        Ok(Self { handler, options })
    }

    pub fn options(&self) -> VisitorOptions {
        self.options
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn into_handler(self) -> H {
        self.handler
    }

    /// Walks the top-level node `node` of `tree`.
    ///
    /// For a document, the document callback runs first and the children of
    /// the document's content are visited next. Call once per document of a
    /// multi-document stream.
    ///
    /// Returns `Ok` without dispatching anything when `scope` is already
    /// cancelled or `node` is not part of `tree`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotADocument`] when `node` is not a document and the
    /// document check is enabled. Otherwise returns every handler failure of
    /// the walk, joined.
    pub fn visit(&mut self, scope: &Scope, tree: &mut YamlTree, node: NodeId) -> Result<()> {
        if scope.is_cancelled() {
            return Ok(());
        }
        let Some(kind) = tree.get(node).map(|n| n.kind) else {
            return Ok(());
        };
        if !self.options.skip_document_check && kind != NodeKind::Document {
            return Err(Error::NotADocument);
        }

        let span = debug_span!("visit", node = %node, kind = kind.as_str());
        let _enter = span.enter();

        let scope = scope.child();
        let mut errors = ErrorSet::default();

        if kind == NodeKind::Document {
            let scope = scope.with_root(tree.root_ref(node));
            if let Some(handler) = self.handler.as_document() {
                errors.record(handler.visit_document(&scope, tree, node));
            }
            if let Some(&content) = tree.children(node).first() {
                errors.record(self.iterate(&scope, tree, content));
            }
        } else if let &[key, value] = tree.children(node) {
            // Paths see the pair as a one-entry mapping, unless the key is a
            // mapping already.
            let root = if tree[key].kind == NodeKind::Mapping {
                tree.root_ref(key)
            } else {
                tree.pair_root_ref(key, value)
            };
            let scope = scope.with_root(root);
            errors.record(self.visit_pair(&scope, tree, Some(key), value));
        } else {
            let scope = scope.with_root(tree.root_ref(node));
            errors.record(self.iterate(&scope, tree, node));
        }

        errors.into_result()
    }

    fn visit_pair(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        if scope.is_cancelled() {
            return Ok(());
        }
        if let Err(err) = self.dispatch(scope, tree, key, value) {
            if !tree.children(value).is_empty() {
                trace!(node = %value, "skipping subtree after failed dispatch");
            }
            return Err(err);
        }
        if tree.children(value).is_empty() {
            return Ok(());
        }
        self.iterate(scope, tree, value)
    }

    fn dispatch(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        let Some(kind) = tree.get(value).map(|n| n.kind) else {
            return Ok(());
        };
        match kind {
            NodeKind::Sequence => match self.handler.as_sequence() {
                Some(handler) => handler.visit_sequence(scope, tree, key, value),
                None => Ok(()),
            },
            NodeKind::Mapping => match self.handler.as_mapping() {
                Some(handler) => handler.visit_mapping(scope, tree, key, value),
                None => Ok(()),
            },
            NodeKind::Scalar => match self.handler.as_scalar() {
                Some(handler) => handler.visit_scalar(scope, tree, key, value),
                None => Ok(()),
            },
            NodeKind::Alias => match self.handler.as_alias() {
                Some(handler) => handler.visit_alias(scope, tree, key, value),
                None => Ok(()),
            },
            NodeKind::Document => Err(Error::UnexpectedDocument(value)),
        }
    }

    /// Visits the children of `node`. The child list is re-read on every
    /// step, so handlers may grow or shrink it while it is walked.
    fn iterate(&mut self, scope: &Scope, tree: &mut YamlTree, node: NodeId) -> Result<()> {
        if scope.is_cancelled() {
            return Ok(());
        }
        let mut errors = ErrorSet::default();
        match tree.get(node).map(|n| n.kind) {
            Some(NodeKind::Sequence) => {
                let mut index = 0;
                while let Some(&item) = tree.children(node).get(index) {
                    errors.record(self.visit_pair(scope, tree, None, item));
                    if scope.is_cancelled() {
                        trace!(node = %node, index, "walk cancelled");
                        break;
                    }
                    index += 1;
                }
            }
            Some(NodeKind::Mapping) => {
                let mut index = 0;
                while let Some(&[key, value]) = tree.children(node).get(index..index + 2) {
                    errors.record(self.visit_pair(scope, tree, Some(key), value));
                    if scope.is_cancelled() {
                        trace!(node = %node, index, "walk cancelled");
                        break;
                    }
                    index += 2;
                }
            }
            _ => {}
        }
        errors.into_result()
    }
}

impl<'a> Visitor<CompositeHandler<'a>> {
    /// Creates a visitor dispatching to every handler of `handlers`, in
    /// order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHandlers`] for an empty list and
    /// [`Error::NoCapabilities`] when any member exposes no capability.
    pub fn from_handlers(
        options: VisitorOptions,
        handlers: Vec<Box<dyn Handler + 'a>>,
    ) -> Result<Self> {
        Self::with_options(options, CompositeHandler::new(handlers)?)
    }
}
