//! Path-gated callbacks.
//!
//! A [`ConditionalHandler`] holds, per node kind, an ordered list of
//! callbacks. Every callback except the document ones is gated by a path: it
//! only runs for values selected by that path under the current document
//! root. Within one list the first failing callback stops the rest of the
//! list for that node.
//!
//! # Example
//!
//! ```
//! use yamlwalk::document::parser::parse_yaml;
//! use yamlwalk::visitor::{ConditionalHandler, Scope, Visitor};
//!
//! let mut tree = parse_yaml("books:\n  - title: Emma\n  - title: Persuasion\n").unwrap();
//! let mut titles = Vec::new();
//!
//! let handler = ConditionalHandler::builder()
//!     .on_scalar("$.books[*].title", |_scope, tree, _key, value| {
//!         titles.push(tree[value].value.clone());
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! let doc = tree.documents()[0];
//! Visitor::new(handler).unwrap().visit(&Scope::new(), &mut tree, doc).unwrap();
//! assert_eq!(titles, ["Emma", "Persuasion"]);
//! ```

use super::matcher::PathMatcher;
use super::{
    Capabilities, Handler, Scope, VisitsAlias, VisitsDocument, VisitsMapping, VisitsScalar,
    VisitsSequence,
};
use crate::document::tree::{NodeId, YamlTree};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback for documents.
pub type DocumentFn<'a> = Box<dyn FnMut(&Scope, &mut YamlTree, NodeId) -> Result<()> + 'a>;

/// Callback for key/value pairs. The key is `None` for sequence elements.
pub type KeyValueFn<'a> =
    Box<dyn FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> Result<()> + 'a>;

/// A callback that only runs for values its matcher selects.
struct Gate<'a> {
    matcher: Arc<PathMatcher>,
    callback: KeyValueFn<'a>,
}

impl Gate<'_> {
    fn call(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        let selected = match scope.root() {
            Some(root) => self.matcher.match_under(root, tree, value)?,
            None => self.matcher.is_match(tree, value)?,
        };
        if !selected {
            return Ok(());
        }
        let scope = scope.with_matcher(self.matcher.clone());
        (self.callback)(&scope, tree, key, value)
    }
}

fn run_gates(
    gates: &mut [Gate<'_>],
    scope: &Scope,
    tree: &mut YamlTree,
    key: Option<NodeId>,
    value: NodeId,
) -> Result<()> {
    for gate in gates {
        gate.call(scope, tree, key, value)?;
    }
    Ok(())
}

/// Handler running path-gated callbacks. Build one with
/// [`ConditionalHandler::builder`].
pub struct ConditionalHandler<'a> {
    documents: Vec<DocumentFn<'a>>,
    sequences: Vec<Gate<'a>>,
    mappings: Vec<Gate<'a>>,
    scalars: Vec<Gate<'a>>,
    aliases: Vec<Gate<'a>>,
}

impl<'a> ConditionalHandler<'a> {
    pub fn builder() -> ConditionalHandlerBuilder<'a> {
        ConditionalHandlerBuilder::default()
    }
}

impl fmt::Debug for ConditionalHandler<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths = |gates: &[Gate<'_>]| {
            gates
                .iter()
                .map(|g| g.matcher.raw_path().to_string())
                .collect::<Vec<_>>()
        };
        f.debug_struct("ConditionalHandler")
            .field("documents", &self.documents.len())
            .field("sequences", &paths(&self.sequences))
            .field("mappings", &paths(&self.mappings))
            .field("scalars", &paths(&self.scalars))
            .field("aliases", &paths(&self.aliases))
            .finish()
    }
}

impl VisitsDocument for ConditionalHandler<'_> {
    fn visit_document(&mut self, scope: &Scope, tree: &mut YamlTree, document: NodeId) -> Result<()> {
        for callback in &mut self.documents {
            callback(scope, tree, document)?;
        }
        Ok(())
    }
}

impl VisitsSequence for ConditionalHandler<'_> {
    fn visit_sequence(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        run_gates(&mut self.sequences, scope, tree, key, value)
    }
}

impl VisitsMapping for ConditionalHandler<'_> {
    fn visit_mapping(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        run_gates(&mut self.mappings, scope, tree, key, value)
    }
}

impl VisitsScalar for ConditionalHandler<'_> {
    fn visit_scalar(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        run_gates(&mut self.scalars, scope, tree, key, value)
    }
}

impl VisitsAlias for ConditionalHandler<'_> {
    fn visit_alias(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> Result<()> {
        run_gates(&mut self.aliases, scope, tree, key, value)
    }
}

impl Handler for ConditionalHandler<'_> {
    fn as_document(&mut self) -> Option<&mut dyn VisitsDocument> {
        Some(self)
    }

    fn as_sequence(&mut self) -> Option<&mut dyn VisitsSequence> {
        Some(self)
    }

    fn as_mapping(&mut self) -> Option<&mut dyn VisitsMapping> {
        Some(self)
    }

    fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
        Some(self)
    }

    fn as_alias(&mut self) -> Option<&mut dyn VisitsAlias> {
        Some(self)
    }

    fn name(&self) -> String {
        "ConditionalHandler".to_string()
    }

    fn capabilities(&mut self) -> Capabilities {
        Capabilities::all()
    }
}

/// Pending gated callback, compiled when the builder finishes.
struct Registration<'a> {
    capability: Capabilities,
    path: String,
    callback: KeyValueFn<'a>,
}

/// Collects callbacks for a [`ConditionalHandler`].
#[derive(Default)]
pub struct ConditionalHandlerBuilder<'a> {
    documents: Vec<DocumentFn<'a>>,
    registrations: Vec<Registration<'a>>,
}

impl<'a> ConditionalHandlerBuilder<'a> {
    /// Adds an ungated callback receiving every visited document.
    pub fn on_document<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&Scope, &mut YamlTree, NodeId) -> Result<()> + 'a,
    {
        self.documents.push(Box::new(callback));
        self
    }

    pub fn on_sequence<F>(self, path: &str, callback: F) -> Self
    where
        F: FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> Result<()> + 'a,
    {
        self.register(Capabilities::SEQUENCE, path, Box::new(callback))
    }

    pub fn on_mapping<F>(self, path: &str, callback: F) -> Self
    where
        F: FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> Result<()> + 'a,
    {
        self.register(Capabilities::MAPPING, path, Box::new(callback))
    }

    pub fn on_scalar<F>(self, path: &str, callback: F) -> Self
    where
        F: FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> Result<()> + 'a,
    {
        self.register(Capabilities::SCALAR, path, Box::new(callback))
    }

    pub fn on_alias<F>(self, path: &str, callback: F) -> Self
    where
        F: FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> Result<()> + 'a,
    {
        self.register(Capabilities::ALIAS, path, Box::new(callback))
    }

    fn register(mut self, capability: Capabilities, path: &str, callback: KeyValueFn<'a>) -> Self {
        self.registrations.push(Registration {
            capability,
            path: path.to_string(),
            callback,
        });
        self
    }

    /// Compiles every registered path and produces the handler. Callbacks
    /// registered with the same path share one matcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoHandlers`] when nothing was registered and
    /// [`Error::InvalidPath`] for the first malformed path.
    pub fn build(self) -> Result<ConditionalHandler<'a>> {
        if self.documents.is_empty() && self.registrations.is_empty() {
            return Err(Error::NoHandlers);
        }

        let mut handler = ConditionalHandler {
            documents: self.documents,
            sequences: Vec::new(),
            mappings: Vec::new(),
            scalars: Vec::new(),
            aliases: Vec::new(),
        };
        let mut matchers: HashMap<String, Arc<PathMatcher>> = HashMap::new();

        for registration in self.registrations {
            let matcher = match matchers.get(&registration.path) {
                Some(matcher) => matcher.clone(),
                None => {
                    let matcher = Arc::new(PathMatcher::new(&registration.path)?);
                    matchers.insert(registration.path.clone(), matcher.clone());
                    matcher
                }
            };
            let gate = Gate {
                matcher,
                callback: registration.callback,
            };
            let list = if registration.capability == Capabilities::SEQUENCE {
                &mut handler.sequences
            } else if registration.capability == Capabilities::MAPPING {
                &mut handler.mappings
            } else if registration.capability == Capabilities::SCALAR {
                &mut handler.scalars
            } else {
                &mut handler.aliases
            };
            list.push(gate);
        }

        Ok(handler)
    }
}
