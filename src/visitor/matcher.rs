//! Cached path membership tests.
//!
//! A [`PathMatcher`] answers "is this node selected by the path?" for every
//! node of a walk. The path is evaluated once per document root, the result
//! is kept as a set of node ids, and each test afterwards is a set lookup.
//! Binding the matcher to a different root drops the cached set.

use super::scope::Scope;
use crate::document::tree::{NodeId, RootRef, YamlTree};
use crate::error::{Error, Result};
use crate::yamlpath::YamlPath;
use indexmap::IndexSet;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
struct MatchState {
    root: Option<RootRef>,
    matches: Option<IndexSet<NodeId>>,
}

/// A compiled path with a per-root cache of matching node ids.
///
/// # Example
///
/// ```
/// use yamlwalk::document::parser::parse_yaml;
/// use yamlwalk::visitor::PathMatcher;
///
/// let tree = parse_yaml("a:\n  b: 1\n").unwrap();
/// let doc = tree.documents()[0];
/// let map = tree.children(doc)[0];
/// let a = tree.mapping_get(map, "a").unwrap();
///
/// let matcher = PathMatcher::new("$.a").unwrap();
/// matcher.bind(tree.root_ref(doc));
/// assert!(matcher.is_match(&tree, a).unwrap());
/// assert!(!matcher.is_match(&tree, map).unwrap());
/// ```
#[derive(Debug)]
pub struct PathMatcher {
    raw: String,
    path: YamlPath,
    state: RwLock<MatchState>,
    #[cfg(test)]
    evaluations: AtomicUsize,
}

impl PathMatcher {
    /// Compiles `path`. The matcher starts unbound and matches nothing until
    /// it is bound to a root.
    pub fn new(path: &str) -> Result<Self> {
        let compiled = YamlPath::parse(path).map_err(|source| Error::InvalidPath {
            path: path.to_string(),
            source,
        })?;
        Ok(Self {
            raw: path.to_string(),
            path: compiled,
            state: RwLock::new(MatchState::default()),
            #[cfg(test)]
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Returns the scope's active matcher when it was built for `path`, or a
    /// new matcher otherwise. Unbound matchers are bound to the scope root.
    pub fn for_scope(scope: &Scope, path: &str) -> Result<Arc<Self>> {
        let matcher = match scope.matcher() {
            Some(active) if active.raw_path() == path => active.clone(),
            _ => Arc::new(Self::new(path)?),
        };
        if matcher.root().is_none() {
            if let Some(root) = scope.root() {
                matcher.bind(root);
            }
        }
        Ok(matcher)
    }

    pub fn raw_path(&self) -> &str {
        &self.raw
    }

    pub fn path(&self) -> &YamlPath {
        &self.path
    }

    pub fn root(&self) -> Option<RootRef> {
        self.state.read().root
    }

    /// Binds the matcher to `root`. Returns true when the root changed and
    /// the cached matches were dropped.
    pub fn bind(&self, root: RootRef) -> bool {
        let mut state = self.state.write();
        if state.root == Some(root) {
            return false;
        }
        state.root = Some(root);
        state.matches = None;
        true
    }

    /// Tests whether `node` is selected by the path under the bound root.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PathLookup`] when evaluating the path fails and
    /// [`Error::TreeMismatch`] when `tree` is not the tree the matcher is
    /// bound to.
    pub fn is_match(&self, tree: &YamlTree, node: NodeId) -> Result<bool> {
        {
            let state = self.state.read();
            if let (Some(root), Some(matches)) = (state.root, &state.matches) {
                if root.tree != tree.id() {
                    return Err(Error::TreeMismatch);
                }
                return Ok(matches.contains(&node));
            }
        }
        self.with_matches(tree, |matches| matches.contains(&node))
    }

    /// Tests `node` against the matches under `root`, rebinding first when
    /// the matcher is bound elsewhere. The rebind and the lookup happen under
    /// one write lock, so a concurrent rebind cannot answer for another root.
    ///
    /// # Errors
    ///
    /// Same as [`is_match`](Self::is_match).
    pub fn match_under(&self, root: RootRef, tree: &YamlTree, node: NodeId) -> Result<bool> {
        {
            let state = self.state.read();
            if let (Some(bound), Some(matches)) = (state.root, &state.matches) {
                if bound == root {
                    if root.tree != tree.id() {
                        return Err(Error::TreeMismatch);
                    }
                    return Ok(matches.contains(&node));
                }
            }
        }
        let mut state = self.state.write();
        if state.root != Some(root) {
            debug!(path = %self.raw, root = %root.root, "rebinding matcher");
            state.root = Some(root);
            state.matches = None;
        }
        let found = self
            .fill(&mut state, tree)?
            .is_some_and(|matches| matches.contains(&node));
        Ok(found)
    }

    /// Like [`is_match`](Self::is_match), for callers that already know the
    /// path evaluates cleanly.
    ///
    /// # Panics
    ///
    /// Panics if evaluating the path fails.
    pub fn must_match(&self, tree: &YamlTree, node: NodeId) -> bool {
        match self.is_match(tree, node) {
            Ok(found) => found,
            Err(err) => panic!("{}", err),
        }
    }

    /// All nodes selected under the bound root, in evaluation order.
    pub fn matches(&self, tree: &YamlTree) -> Result<Vec<NodeId>> {
        self.with_matches(tree, |matches| matches.iter().copied().collect())
    }

    fn with_matches<T: Default>(
        &self,
        tree: &YamlTree,
        f: impl FnOnce(&IndexSet<NodeId>) -> T,
    ) -> Result<T> {
        let mut state = self.state.write();
        let result = self.fill(&mut state, tree)?.map(f).unwrap_or_default();
        Ok(result)
    }

    /// Evaluates the path under the bound root unless a result is cached.
    /// `None` when the matcher is unbound.
    fn fill<'s>(
        &self,
        state: &'s mut MatchState,
        tree: &YamlTree,
    ) -> Result<Option<&'s IndexSet<NodeId>>> {
        let Some(root) = state.root else {
            return Ok(None);
        };
        if root.tree != tree.id() {
            return Err(Error::TreeMismatch);
        }
        if state.matches.is_none() {
            let found =
                self.path
                    .find_from(tree, root.root)
                    .map_err(|source| Error::PathLookup {
                        path: self.raw.clone(),
                        source,
                    })?;
            #[cfg(test)]
            self.evaluations.fetch_add(1, Ordering::SeqCst);
            debug!(path = %self.raw, root = %root.root, matches = found.len(), "evaluated path");
            state.matches = Some(found.into_iter().collect());
        }
        Ok(state.matches.as_ref())
    }
}
