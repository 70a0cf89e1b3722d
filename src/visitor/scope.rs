//! Per-walk context passed to every handler call.

use super::matcher::PathMatcher;
use crate::document::tree::RootRef;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// State threaded through one walk: the active document root, the active
/// path matcher and the cancellation token.
///
/// Scopes are cheap to clone. Deriving a scope never changes its parent,
/// except that binding a new root re-roots the active matcher, which is
/// shared.
///
/// # Example
///
/// ```
/// use yamlwalk::visitor::Scope;
///
/// let parent = Scope::new();
/// let child = parent.child();
/// child.cancel();
/// assert!(child.is_cancelled());
/// assert!(!parent.is_cancelled());
/// ```
#[derive(Clone, Debug, Default)]
pub struct Scope {
    cancel: CancellationToken,
    root: Option<RootRef>,
    matcher: Option<Arc<PathMatcher>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a scope cancelled together with `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            ..Self::default()
        }
    }

    /// Derives a scope whose cancellation does not propagate upwards.
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            root: self.root,
            matcher: self.matcher.clone(),
        }
    }

    /// Derives a scope rooted at `root`.
    ///
    /// An active matcher is rebound to the new root.
    pub fn with_root(&self, root: RootRef) -> Self {
        if let Some(matcher) = &self.matcher {
            matcher.bind(root);
        }
        Self {
            root: Some(root),
            ..self.clone()
        }
    }

    /// Derives a scope carrying `matcher`, binding it to this scope's root
    /// when it has none yet.
    pub fn with_matcher(&self, matcher: Arc<PathMatcher>) -> Self {
        if matcher.root().is_none() {
            if let Some(root) = self.root {
                matcher.bind(root);
            }
        }
        Self {
            matcher: Some(matcher),
            ..self.clone()
        }
    }

    pub fn root(&self) -> Option<RootRef> {
        self.root
    }

    pub fn matcher(&self) -> Option<&Arc<PathMatcher>> {
        self.matcher.as_ref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Stops the walk this scope belongs to from dispatching further nodes.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::YamlNode;
    use crate::document::tree::YamlTree;

    #[test]
    fn test_parent_cancellation_reaches_children() {
        let token = CancellationToken::new();
        let scope = Scope::with_cancellation(token.clone());
        let child = scope.child().child();
        token.cancel();
        assert!(child.is_cancelled());
    }

    #[test]
    fn test_with_root_rebinds_active_matcher() {
        let mut tree = YamlTree::new();
        let first = tree.push_document(YamlNode::document());
        let second = tree.push_document(YamlNode::document());

        let matcher = Arc::new(PathMatcher::new("$.a").unwrap());
        let scope = Scope::new()
            .with_root(tree.root_ref(first))
            .with_matcher(matcher.clone());
        assert_eq!(matcher.root(), Some(tree.root_ref(first)));

        let nested = scope.with_root(tree.root_ref(second));
        assert_eq!(nested.root(), Some(tree.root_ref(second)));
        assert_eq!(matcher.root(), Some(tree.root_ref(second)));
        assert_eq!(scope.root(), Some(tree.root_ref(first)));
    }
}
