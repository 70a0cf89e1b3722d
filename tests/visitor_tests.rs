//! Traversal engine behavior: dispatch order, error handling, cancellation
//! and document handling.

use pretty_assertions::assert_eq;
use rstest::rstest;
use std::collections::HashSet;
use yamlwalk::document::parser::parse_yaml;
use yamlwalk::document::{NodeId, NodeKind, YamlNode, YamlTree};
use yamlwalk::visitor::{
    Handler, Scope, Visitor, VisitorOptions, VisitsAlias, VisitsDocument, VisitsMapping,
    VisitsScalar, VisitsSequence,
};
use yamlwalk::Error;

type Pair = (Option<NodeId>, NodeId);

/// Records every dispatch. Kinds it does not expect fail, optionally
/// cancelling the walk.
#[derive(Default)]
struct TraverseAll {
    documents: Vec<NodeId>,
    sequences: Vec<Pair>,
    mappings: Vec<Pair>,
    scalars: Vec<Pair>,
    aliases: Vec<Pair>,
    expects_sequences: bool,
    expects_mappings: bool,
    expects_scalars: bool,
    expects_aliases: bool,
    cancel_on_error: bool,
}

impl TraverseAll {
    fn expecting_all() -> Self {
        Self {
            expects_sequences: true,
            expects_mappings: true,
            expects_scalars: true,
            expects_aliases: true,
            ..Default::default()
        }
    }

    fn unexpected(&self, scope: &Scope, kind: &str) -> yamlwalk::Result<()> {
        if self.cancel_on_error {
            scope.cancel();
        }
        Err(Error::handler(format!("Did not expect to process {}", kind)))
    }

    fn visited(&self) -> Vec<NodeId> {
        self.sequences
            .iter()
            .chain(&self.mappings)
            .chain(&self.scalars)
            .chain(&self.aliases)
            .map(|(_, value)| *value)
            .collect()
    }
}

impl VisitsDocument for TraverseAll {
    fn visit_document(
        &mut self,
        _: &Scope,
        tree: &mut YamlTree,
        document: NodeId,
    ) -> yamlwalk::Result<()> {
        let Some(&content) = tree.children(document).first() else {
            return Ok(());
        };
        match tree[content].kind {
            NodeKind::Mapping => self.documents.push(tree.children(content)[0]),
            _ => self.documents.push(content),
        }
        Ok(())
    }
}

impl VisitsSequence for TraverseAll {
    fn visit_sequence(
        &mut self,
        scope: &Scope,
        _: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> yamlwalk::Result<()> {
        if !self.expects_sequences {
            return self.unexpected(scope, "sequences");
        }
        self.sequences.push((key, value));
        Ok(())
    }
}

impl VisitsMapping for TraverseAll {
    fn visit_mapping(
        &mut self,
        scope: &Scope,
        _: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> yamlwalk::Result<()> {
        if !self.expects_mappings {
            return self.unexpected(scope, "mappings");
        }
        self.mappings.push((key, value));
        Ok(())
    }
}

impl VisitsScalar for TraverseAll {
    fn visit_scalar(
        &mut self,
        scope: &Scope,
        _: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> yamlwalk::Result<()> {
        if !self.expects_scalars {
            return self.unexpected(scope, "scalars");
        }
        self.scalars.push((key, value));
        Ok(())
    }
}

impl VisitsAlias for TraverseAll {
    fn visit_alias(
        &mut self,
        scope: &Scope,
        _: &mut YamlTree,
        key: Option<NodeId>,
        value: NodeId,
    ) -> yamlwalk::Result<()> {
        if !self.expects_aliases {
            return self.unexpected(scope, "aliases");
        }
        self.aliases.push((key, value));
        Ok(())
    }
}

impl Handler for TraverseAll {
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
}

/// Visits every document of `tree`, joining the errors of all of them.
fn walk<H: Handler>(visitor: &mut Visitor<H>, tree: &mut YamlTree) -> yamlwalk::Result<()> {
    let scope = Scope::new();
    let mut errors = Vec::new();
    for document in tree.documents().to_vec() {
        if let Err(err) = visitor.visit(&scope, tree, document) {
            errors.push(err);
        }
    }
    match Error::join(errors) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn text(tree: &YamlTree, pairs: &[Pair]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(key, value)| {
            let key = key.map(|k| tree[k].value.clone()).unwrap_or_default();
            (key, tree[*value].value.clone())
        })
        .collect()
}

fn owned(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Number of value positions below `node`, the count a full walk dispatches.
fn count_values(tree: &YamlTree, node: NodeId) -> usize {
    match tree[node].kind {
        NodeKind::Sequence => tree
            .children(node)
            .iter()
            .map(|child| 1 + count_values(tree, *child))
            .sum(),
        NodeKind::Mapping => tree
            .pairs(node)
            .map(|(_, value)| 1 + count_values(tree, value))
            .sum(),
        _ => 0,
    }
}

#[test]
fn test_handles_empty_documents() {
    let mut tree = parse_yaml("").unwrap();
    let mut visitor = Visitor::new(TraverseAll::default()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();
    assert!(visitor.handler().documents.is_empty());
}

#[test]
fn test_handles_single_documents() {
    let mut tree = parse_yaml("document:\n  first: \"1st\"\n  second: \"2nd\"\n").unwrap();
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    let handler = visitor.handler();
    assert_eq!(handler.documents.len(), 1);
    assert_eq!(tree[handler.documents[0]].value, "document");
    assert_eq!(
        text(&tree, &handler.scalars),
        owned(&[("first", "1st"), ("second", "2nd")])
    );
    assert_eq!(text(&tree, &handler.mappings), owned(&[("document", "")]));
}

#[test]
fn test_handles_multiple_documents() {
    let input = "# first document\ndocument:\n  first: \"1st\"\n  second: \"2nd\"\n---\n# second document\ndocument2:\n  A: \"a\"\n  B: \"b\"\n";
    let mut tree = parse_yaml(input).unwrap();
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    let handler = visitor.handler();
    assert_eq!(handler.documents.len(), 2);
    assert_eq!(
        text(&tree, &handler.scalars),
        owned(&[("first", "1st"), ("second", "2nd"), ("A", "a"), ("B", "b")])
    );
}

#[test]
fn test_handles_leading_document_marker() {
    let mut tree = parse_yaml("---\n# second document\nmessage: hello\n").unwrap();
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    let handler = visitor.handler();
    assert_eq!(handler.documents.len(), 1);
    assert_eq!(text(&tree, &handler.scalars), owned(&[("message", "hello")]));
}

#[test]
fn test_failed_dispatch_skips_subtree_only() {
    let mut tree = parse_yaml("document:\n  first: [1, 2, 3]\n  second: \"2nd\"\n").unwrap();
    let handler = TraverseAll {
        expects_mappings: true,
        expects_scalars: true,
        ..Default::default()
    };
    let mut visitor = Visitor::new(handler).unwrap();
    let err = walk(&mut visitor, &mut tree).unwrap_err();

    assert!(err.to_string().contains("Did not expect to process sequences"));
    assert_eq!(err.errors().count(), 1);
    let handler = visitor.handler();
    assert_eq!(handler.documents.len(), 1);
    assert_eq!(text(&tree, &handler.scalars), owned(&[("second", "2nd")]));
}

#[test]
fn test_all_errors_are_joined() {
    let mut tree = parse_yaml("a: [1]\nb: [2]\nc: {d: 3}\n").unwrap();
    let mut visitor = Visitor::new(TraverseAll::default()).unwrap();
    let err = walk(&mut visitor, &mut tree).unwrap_err();

    let messages: Vec<String> = err.errors().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        vec![
            "Did not expect to process sequences",
            "Did not expect to process sequences",
            "Did not expect to process mappings",
        ]
    );
}

#[test]
fn test_handles_array_based_documents() {
    let mut tree = parse_yaml("---\n- first: \"1st\"\n- second: \"2nd\"\n").unwrap();
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    let handler = visitor.handler();
    assert_eq!(handler.documents.len(), 1);
    assert_eq!(tree[handler.documents[0]].kind, NodeKind::Sequence);
    assert_eq!(tree.children(handler.documents[0]).len(), 2);
    assert!(handler.sequences.is_empty());

    assert_eq!(handler.mappings.len(), 2);
    for (key, value) in &handler.mappings {
        assert_eq!(*key, None, "No key should be passed on sequence items");
        assert_eq!(tree.children(*value).len(), 2);
    }
    assert_eq!(
        text(&tree, &handler.scalars),
        owned(&[("first", "1st"), ("second", "2nd")])
    );
}

#[test]
fn test_dispatch_follows_document_order() {
    let mut tree = parse_yaml("z: 1\na: 2\nm: [x, y]\nb: 3\n").unwrap();
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    assert_eq!(
        text(&tree, &visitor.handler().scalars),
        owned(&[("z", "1"), ("a", "2"), ("", "x"), ("", "y"), ("b", "3")])
    );
}

#[rstest]
#[case::flat("a: 1\nb: 2\n")]
#[case::nested("a:\n  b:\n    c: [1, {d: 2}]\n  e: ~\n")]
#[case::sequence_root("- 1\n- [2, 3]\n- {a: 4}\n")]
#[case::anchors("base: &b {x: 1}\nuse:\n  <<: *b\n  y: *b\n")]
#[case::scalar_root("just a string\n")]
fn test_every_value_is_visited_exactly_once(#[case] input: &str) {
    let mut tree = parse_yaml(input).unwrap();
    let content = tree.children(tree.documents()[0])[0];
    let expected = count_values(&tree, content);

    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    walk(&mut visitor, &mut tree).unwrap();

    let visited = visitor.handler().visited();
    assert_eq!(visited.len(), expected);
    assert_eq!(visited.iter().collect::<HashSet<_>>().len(), expected);
}

/// Cancels the walk when it sees a given scalar.
struct CancelAt {
    value: &'static str,
    seen: Vec<String>,
}

impl VisitsScalar for CancelAt {
    fn visit_scalar(
        &mut self,
        scope: &Scope,
        tree: &mut YamlTree,
        _: Option<NodeId>,
        value: NodeId,
    ) -> yamlwalk::Result<()> {
        self.seen.push(tree[value].value.clone());
        if tree[value].value == self.value {
            scope.cancel();
        }
        Ok(())
    }
}

impl Handler for CancelAt {
    fn as_scalar(&mut self) -> Option<&mut dyn VisitsScalar> {
        Some(self)
    }
}

#[test]
fn test_cancellation_stops_remaining_siblings() {
    let mut tree = parse_yaml("items: [1, 2, 3, 4]\nafter: x\n").unwrap();
    let doc = tree.documents()[0];
    let mut visitor = Visitor::new(CancelAt {
        value: "2",
        seen: Vec::new(),
    })
    .unwrap();

    let scope = Scope::new();
    visitor.visit(&scope, &mut tree, doc).unwrap();

    assert_eq!(visitor.handler().seen, vec!["1", "2"]);
    assert!(!scope.is_cancelled());

    // The caller's scope is untouched, so the next walk runs in full.
    visitor.handler_mut().value = "";
    visitor.handler_mut().seen.clear();
    visitor.visit(&scope, &mut tree, doc).unwrap();
    assert_eq!(visitor.handler().seen, vec!["1", "2", "3", "4", "x"]);
}

#[test]
fn test_cancellation_keeps_errors_already_recorded() {
    let mut tree = parse_yaml("a: [1]\nb: [2]\nc: [3]\n").unwrap();
    let handler = TraverseAll {
        cancel_on_error: true,
        ..Default::default()
    };
    let mut visitor = Visitor::new(handler).unwrap();
    let err = walk(&mut visitor, &mut tree).unwrap_err();
    assert_eq!(err.errors().count(), 1);
}

#[test]
fn test_cancelled_caller_scope_dispatches_nothing() {
    let mut tree = parse_yaml("a: 1\n").unwrap();
    let doc = tree.documents()[0];
    let scope = Scope::new();
    scope.cancel();

    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();
    visitor.visit(&scope, &mut tree, doc).unwrap();
    assert!(visitor.handler().documents.is_empty());
    assert!(visitor.handler().scalars.is_empty());
}

#[test]
fn test_rejects_non_document_nodes() {
    let mut tree = parse_yaml("a: 1\n").unwrap();
    let map = tree.children(tree.documents()[0])[0];
    let mut visitor = Visitor::new(TraverseAll::expecting_all()).unwrap();

    let err = visitor.visit(&Scope::new(), &mut tree, map).unwrap_err();
    assert!(matches!(err, Error::NotADocument));
    assert_eq!(
        err.to_string(),
        "visitor can only be invoked on a document or multi-document input"
    );
    assert!(visitor.handler().scalars.is_empty());
}

#[test]
fn test_skip_document_check_accepts_other_nodes() {
    let mut tree = YamlTree::new();
    let items: Vec<NodeId> = ["1", "2", "3"]
        .into_iter()
        .map(|v| tree.push(YamlNode::scalar(v)))
        .collect();
    let seq = tree.push(YamlNode::sequence().with_content(items));

    let options = VisitorOptions {
        skip_document_check: true,
    };
    let mut visitor = Visitor::with_options(options, TraverseAll::expecting_all()).unwrap();
    visitor.visit(&Scope::new(), &mut tree, seq).unwrap();

    let handler = visitor.handler();
    assert!(handler.documents.is_empty());
    assert_eq!(
        text(&tree, &handler.scalars),
        owned(&[("", "1"), ("", "2"), ("", "3")])
    );
}

#[test]
fn test_skip_document_check_walks_keep_the_tree_size() {
    let mut tree = parse_yaml("a: 1\nb: [2, 3]\nc: {d: 4}\n").unwrap();
    let map = tree.children(tree.documents()[0])[0];
    let two_items = tree.mapping_get(map, "b").unwrap();
    let before = tree.len();

    let options = VisitorOptions {
        skip_document_check: true,
    };
    let mut visitor = Visitor::with_options(options, TraverseAll::expecting_all()).unwrap();
    for _ in 0..100 {
        visitor.visit(&Scope::new(), &mut tree, map).unwrap();
        visitor.visit(&Scope::new(), &mut tree, two_items).unwrap();
    }

    assert_eq!(tree.len(), before);
}

#[test]
fn test_composite_runs_every_member() {
    let input = "document:\n  first: \"1st\"\n  second: \"2nd\"\n";
    let mut tree = parse_yaml(input).unwrap();
    let mut first = TraverseAll::expecting_all();
    let mut second = TraverseAll::expecting_all();

    {
        let handlers: Vec<Box<dyn Handler + '_>> = vec![Box::new(&mut first), Box::new(&mut second)];
        let mut visitor = Visitor::from_handlers(VisitorOptions::default(), handlers).unwrap();
        walk(&mut visitor, &mut tree).unwrap();
    }

    for handler in [&first, &second] {
        assert_eq!(handler.documents.len(), 1);
        assert_eq!(
            text(&tree, &handler.scalars),
            owned(&[("first", "1st"), ("second", "2nd")])
        );
    }
}

#[test]
fn test_composite_failure_does_not_hide_other_members() {
    let input = "document:\n  first: \"1st\"\n  second: \"2nd\"\n";
    let mut tree = parse_yaml(input).unwrap();
    let mut mappings_only = TraverseAll {
        expects_mappings: true,
        ..Default::default()
    };
    let mut scalars_only = TraverseAll {
        expects_scalars: true,
        ..Default::default()
    };

    let err = {
        let handlers: Vec<Box<dyn Handler + '_>> =
            vec![Box::new(&mut mappings_only), Box::new(&mut scalars_only)];
        let mut visitor = Visitor::from_handlers(VisitorOptions::default(), handlers).unwrap();
        walk(&mut visitor, &mut tree).unwrap_err()
    };

    assert!(err.to_string().contains("Did not expect to process mappings"));
    // The failing mapping dispatch skips the subtree for every member.
    assert_eq!(mappings_only.mappings.len(), 1);
    assert_eq!(scalars_only.scalars.len(), 0);
    assert_eq!(err.errors().count(), 1);
}

#[test]
fn test_from_handlers_requires_a_handler() {
    let err = Visitor::from_handlers(VisitorOptions::default(), Vec::new()).unwrap_err();
    assert!(matches!(err, Error::NoHandlers));
}
