//! Path-gated handlers driven through the visitor.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use yamlwalk::document::parser::parse_yaml;
use yamlwalk::document::{NodeId, NodeKind, YamlNode, YamlTree};
use yamlwalk::visitor::{ConditionalHandler, Handler, PathMatcher, Scope, Visitor, VisitorOptions};
use yamlwalk::yamlpath::YamlPath;
use yamlwalk::Error;

const BOOKS: &str = "---
store:
  book:
  - author: Ernest Hemingway
    title: The Old Man and the Sea
  - author: Fyodor Mikhailovich Dostoevsky
    title: Crime and Punishment
  - author: Jane Austen
    title: Sense and Sensibility
  - author: Kurt Vonnegut Jr.
    title: Slaughterhouse-Five
  - author: J. R. R. Tolkien
    title: The Lord of the Rings
";

fn walk<H: Handler>(visitor: &mut Visitor<H>, tree: &mut YamlTree) -> yamlwalk::Result<()> {
    let scope = Scope::new();
    for document in tree.documents().to_vec() {
        visitor.visit(&scope, tree, document)?;
    }
    Ok(())
}

fn find(tree: &YamlTree, path: &str) -> Vec<NodeId> {
    YamlPath::parse(path)
        .unwrap()
        .find(tree, tree.documents()[0])
        .unwrap()
}

fn comment(tree: &YamlTree, id: NodeId) -> Option<&str> {
    tree[id].head_comment.as_deref()
}

#[test]
fn test_handles_documents() {
    let mut tree = parse_yaml("document: 1\n").unwrap();
    let handler = ConditionalHandler::builder()
        .on_document(|_, tree, document| {
            assert_eq!(tree[document].kind, NodeKind::Document);
            tree[document].head_comment = Some("test: handles documents".to_string());
            Ok(())
        })
        .build()
        .unwrap();

    walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();
    let doc = tree.documents()[0];
    assert_eq!(comment(&tree, doc), Some("test: handles documents"));
}

#[test]
fn test_handles_sequences() {
    let mut tree = parse_yaml("document:\n  first: [1, 2, 3]\n  second: [1, 2, 3]\n").unwrap();
    let handler = ConditionalHandler::builder()
        .on_sequence("$..first", |_, tree, key, _| {
            if let Some(key) = key {
                tree[key].head_comment = Some("test: handles sequences".to_string());
            }
            Ok(())
        })
        .build()
        .unwrap();

    walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();

    let document = find(&tree, "$.document")[0];
    let content = tree.children(document).to_vec();
    let text = Some("test: handles sequences");
    assert_eq!(comment(&tree, content[0]), text);
    assert_ne!(comment(&tree, content[1]), text);
    assert_ne!(comment(&tree, content[2]), text);
    assert_ne!(comment(&tree, content[3]), text);
}

#[test]
fn test_handles_mappings() {
    let mut tree = parse_yaml(BOOKS).unwrap();
    let handler = ConditionalHandler::builder()
        .on_mapping("$.store.book[?(@.title=~/^S.*$/)]", |_, tree, key, value| {
            assert_eq!(key, None, "mappings inside a sequence have no key");
            tree[value].head_comment = Some("testing: handles mappings".to_string());
            Ok(())
        })
        .build()
        .unwrap();

    walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();

    let marked: Vec<String> = find(&tree, "$.store.book[*]")
        .into_iter()
        .filter(|book| comment(&tree, *book) == Some("testing: handles mappings"))
        .map(|book| tree[tree.mapping_get(book, "title").unwrap()].value.clone())
        .collect();
    assert_eq!(marked, vec!["Sense and Sensibility", "Slaughterhouse-Five"]);
}

#[test]
fn test_handles_scalars() {
    let mut tree = parse_yaml(BOOKS).unwrap();
    let handler = ConditionalHandler::builder()
        .on_scalar(
            "$.store.book[?(@.title=~/^S.*$/)].title",
            |_, tree, key, _| {
                let key = key.expect("scalars inside a mapping have a key");
                assert_eq!(tree[key].value, "title");
                tree[key].head_comment = Some("testing: handles scalars".to_string());
                Ok(())
            },
        )
        .build()
        .unwrap();

    walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();

    let mut found = 0;
    for book in find(&tree, "$.store.book[*]") {
        for (key, value) in tree.pairs(book) {
            let marked = comment(&tree, key) == Some("testing: handles scalars");
            let expected = tree[key].value == "title" && tree[value].value.starts_with('S');
            assert_eq!(marked, expected);
            found += usize::from(marked);
        }
    }
    assert_eq!(found, 2);
}

#[test]
fn test_handles_aliases() {
    let input = "defaults: &defaults\n  retries: 3\nprod:\n  settings: *defaults\ndev:\n  settings: *defaults\n";
    let mut tree = parse_yaml(input).unwrap();
    let mut seen = Vec::new();
    {
        let handler = ConditionalHandler::builder()
            .on_alias("$.prod.settings", |_, tree, _, value| {
                seen.push(tree[value].value.clone());
                Ok(())
            })
            .build()
            .unwrap();
        walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();
    }
    assert_eq!(seen, vec!["defaults"]);
}

#[test]
fn test_error_halts_the_capability_list_for_that_node() {
    let mut tree = parse_yaml(BOOKS).unwrap();
    let mut second_saw = Vec::new();
    let err = {
        let handler = ConditionalHandler::builder()
            .on_scalar("$.store.book[?(@.title=~/^S.*$/)].title", |_, tree, key, value| {
                if tree[value].value == "Sense and Sensibility" {
                    if let Some(key) = key {
                        tree[key].head_comment = Some("testing: handles errors".to_string());
                    }
                    return Err(Error::handler("it makes no sense"));
                }
                Ok(())
            })
            .on_scalar("$..title", |_, tree, _, value| {
                second_saw.push(tree[value].value.clone());
                Ok(())
            })
            .build()
            .unwrap();
        walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap_err()
    };

    assert_eq!(err.to_string(), "it makes no sense");
    assert!(!second_saw.contains(&"Sense and Sensibility".to_string()));
    assert_eq!(second_saw.len(), 4);

    let keys_marked = find(&tree, "$.store.book[*]")
        .into_iter()
        .flat_map(|book| tree.pairs(book).collect::<Vec<_>>())
        .filter(|(key, _)| comment(&tree, *key) == Some("testing: handles errors"))
        .count();
    assert_eq!(keys_marked, 1);
}

#[test]
fn test_disjoint_path_is_never_called() {
    let mut tree = parse_yaml(BOOKS).unwrap();
    let mut calls = 0;
    {
        let handler = ConditionalHandler::builder()
            .on_scalar("$.store.bicycle.color", |_, _, _, _| {
                calls += 1;
                Ok(())
            })
            .build()
            .unwrap();
        walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();
    }
    assert_eq!(calls, 0);
}

#[test]
fn test_callbacks_see_the_gate_matcher() {
    let mut tree = parse_yaml(BOOKS).unwrap();
    let mut matched = Vec::new();
    {
        let handler = ConditionalHandler::builder()
            .on_scalar("$..author", |scope, tree, _, value| {
                let matcher = scope.matcher().expect("gate installs its matcher");
                assert_eq!(matcher.raw_path(), "$..author");
                let reused = PathMatcher::for_scope(scope, "$..author")?;
                assert!(Arc::ptr_eq(matcher, &reused));
                assert!(reused.is_match(tree, value)?);
                matched.push(tree[value].value.clone());
                Ok(())
            })
            .build()
            .unwrap();
        walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();
    }
    assert_eq!(matched.len(), 5);
    assert_eq!(matched[2], "Jane Austen");
}

#[test]
fn test_matchers_follow_each_document() {
    let input = "name: first\nother: x\n---\nname: second\n---\nnested:\n  name: third\n";
    let mut tree = parse_yaml(input).unwrap();
    let mut names = Vec::new();
    {
        let handler = ConditionalHandler::builder()
            .on_scalar("$.name", |_, tree, _, value| {
                names.push(tree[value].value.clone());
                Ok(())
            })
            .build()
            .unwrap();
        walk(&mut Visitor::new(handler).unwrap(), &mut tree).unwrap();
    }
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn test_requires_at_least_one_callback() {
    let err = ConditionalHandler::builder().build().unwrap_err();
    assert!(matches!(err, Error::NoHandlers));
    assert_eq!(
        err.to_string(),
        "no handlers provided, at least one is expected"
    );
}

#[test]
fn test_invalid_path_fails_build() {
    let err = ConditionalHandler::builder()
        .on_mapping("store[", |_, _, _, _| Ok(()))
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

/// Builds a handler whose document callback must never run, as the walks
/// below never see a document node.
fn skip_check_visitor<'a>(
    path: &str,
    callback: impl FnMut(&Scope, &mut YamlTree, Option<NodeId>, NodeId) -> yamlwalk::Result<()> + 'a,
) -> Visitor<ConditionalHandler<'a>> {
    let handler = ConditionalHandler::builder()
        .on_scalar(path, callback)
        .on_document(|_, _, _| Err(Error::handler("Should not treat as Document Node")))
        .build()
        .unwrap();
    let options = VisitorOptions {
        skip_document_check: true,
    };
    Visitor::with_options(options, handler).unwrap()
}

#[test]
fn test_skip_document_check_pair_without_mapping() {
    let mut tree = YamlTree::new();
    let key = tree.push(YamlNode::scalar("key"));
    let value = tree.push(YamlNode::scalar("value"));
    let pair = tree.push(YamlNode::sequence().with_content(vec![key, value]));

    let mut visitor = skip_check_visitor("$.key", |_, tree, key, _| {
        if let Some(key) = key {
            tree[key].value = "updated".to_string();
        }
        Ok(())
    });
    visitor.visit(&Scope::new(), &mut tree, pair).unwrap();
    assert_eq!(tree[key].value, "updated");
}

#[test]
fn test_skip_document_check_mapping_parent() {
    let mut tree = YamlTree::new();
    let key = tree.push(YamlNode::scalar("key"));
    let value = tree.push(YamlNode::scalar("value"));
    let map = tree.push(YamlNode::mapping().with_content(vec![key, value]));

    let mut visitor = skip_check_visitor("$.key", |_, tree, key, _| {
        if let Some(key) = key {
            tree[key].value = "updated".to_string();
        }
        Ok(())
    });
    visitor.visit(&Scope::new(), &mut tree, map).unwrap();
    assert_eq!(tree[key].value, "updated");
}

#[test]
fn test_skip_document_check_sequences() {
    let mut tree = parse_yaml("[1, 2, 3]").unwrap();
    let seq = tree.children(tree.documents()[0])[0];

    let mut visitor = skip_check_visitor("$[0]", |_, tree, _, value| {
        tree[value] = YamlNode::string("updated");
        Ok(())
    });
    visitor.visit(&Scope::new(), &mut tree, seq).unwrap();

    let first = tree.children(seq)[0];
    assert_eq!(tree[first].value, "updated");
    assert_eq!(tree[tree.children(seq)[1]].value, "2");
}
