//! Integration tests for file I/O operations.

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};
use yamlwalk::config::Config;
use yamlwalk::document::emitter::emit_yaml;
use yamlwalk::document::NodeKind;
use yamlwalk::file::loader::parse_bytes;
use yamlwalk::file::{load_yaml_file, save_yaml_file};

#[test]
fn test_load_simple_yaml_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "name: test\nitems: [1, 2]\n").unwrap();

    let tree = load_yaml_file(temp_file.path()).unwrap();

    assert_eq!(tree.documents().len(), 1);
    let root = tree.children(tree.documents()[0])[0];
    assert_eq!(tree[root].kind, NodeKind::Mapping);
    let name = tree.mapping_get(root, "name").unwrap();
    assert_eq!(tree[name].value, "test");
}

#[test]
fn test_load_multi_document_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    write!(temp_file, "a: 1\n---\nb: 2\n---\n- c\n").unwrap();

    let tree = load_yaml_file(temp_file.path()).unwrap();
    assert_eq!(tree.documents().len(), 3);
}

#[test]
fn test_load_missing_file() {
    let dir = TempDir::new().unwrap();
    assert!(load_yaml_file(dir.path().join("missing.yaml")).is_err());
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.yaml");
    let tree = parse_bytes(b"base: &b {x: 1}\nchild:\n  <<: *b\n---\nother: true\n".to_vec()).unwrap();

    save_yaml_file(&path, &tree, &Config::default()).unwrap();

    let reloaded = load_yaml_file(&path).unwrap();
    assert_eq!(emit_yaml(&reloaded), emit_yaml(&tree));
    assert!(!dir.path().join("out.yaml.tmp").exists());
}

#[test]
fn test_save_leaves_unrelated_tmp_file_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.yaml");
    let unrelated = dir.path().join("out.tmp");
    std::fs::write(&unrelated, "keep me\n").unwrap();
    let tree = parse_bytes(b"a: 1\n".to_vec()).unwrap();

    save_yaml_file(&path, &tree, &Config::default()).unwrap();

    assert_eq!(std::fs::read_to_string(&unrelated).unwrap(), "keep me\n");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "a: 1\n");
}

#[test]
fn test_failed_save_removes_temp_file() {
    let dir = TempDir::new().unwrap();
    // A directory cannot be replaced by a file, so the final rename fails.
    let path = dir.path().join("out.yaml");
    std::fs::create_dir(&path).unwrap();
    let tree = parse_bytes(b"a: 1\n".to_vec()).unwrap();

    assert!(save_yaml_file(&path, &tree, &Config::default()).is_err());

    assert!(path.is_dir());
    assert!(!dir.path().join("out.yaml.tmp").exists());
}

#[test]
fn test_gzip_roundtrip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("out.yaml.gz");
    let tree = parse_bytes(b"list:\n  - one\n  - two\n".to_vec()).unwrap();

    save_yaml_file(&path, &tree, &Config::default()).unwrap();

    assert!(!dir.path().join("out.yaml.gz.tmp").exists());
    let raw = std::fs::read(&path).unwrap();
    assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    let reloaded = load_yaml_file(&path).unwrap();
    assert_eq!(emit_yaml(&reloaded), "list:\n  - one\n  - two\n");
}

#[test]
fn test_gzip_detected_without_extension() {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(b"key: value\n").unwrap();
    let tree = parse_bytes(encoder.finish().unwrap()).unwrap();

    let root = tree.children(tree.documents()[0])[0];
    let value = tree.mapping_get(root, "key").unwrap();
    assert_eq!(tree[value].value, "value");
}

#[test]
fn test_backup_created_when_enabled() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.yaml");
    std::fs::write(&path, "old: 1\n").unwrap();

    let tree = parse_bytes(b"new: 2\n".to_vec()).unwrap();
    let config = Config {
        create_backup: true,
        ..Default::default()
    };
    save_yaml_file(&path, &tree, &config).unwrap();

    let backup = dir.path().join("data.yaml.bak");
    assert_eq!(std::fs::read_to_string(backup).unwrap(), "old: 1\n");
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "new: 2\n");
}

#[test]
fn test_no_backup_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.yaml");
    std::fs::write(&path, "old: 1\n").unwrap();

    let tree = parse_bytes(b"new: 2\n".to_vec()).unwrap();
    save_yaml_file(&path, &tree, &Config::default()).unwrap();

    assert!(!dir.path().join("data.yaml.bak").exists());
}
