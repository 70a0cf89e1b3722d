//! YAML file saving functionality.
//!
//! This module provides functions to save `YamlTree` structures to files with
//! atomic write operations and optional backup creation.

use crate::config::Config;
use crate::document::emitter::emit_yaml;
use crate::document::tree::YamlTree;
use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Saves every document of a tree to a file.
///
/// The output is gzip-compressed when `path` ends in `.gz`. When
/// `config.create_backup` is set and the file exists, it is first copied to
/// `<name>.bak`.
///
/// # Arguments
///
/// * `path` - The path where the YAML file should be saved
/// * `tree` - The tree to emit and save
/// * `config` - Configuration carrying the backup setting
///
/// # Examples
///
/// ```no_run
/// use yamlwalk::config::Config;
/// use yamlwalk::document::parser::parse_yaml;
/// use yamlwalk::file::saver::save_yaml_file;
///
/// let tree = parse_yaml("a: 1\n").unwrap();
/// save_yaml_file("output.yaml", &tree, &Config::default()).unwrap();
/// ```
///
/// # Atomic Write
///
/// The YAML is written to `<name>.tmp` next to the target, which is then
/// renamed over the target. The target is never left partially written, and
/// the temporary file is removed when writing or renaming fails.
pub fn save_yaml_file<P: AsRef<Path>>(path: P, tree: &YamlTree, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let compress = path.to_string_lossy().ends_with(".gz");

    if config.create_backup && path.exists() {
        create_backup(path)?;
    }

    let yaml = emit_yaml(tree);

    // Catch emitter bugs before they reach the disk.
    for document in serde_yaml::Deserializer::from_str(&yaml) {
        serde_yaml::Value::deserialize(document)
            .context("Generated invalid YAML - this is a bug in yamlwalk's emitter")?;
    }

    write_file_atomic(path, yaml.as_bytes(), compress)
}

/// Creates a backup of a file by copying it to `<name>.bak`.
fn create_backup(path: &Path) -> Result<()> {
    let backup_path = sibling(path, ".bak")?;
    fs::copy(path, backup_path).context("Failed to create backup")?;
    Ok(())
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> Result<PathBuf> {
    let mut name = path
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid file name"))?
        .to_os_string();
    name.push(suffix);
    Ok(path.with_file_name(name))
}

fn write_file_atomic(path: &Path, data: &[u8], compress: bool) -> Result<()> {
    let temp_path = sibling(path, ".tmp")?;

    let result = write_temp_file(&temp_path, data, compress)
        .and_then(|()| fs::rename(&temp_path, path).context("Failed to rename temp file"));
    if result.is_err() {
        // Best effort: the original error is the one worth reporting.
        let _ = fs::remove_file(&temp_path);
    }
    result
}

fn write_temp_file(temp_path: &Path, data: &[u8], compress: bool) -> Result<()> {
    if compress {
        let file = fs::File::create(temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(temp_path, data).context("Failed to write temp file")?;
    }
    Ok(())
}
