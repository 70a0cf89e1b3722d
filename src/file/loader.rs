//! YAML file loading functionality.
//!
//! This module provides functions to load YAML streams from files or stdin,
//! parsing them into `YamlTree` structures that can be walked by a visitor.

use crate::document::parser::parse_yaml;
use crate::document::tree::YamlTree;
use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use std::fs;
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Loads and parses a YAML file from the filesystem.
///
/// Files ending in `.gz` are decompressed first. Every document of the
/// stream ends up in the returned tree.
///
/// # Arguments
///
/// * `path` - The path to the YAML file to load
///
/// # Examples
///
/// ```no_run
/// use yamlwalk::file::loader::load_yaml_file;
///
/// let tree = load_yaml_file("config.yaml").unwrap();
/// println!("{} documents", tree.documents().len());
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file path does not exist or cannot be read
/// - A `.gz` file is not valid gzip data
/// - The file contents are not valid YAML
pub fn load_yaml_file<P: AsRef<Path>>(path: P) -> Result<YamlTree> {
    let path = path.as_ref();

    let is_gzipped = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false);

    let content = if is_gzipped {
        let file = fs::File::open(path).context("Failed to open gzipped file")?;
        decompress(file).context("Failed to decompress gzipped file - file may be corrupted")?
    } else {
        fs::read_to_string(path).context("Failed to read file")?
    };

    parse_yaml(&content).with_context(|| format!("Failed to parse YAML in {}", path.display()))
}

/// Loads and parses YAML from standard input.
///
/// Gzip input is detected by its magic bytes, so compressed streams can be
/// piped in directly.
///
/// # Errors
///
/// This function will return an error if reading stdin fails, the input is
/// neither UTF-8 nor gzip, or the input is not valid YAML.
pub fn load_yaml_from_stdin() -> Result<YamlTree> {
    let mut buffer = Vec::new();
    std::io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;
    parse_bytes(buffer).context("Failed to parse YAML from stdin")
}

/// Parses raw bytes, decompressing them first when they start with the gzip
/// magic number.
pub fn parse_bytes(buffer: Vec<u8>) -> Result<YamlTree> {
    let content = if buffer.starts_with(&GZIP_MAGIC) {
        decompress(buffer.as_slice()).context("Failed to decompress gzipped input")?
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in input")?
    };
    parse_yaml(&content)
}

fn decompress<R: Read>(reader: R) -> Result<String> {
    let mut decoder = GzDecoder::new(reader);
    let mut content = String::new();
    decoder.read_to_string(&mut content)?;
    Ok(content)
}
