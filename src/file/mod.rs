//! File I/O operations for YAML documents.
//!
//! This module provides functionality to load YAML files from disk or stdin,
//! and save trees back to files with atomic write operations and optional backups.
//! Gzip-compressed input and output are handled transparently.

pub mod loader;
pub mod saver;

pub use loader::{load_yaml_file, load_yaml_from_stdin};
pub use saver::save_yaml_file;
