//! Shared test utilities for integration tests.
//!
//! Provides helpers for building temporary documentation trees used across
//! multiple test files.

#![allow(dead_code)]

use anyhow::Result;
use std::path::Path;
use tempfile::TempDir;

/// Creates temporary documentation tree with the given files.
///
/// Every file receives a small markdown body naming its own path.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn create_docs_tree(files: &[&str]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    for file in files {
        write_file(dir.path(), file, &format!("# {}\n", file))?;
    }
    Ok(dir)
}

/// Writes file below root, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(root: &Path, path: &str, content: &str) -> Result<()> {
    let file_path = root.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}
