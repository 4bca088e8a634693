//! Path utilities for link rewriting

use anyhow::{Context, Result, bail};
use std::path::{Component, Path};

/// Normalizes a repository relative path into forward slash form.
///
/// Resolves `.` and `..` components lexically without touching the
/// filesystem. The result never has a leading or trailing slash, so it can
/// be appended directly to a base URL ending in `/`.
///
/// # Arguments
///
/// * `path`: Path relative to repository root
///
/// # Returns
///
/// Slash separated path, empty string for the repository root itself
///
/// # Errors
///
/// Returns error if path escapes repository root or contains invalid UTF8
pub fn normalize(path: &Path) -> Result<String> {
    let mut components: Vec<&str> = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(c) => {
                components.push(c.to_str().context("Path contains invalid UTF8")?);
            }
            Component::ParentDir => {
                if components.pop().is_none() {
                    bail!("Path escapes repository root: {}", path.display());
                }
            }
            // Root and prefix markers are dropped: links are repository relative
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Ok(components.join("/"))
}
