//! Link resolution for repository internal references.
//!
//! Local file and directory references in documentation either stay local
//! paths in the built site or become links into the hosting service's
//! repository browser. Directories are always hosted because the publishing
//! pipeline never relocates whole directories.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::path;
use crate::repo::{BuildContext, RepositoryIdentity};

/// Base URLs for hosted file and directory links.
///
/// Both URLs end with exactly one `/` and embed either the commit or the
/// branch of the build, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkBases {
    #[serde(rename = "file_base_url")]
    file_base: String,
    #[serde(rename = "dir_base_url")]
    dir_base: String,
}

impl LinkBases {
    /// Computes base URLs for `repository` at the revision of `context`.
    ///
    /// Composition never fails. The identity is concatenated as given.
    ///
    /// # Arguments
    ///
    /// * `host`: Hosting service domain (e.g. `github.com`)
    /// * `repository`: Project identity in `owner/name` form
    /// * `context`: Branch and optional commit of the current build
    pub fn new(host: &str, repository: &RepositoryIdentity, context: &BuildContext) -> Self {
        let host_base = format!("https://{}/{}/", host, repository);
        let revision = context.revision();

        Self {
            file_base: format!("{host_base}blob/{revision}/"),
            dir_base: format!("{host_base}tree/{revision}/"),
        }
    }

    pub fn file_base(&self) -> &str {
        &self.file_base
    }

    pub fn dir_base(&self) -> &str {
        &self.dir_base
    }

    /// Hosted URL for a repository relative file path.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}{}", self.file_base, path.trim_start_matches('/'))
    }

    /// Hosted URL for a repository relative directory path.
    pub fn dir_url(&self, path: &str) -> String {
        format!("{}{}", self.dir_base, path.trim_start_matches('/'))
    }
}

/// Rendering policy for local references.
///
/// Pairs the computed base URLs with the switch deciding whether plain file
/// references become hosted links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkPolicy {
    #[serde(flatten)]
    bases: LinkBases,
    hosted_files: bool,
}

impl LinkPolicy {
    /// Creates policy rendering file references as hosted links.
    pub fn hosted(bases: LinkBases) -> Self {
        Self {
            bases,
            hosted_files: true,
        }
    }

    /// Sets whether file references become hosted links.
    pub fn with_hosted_files(mut self, hosted_files: bool) -> Self {
        self.hosted_files = hosted_files;
        self
    }

    pub fn bases(&self) -> &LinkBases {
        &self.bases
    }

    pub fn hosted_files(&self) -> bool {
        self.hosted_files
    }
}

/// Resolves link targets found in a markdown file.
///
/// Transforms repository internal links (./file.md, ../cmd/) relative to the
/// file being processed into hosted URLs or repository relative paths
/// according to a [`LinkPolicy`].
pub struct LinkResolver<'a> {
    policy: &'a LinkPolicy,
    current_path: PathBuf,
}

impl<'a> LinkResolver<'a> {
    /// Creates link resolver for the markdown file at `current_path`.
    ///
    /// # Arguments
    ///
    /// * `policy`: Base URLs and hosted files switch
    /// * `current_path`: Path of the markdown file, relative to repository root
    pub fn new(policy: &'a LinkPolicy, current_path: impl AsRef<Path>) -> Self {
        Self {
            policy,
            current_path: current_path.as_ref().to_path_buf(),
        }
    }

    /// Resolves link target to its published form.
    ///
    /// Handles different link types:
    /// - Absolute URLs (https://, mailto:) remain unchanged
    /// - Anchor links (#section) remain unchanged
    /// - Directory links (./cmd/) resolve to the hosted tree URL
    /// - File links resolve to the hosted blob URL, or to the normalized
    ///   repository path when hosted files are disabled
    ///
    /// A `#fragment` on a relative link is kept.
    ///
    /// # Errors
    ///
    /// Returns error if the link escapes the repository root or contains
    /// invalid characters
    pub fn resolve(&self, link: &str) -> Result<String> {
        if is_external(link) || link.starts_with('#') {
            return Ok(link.to_string());
        }

        let (target, fragment) = match link.split_once('#') {
            Some((target, fragment)) => (target, Some(fragment)),
            None => (link, None),
        };

        let current_dir = self.current_path.parent().unwrap_or_else(|| Path::new(""));
        let joined = if let Some(stripped) = target.strip_prefix('/') {
            // Leading slash means repository root
            PathBuf::from(stripped)
        } else {
            current_dir.join(target)
        };

        let normalized = path::normalize(&joined)
            .with_context(|| format!("Failed to resolve link: {}", link))?;

        let bases = self.policy.bases();
        let mut resolved = if target.is_empty() || target.ends_with('/') {
            if normalized.is_empty() {
                bases.dir_base().to_string()
            } else {
                bases.dir_url(&format!("{}/", normalized))
            }
        } else if self.policy.hosted_files() {
            bases.file_url(&normalized)
        } else {
            normalized
        };

        if let Some(fragment) = fragment {
            resolved.push('#');
            resolved.push_str(fragment);
        }

        Ok(resolved)
    }
}

/// Detects links carrying a URL scheme (https://, mailto:).
fn is_external(link: &str) -> bool {
    if link.contains("://") {
        return true;
    }

    match link.split_once(':') {
        Some((scheme, _)) => {
            scheme.len() > 1
                && scheme
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        None => false,
    }
}
