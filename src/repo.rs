//! Repository identity and build context.

use std::fmt;

/// Repository used when the build environment does not name one.
pub const DEFAULT_REPOSITORY: &str = "intel/intel-device-plugins-for-kubernetes";

/// Branch hosted links point at when no commit is known.
pub const DEFAULT_BRANCH: &str = "main";

/// Hosting service serving the repository browser.
pub const DEFAULT_HOST: &str = "github.com";

/// Hosting service project in `owner/name` form.
///
/// The value is taken verbatim. Empty or malformed identities are not
/// rejected and simply produce malformed URLs downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryIdentity(String);

impl RepositoryIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        Self(identity.into())
    }

    /// Uses `identity` when supplied and non-empty, otherwise [`DEFAULT_REPOSITORY`].
    pub fn or_default(identity: Option<&str>) -> Self {
        Self::new(
            identity
                .filter(|identity| !identity.is_empty())
                .unwrap_or(DEFAULT_REPOSITORY),
        )
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RepositoryIdentity {
    fn default() -> Self {
        Self::new(DEFAULT_REPOSITORY)
    }
}

impl fmt::Display for RepositoryIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Revision information for the current documentation build.
///
/// A commit is only known inside automated CI builds. Local builds fall
/// back to the branch name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    branch: String,
    commit: Option<String>,
}

impl BuildContext {
    /// Creates build context for `branch`, pinned to `commit` when given.
    ///
    /// An empty commit string is treated as absent, matching how CI
    /// runners leave the variable blank outside of workflow runs.
    pub fn new(branch: impl Into<String>, commit: Option<String>) -> Self {
        Self {
            branch: branch.into(),
            commit: commit.filter(|sha| !sha.is_empty()),
        }
    }

    pub fn branch(&self) -> &str {
        &self.branch
    }

    pub fn commit(&self) -> Option<&str> {
        self.commit.as_deref()
    }

    /// Path segment identifying the revision: the commit if known, else the branch.
    pub fn revision(&self) -> &str {
        self.commit.as_deref().unwrap_or(&self.branch)
    }
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new(DEFAULT_BRANCH, None)
    }
}
