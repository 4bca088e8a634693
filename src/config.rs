//! Command line configuration.

use anyhow::{Result, bail};
use clap::Parser;
use std::path::{Component, PathBuf};

use crate::flatten::{DEFAULT_EXTENSION, DEFAULT_OUTPUT_DIR, Flattener};
use crate::links::{LinkBases, LinkPolicy};
use crate::repo::{BuildContext, DEFAULT_BRANCH, DEFAULT_HOST, RepositoryIdentity};

/// Command line configuration for docprep.
///
/// CI provided values (`GITHUB_REPOSITORY`, `GITHUB_SHA`) are captured here
/// once at startup and handed to the components as plain values.
#[derive(Debug, Clone, Parser)]
#[command(name = "docprep", version, about, long_about = None)]
pub struct Config {
    /// Documentation root
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Flat output directory, relative to the root unless absolute
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output: PathBuf,

    /// File name suffix of documentation sources
    #[arg(long, default_value = DEFAULT_EXTENSION)]
    pub extension: String,

    /// Hosting service project (owner/name)
    #[arg(long, env = "GITHUB_REPOSITORY")]
    pub repository: Option<String>,

    /// Branch used for hosted links when no commit is known
    #[arg(long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Commit pinning hosted links, set by CI workflows
    #[arg(long, env = "GITHUB_SHA")]
    pub commit: Option<String>,

    /// Hosting service domain
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Keep file references as local paths instead of hosted links
    #[arg(long)]
    pub local_file_links: bool,

    /// Fail when two files map to the same flat name
    #[arg(long)]
    pub strict: bool,

    /// Copy sources into the output directory under their flat names
    #[arg(long)]
    pub copy: bool,

    /// Print a JSON manifest instead of plain text
    #[arg(long)]
    pub json: bool,

    /// Link targets to resolve, as written in the file given by --from
    #[arg(long, value_name = "LINK", requires = "from")]
    pub resolve: Vec<String>,

    /// Markdown file (relative to the root) the --resolve links appear in
    #[arg(long, value_name = "FILE")]
    pub from: Option<PathBuf>,
}

impl Config {
    /// Parses configuration from command line arguments and environment.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the root path does not exist or is not a directory,
    /// the extension is empty, or the output path has no final directory name.
    pub fn validate(&self) -> Result<()> {
        if !self.root.exists() {
            bail!("Documentation root does not exist: {}", self.root.display());
        }

        if !self.root.is_dir() {
            bail!("Documentation root is not a directory: {}", self.root.display());
        }

        if self.extension.is_empty() {
            bail!("File extension must not be empty");
        }

        // The final component names the directory excluded from the walk
        if !matches!(self.output.components().next_back(), Some(Component::Normal(_))) {
            bail!(
                "Output directory must end in a directory name: {}",
                self.output.display()
            );
        }

        Ok(())
    }

    pub fn repository(&self) -> RepositoryIdentity {
        RepositoryIdentity::or_default(self.repository.as_deref())
    }

    pub fn build_context(&self) -> BuildContext {
        BuildContext::new(self.branch.clone(), self.commit.clone())
    }

    /// Computes link bases and the file rendering switch.
    pub fn link_policy(&self) -> LinkPolicy {
        let bases = LinkBases::new(&self.host, &self.repository(), &self.build_context());
        LinkPolicy::hosted(bases).with_hosted_files(!self.local_file_links)
    }

    pub fn flattener(&self) -> Flattener {
        Flattener::new(&self.root)
            .with_extension(self.extension.clone())
            .with_output_dir(&self.output)
            .with_strict(self.strict)
    }
}
