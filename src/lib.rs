//! Preparation of markdown documentation trees for static site publication.

mod config;
mod flatten;
mod links;
mod path;
mod repo;

pub use config::Config;
pub use flatten::{
    Collision, DEFAULT_EXTENSION, DEFAULT_OUTPUT_DIR, FileEntry, FlatEntry, FlattenedMapping,
    Flattener,
};
pub use links::{LinkBases, LinkPolicy, LinkResolver};
pub use path::normalize;
pub use repo::{BuildContext, DEFAULT_BRANCH, DEFAULT_HOST, DEFAULT_REPOSITORY, RepositoryIdentity};
