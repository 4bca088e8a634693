//! Flattening of nested documentation trees.
//!
//! Every matching file under a root directory receives a name that is unique
//! within one flat output directory, built by prefixing the file name with
//! its immediate parent directory name. Files directly under the root keep
//! their name.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn};
use walkdir::{DirEntry, WalkDir};

/// Extension of documentation sources.
pub const DEFAULT_EXTENSION: &str = ".md";

/// Name of the flat output directory, relative to the root.
pub const DEFAULT_OUTPUT_DIR: &str = "_build";

/// Parent name recorded for files directly under the root.
const ROOT_MARKER: &str = ".";

/// Matched source file produced by the directory walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    source_path: PathBuf,
    parent_dir_name: String,
    file_name: String,
}

impl FileEntry {
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Immediate parent directory name, `.` for files under the root.
    pub fn parent_dir_name(&self) -> &str {
        &self.parent_dir_name
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Name of this file in the flat output directory.
    ///
    /// `setup/guide.md` becomes `setup-guide.md`, `README.md` at the root
    /// stays `README.md`.
    pub fn flat_name(&self) -> String {
        if self.parent_dir_name == ROOT_MARKER {
            self.file_name.clone()
        } else {
            format!("{}-{}", self.parent_dir_name, self.file_name)
        }
    }
}

/// Single original path to flat name pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatEntry {
    original_path: PathBuf,
    flat_name: String,
}

impl FlatEntry {
    pub fn original_path(&self) -> &Path {
        &self.original_path
    }

    pub fn flat_name(&self) -> &str {
        &self.flat_name
    }
}

impl From<&FileEntry> for FlatEntry {
    fn from(entry: &FileEntry) -> Self {
        Self {
            original_path: entry.source_path.clone(),
            flat_name: entry.flat_name(),
        }
    }
}

/// Flat name claimed by more than one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub flat_name: String,
    pub sources: Vec<PathBuf>,
}

/// Ordered mapping from source files to flat names, in walk order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FlattenedMapping {
    entries: Vec<FlatEntry>,
}

impl FlattenedMapping {
    pub fn entries(&self) -> &[FlatEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &FlatEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the flat name assigned to `original_path`.
    pub fn flat_name_of(&self, original_path: &Path) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.original_path == original_path)
            .map(|entry| entry.flat_name.as_str())
    }

    /// Returns flat names produced by more than one source, sorted by name.
    ///
    /// Prefixing only the immediate parent leaves `a/docs/x.md` and
    /// `b/docs/x.md` both mapped to `docs-x.md`.
    pub fn collisions(&self) -> Vec<Collision> {
        let mut by_name: BTreeMap<&str, Vec<PathBuf>> = BTreeMap::new();
        for entry in &self.entries {
            by_name
                .entry(entry.flat_name.as_str())
                .or_default()
                .push(entry.original_path.clone());
        }

        by_name
            .into_iter()
            .filter(|(_, sources)| sources.len() > 1)
            .map(|(flat_name, sources)| Collision {
                flat_name: flat_name.to_string(),
                sources,
            })
            .collect()
    }

    /// Copies every source file into `dest` under its flat name.
    ///
    /// Existing files in `dest` are overwritten. Sources are never modified.
    ///
    /// # Returns
    ///
    /// Number of files copied
    ///
    /// # Errors
    ///
    /// Returns error if a source cannot be read or a destination written,
    /// including sources removed since the walk
    pub fn copy_into(&self, dest: &Path) -> Result<usize> {
        fs::create_dir_all(dest)
            .with_context(|| format!("Failed to create output directory: {}", dest.display()))?;

        for entry in &self.entries {
            let target = dest.join(&entry.flat_name);
            fs::copy(&entry.original_path, &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.original_path.display(),
                    target.display()
                )
            })?;
            info!(source = %entry.original_path.display(), target = %target.display(), "copied");
        }

        Ok(self.entries.len())
    }
}

impl<'a> IntoIterator for &'a FlattenedMapping {
    type Item = &'a FlatEntry;
    type IntoIter = std::slice::Iter<'a, FlatEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Computes flat names for documentation sources under a root directory.
///
/// The output directory is excluded from the walk so repeated runs never
/// pick up their own output.
///
/// # Examples
///
/// ```no_run
/// use docprep::Flattener;
///
/// let mapping = Flattener::new("docs").flatten()?;
/// for entry in &mapping {
///     println!("{} -> {}", entry.original_path().display(), entry.flat_name());
/// }
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Flattener {
    root: PathBuf,
    extension: String,
    output_dir: PathBuf,
    strict: bool,
}

impl Flattener {
    /// Creates flattener for `.md` files with output in `<root>/_build`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let output_dir = root.join(DEFAULT_OUTPUT_DIR);
        Self {
            root,
            extension: DEFAULT_EXTENSION.to_string(),
            output_dir,
            strict: false,
        }
    }

    /// Sets the file name suffix selecting sources.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the output directory.
    ///
    /// Relative paths are taken relative to the root. Any directory under the
    /// root carrying the same final name is excluded from the walk.
    pub fn with_output_dir(mut self, output_dir: impl AsRef<Path>) -> Self {
        self.output_dir = self.root.join(output_dir);
        self
    }

    /// Rejects flat name collisions instead of reporting them.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Walks the root and returns matching files in sorted depth first order.
    ///
    /// Unreadable entries below the root are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns error if the root itself cannot be read
    pub fn discover(&self) -> Result<Vec<FileEntry>> {
        let excluded = self.output_dir.file_name();
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_output(entry, excluded));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) if err.depth() == 0 => {
                    return Err(err).with_context(|| {
                        format!("Failed to walk directory: {}", self.root.display())
                    });
                }
                Err(err) => {
                    warn!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                continue;
            }

            let Some(file_name) = entry.file_name().to_str() else {
                warn!(path = %entry.path().display(), "skipping file with non UTF8 name");
                continue;
            };

            if !file_name.ends_with(&self.extension) {
                continue;
            }

            let parent_dir_name = if entry.depth() <= 1 {
                ROOT_MARKER.to_string()
            } else {
                entry
                    .path()
                    .parent()
                    .and_then(Path::file_name)
                    .and_then(|name| name.to_str())
                    .with_context(|| {
                        format!("Invalid parent directory name: {}", entry.path().display())
                    })?
                    .to_string()
            };

            files.push(FileEntry {
                source_path: entry.path().to_path_buf(),
                parent_dir_name,
                file_name: file_name.to_string(),
            });
        }

        Ok(files)
    }

    /// Creates the output directory and computes the flat name mapping.
    ///
    /// No file content is copied; see [`FlattenedMapping::copy_into`].
    ///
    /// # Errors
    ///
    /// Returns error if the output directory cannot be created, the walk
    /// fails, or strict mode is enabled and two sources share a flat name
    pub fn flatten(&self) -> Result<FlattenedMapping> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!(
                "Failed to create output directory: {}",
                self.output_dir.display()
            )
        })?;

        let entries: Vec<FlatEntry> = self
            .discover()?
            .iter()
            .map(|file| {
                let entry = FlatEntry::from(file);
                debug!(source = %entry.original_path.display(), flat = %entry.flat_name, "mapped");
                entry
            })
            .collect();

        let mapping = FlattenedMapping { entries };

        let collisions = mapping.collisions();
        for collision in &collisions {
            warn!(
                flat_name = %collision.flat_name,
                sources = collision.sources.len(),
                "flat name collision"
            );
        }

        if self.strict && let Some(collision) = collisions.first() {
            let sources: Vec<String> = collision
                .sources
                .iter()
                .map(|path| path.display().to_string())
                .collect();
            bail!(
                "Flat name {} produced by multiple files: {}",
                collision.flat_name,
                sources.join(", ")
            );
        }

        Ok(mapping)
    }

    fn is_output(&self, entry: &DirEntry, excluded: Option<&std::ffi::OsStr>) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let skip = entry.path() == self.output_dir.as_path() || Some(entry.file_name()) == excluded;
        if skip {
            trace!(path = %entry.path().display(), "skipping output directory");
        }
        skip
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, path: &str) {
        let file = root.join(path);
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(file, "# doc\n").unwrap();
    }

    fn names(mapping: &FlattenedMapping) -> Vec<&str> {
        mapping.iter().map(FlatEntry::flat_name).collect()
    }

    #[test]
    fn test_flat_name_root_file_unchanged() {
        // Arrange
        let entry = FileEntry {
            source_path: PathBuf::from("./README.md"),
            parent_dir_name: ".".to_string(),
            file_name: "README.md".to_string(),
        };

        // Act & Assert
        assert_eq!(entry.flat_name(), "README.md");
    }

    #[test]
    fn test_flat_name_nested_file_prefixed() {
        // Arrange
        let entry = FileEntry {
            source_path: PathBuf::from("./setup/guide.md"),
            parent_dir_name: "setup".to_string(),
            file_name: "guide.md".to_string(),
        };

        // Act & Assert
        assert_eq!(entry.flat_name(), "setup-guide.md");
    }

    #[test]
    fn test_flatten_maps_tree() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "setup/guide.md");
        write(dir.path(), "cmd/gpu_plugin/README.md");
        write(dir.path(), "cmd/notes.txt");

        // Act
        let mapping = Flattener::new(dir.path()).flatten().expect("Should flatten");

        // Assert
        assert_eq!(names(&mapping), vec!["README.md", "gpu_plugin-README.md", "setup-guide.md"]);
        assert_eq!(
            mapping.flat_name_of(&dir.path().join("setup/guide.md")),
            Some("setup-guide.md")
        );
        assert!(dir.path().join("_build").is_dir(), "Output directory should exist");
    }

    #[test]
    fn test_flatten_custom_extension() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.rst");
        write(dir.path(), "docs/api.rst");
        write(dir.path(), "docs/api.md");

        // Act
        let mapping = Flattener::new(dir.path())
            .with_extension(".rst")
            .flatten()
            .expect("Should flatten");

        // Assert
        assert_eq!(names(&mapping), vec!["docs-api.rst", "index.rst"]);
    }

    #[test]
    fn test_flatten_skips_output_directory() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "guide.md");
        write(dir.path(), "_build/old-guide.md");
        write(dir.path(), "nested/_build/stale.md");

        // Act
        let mapping = Flattener::new(dir.path()).flatten().expect("Should flatten");

        // Assert
        assert_eq!(names(&mapping), vec!["guide.md"]);
    }

    #[test]
    fn test_flatten_is_idempotent_after_copy() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), "setup/guide.md");
        let flattener = Flattener::new(dir.path());

        // Act
        let first = flattener.flatten().expect("First run");
        let copied = first.copy_into(flattener.output_dir()).expect("Copy");
        let second = flattener.flatten().expect("Second run");

        // Assert
        assert_eq!(copied, 2);
        assert_eq!(first, second);
        assert!(flattener.output_dir().join("setup-guide.md").is_file());
    }

    #[test]
    fn test_collisions_reported() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/docs/x.md");
        write(dir.path(), "b/docs/x.md");
        write(dir.path(), "b/docs/y.md");

        // Act
        let mapping = Flattener::new(dir.path()).flatten().expect("Lenient mode");
        let collisions = mapping.collisions();

        // Assert
        assert_eq!(mapping.len(), 3);
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].flat_name, "docs-x.md");
        assert_eq!(collisions[0].sources.len(), 2);
    }

    #[test]
    fn test_strict_rejects_collisions() {
        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/docs/x.md");
        write(dir.path(), "b/docs/x.md");

        // Act
        let result = Flattener::new(dir.path()).with_strict(true).flatten();

        // Assert
        assert!(result.is_err(), "Strict mode should reject collisions");
        assert!(result.unwrap_err().to_string().contains("docs-x.md"));
    }

    #[test]
    fn test_flatten_fails_when_output_cannot_be_created() {
        // Arrange: a regular file blocks directory creation
        let dir = TempDir::new().unwrap();
        write(dir.path(), "guide.md");
        fs::write(dir.path().join("blocker"), "").unwrap();

        // Act
        let result = Flattener::new(dir.path())
            .with_output_dir("blocker/_build")
            .flatten();

        // Assert
        assert!(result.is_err(), "Directory creation failure must abort");
    }

    #[test]
    fn test_discover_missing_root_fails() {
        // Arrange
        let dir = TempDir::new().unwrap();

        // Act
        let result = Flattener::new(dir.path().join("missing")).discover();

        // Assert
        assert!(result.is_err(), "Unreadable root must fail the walk");
    }

    #[cfg(unix)]
    #[test]
    fn test_discover_skips_unreadable_subdirectory() {
        use std::os::unix::fs::PermissionsExt;

        // Arrange
        let dir = TempDir::new().unwrap();
        write(dir.path(), "README.md");
        write(dir.path(), ".cache/hidden.md");
        write(dir.path(), "setup/guide.md");
        let locked = dir.path().join(".cache");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            println!("Skipping: permissions are not enforced for this user");
            return;
        }

        // Act
        let result = Flattener::new(dir.path()).flatten();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Assert
        let mapping = result.expect("Unreadable subdirectory should be skipped");
        assert_eq!(names(&mapping), vec!["README.md", "setup-guide.md"]);
    }

    #[test]
    fn test_flatten_empty_tree() {
        // Arrange
        let dir = TempDir::new().unwrap();

        // Act
        let mapping = Flattener::new(dir.path()).flatten().expect("Should flatten");

        // Assert
        assert!(mapping.is_empty());
        assert!(mapping.collisions().is_empty());
    }
}
