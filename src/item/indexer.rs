use std::path::{Path, PathBuf};

use glob::Pattern;
use walkdir::WalkDir;

use super::FsItem;
use crate::archive_path::ArchivePath;
use crate::{Error, Result};

/// Walks a directory and turns its entries into [`FsItem`]s.
///
/// Entries are visited in file-name order so the resulting item sequence is
/// deterministic. Children are named relative to the root, under an
/// optional prefix.
///
/// # Example
///
/// ```rust,ignore
/// use sevenlink::item::ItemIndexer;
///
/// // every *.log file below ./logs, named "2024/app.log", ...
/// let items = ItemIndexer::new("./logs")
///     .filter("*.log")?
///     .recursive(true)
///     .files_only(true)
///     .index()?;
/// ```
#[derive(Debug, Clone)]
pub struct ItemIndexer {
    root: PathBuf,
    prefix: Option<ArchivePath>,
    include_root: bool,
    recursive: bool,
    files_only: bool,
    filter: Option<Pattern>,
}

impl ItemIndexer {
    /// Creates an indexer for the directory `root`.
    ///
    /// Defaults: recursive, directories included, no filter, no prefix, the
    /// root itself not included.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: None,
            include_root: false,
            recursive: true,
            files_only: false,
            filter: None,
        }
    }

    /// Names children `prefix/<relative path>`.
    pub fn prefix(mut self, prefix: ArchivePath) -> Self {
        self.prefix = Some(prefix);
        self
    }

    /// Also emits the root directory itself, named after the prefix (or the
    /// root's own name when no prefix is set).
    pub fn include_root(mut self, include: bool) -> Self {
        self.include_root = include;
        self
    }

    /// Descends into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Skips directory entries.
    pub fn files_only(mut self, files_only: bool) -> Self {
        self.files_only = files_only;
        self
    }

    /// Keeps only files whose name matches the glob `pattern`.
    ///
    /// `"*"` and the empty string match everything.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for malformed patterns.
    pub fn filter(mut self, pattern: &str) -> Result<Self> {
        self.filter = match pattern {
            "" | "*" => None,
            p => Some(Pattern::new(p).map_err(|e| {
                Error::invalid_argument(format!("invalid filter '{}': {}", p, e))
            })?),
        };
        Ok(self)
    }

    /// The directory being indexed.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn root_name(&self) -> Result<ArchivePath> {
        if let Some(prefix) = &self.prefix {
            return Ok(prefix.clone());
        }
        let name = self.root.file_name().ok_or_else(|| {
            Error::InvalidArchivePath(format!(
                "cannot derive an archive name from '{}'",
                self.root.display()
            ))
        })?;
        ArchivePath::from_relative(Path::new(name))
    }

    fn matches(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|p| p.matches(name))
    }

    /// Walks the directory and returns the items.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the root is not a directory and
    /// [`Error::IoAt`] if an entry cannot be read.
    pub fn index(&self) -> Result<Vec<FsItem>> {
        if !self.root.is_dir() {
            return Err(Error::invalid_argument(format!(
                "'{}' is not a directory",
                self.root.display()
            )));
        }

        let prefix = if self.include_root {
            Some(self.root_name()?)
        } else {
            self.prefix.clone()
        };

        let mut items = Vec::new();
        if self.include_root {
            if let Some(name) = &prefix {
                items.push(FsItem::new(&self.root, name.clone())?);
            }
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.root.clone());
                Error::io_at("Cannot index directory", path, e.into())
            })?;

            let is_dir = entry.file_type().is_dir();
            if is_dir && self.files_only {
                continue;
            }
            if !is_dir && !self.matches(&entry.file_name().to_string_lossy()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            let relative = ArchivePath::from_relative(relative)?;
            let name = match &prefix {
                Some(prefix) => prefix.join(relative.as_str())?,
                None => relative,
            };
            items.push(FsItem::new(entry.path(), name)?);
        }

        log::debug!(
            "indexed {} items under {}",
            items.len(),
            self.root.display()
        );
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::GenericItem;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::write(root.join("a.txt"), b"a").unwrap();
        std::fs::write(root.join("b.log"), b"bb").unwrap();
        std::fs::write(root.join("sub").join("c.txt"), b"ccc").unwrap();
        dir
    }

    fn names(items: &[FsItem]) -> Vec<&str> {
        items.iter().map(|i| i.archive_path().as_str()).collect()
    }

    #[test]
    fn test_whole_tree_with_root() {
        let dir = tree();
        let items = ItemIndexer::new(dir.path().join("root"))
            .include_root(true)
            .index()
            .unwrap();
        assert_eq!(
            names(&items),
            ["root", "root/a.txt", "root/b.log", "root/sub", "root/sub/c.txt"]
        );
        assert!(items[0].is_dir());
    }

    #[test]
    fn test_relative_without_root() {
        let dir = tree();
        let items = ItemIndexer::new(dir.path().join("root"))
            .files_only(true)
            .index()
            .unwrap();
        assert_eq!(names(&items), ["a.txt", "b.log", "sub/c.txt"]);
    }

    #[test]
    fn test_non_recursive_filter() {
        let dir = tree();
        let items = ItemIndexer::new(dir.path().join("root"))
            .recursive(false)
            .files_only(true)
            .filter("*.txt")
            .unwrap()
            .index()
            .unwrap();
        assert_eq!(names(&items), ["a.txt"]);
    }

    #[test]
    fn test_recursive_filter() {
        let dir = tree();
        let items = ItemIndexer::new(dir.path().join("root"))
            .files_only(true)
            .filter("*.txt")
            .unwrap()
            .index()
            .unwrap();
        assert_eq!(names(&items), ["a.txt", "sub/c.txt"]);
    }

    #[test]
    fn test_prefix_renames_root() {
        let dir = tree();
        let items = ItemIndexer::new(dir.path().join("root"))
            .prefix(ArchivePath::new("backup/data").unwrap())
            .include_root(true)
            .recursive(false)
            .index()
            .unwrap();
        assert_eq!(
            names(&items),
            ["backup/data", "backup/data/a.txt", "backup/data/b.log", "backup/data/sub"]
        );
    }

    #[test]
    fn test_invalid_filter() {
        let err = ItemIndexer::new(".").filter("[").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_not_a_directory() {
        let dir = tree();
        let err = ItemIndexer::new(dir.path().join("root").join("a.txt"))
            .index()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }
}
