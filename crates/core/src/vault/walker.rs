//! Vault directory walker.

use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum VaultWalkerError {
    #[error("path is neither a file nor a directory: {0}")]
    NotFound(String),

    #[error("failed to walk vault directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),
}

/// A discovered file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Absolute path to the file.
    pub absolute_path: PathBuf,
    /// Path relative to the walk root (the file name when the root is a file).
    pub relative_path: PathBuf,
}

/// Walker for discovering files with a given extension under a root.
#[derive(Debug)]
pub struct VaultWalker {
    root: PathBuf,
    extension: String,
    recursive: bool,
    skip_hidden: bool,
    /// Folders to exclude from walking (relative paths from the root).
    excluded_folders: Vec<PathBuf>,
}

impl VaultWalker {
    /// Create a recursive walker for `.md` files under `root`.
    ///
    /// A leading `~` is expanded. Fails if `root` is neither a file nor a
    /// directory.
    pub fn new(root: &Path) -> Result<Self, VaultWalkerError> {
        let root = expand_tilde(root)
            .canonicalize()
            .map_err(|_| VaultWalkerError::NotFound(root.display().to_string()))?;

        if !root.is_file() && !root.is_dir() {
            return Err(VaultWalkerError::NotFound(root.display().to_string()));
        }

        Ok(Self {
            root,
            extension: "md".to_string(),
            recursive: true,
            skip_hidden: false,
            excluded_folders: Vec::new(),
        })
    }

    /// Only yield files with this extension (`"md"` and `".md"` are equivalent).
    pub fn extension(mut self, ext: &str) -> Self {
        self.extension = ext.trim_start_matches('.').to_string();
        self
    }

    /// Descend into subdirectories.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Skip entries whose name starts with a dot.
    pub fn skip_hidden(mut self, skip: bool) -> Self {
        self.skip_hidden = skip;
        self
    }

    /// Exclude folders, given relative to the root or as absolute paths
    /// inside it.
    pub fn exclude<I>(mut self, folders: I) -> Self
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let root = self.root.clone();
        self.excluded_folders.extend(folders.into_iter().map(|p| {
            if p.is_absolute() { p.strip_prefix(&root).unwrap_or(&p).to_path_buf() } else { p }
        }));
        self
    }

    /// Lazily yield matching files in directory-iteration order.
    ///
    /// When the root is a file it is yielded as-is, whatever its extension.
    /// Symlinked files and folders are followed; dangling links are skipped
    /// and symlink loops are reported as errors.
    pub fn iter(&self) -> impl Iterator<Item = Result<WalkedFile, VaultWalkerError>> + '_ {
        let max_depth = if self.root.is_file() || self.recursive { usize::MAX } else { 1 };
        let root_is_file = self.root.is_file();

        WalkDir::new(&self.root)
            .follow_links(true)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|e| !self.is_excluded(e))
            .filter_map(move |entry| {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) if is_dangling_link(&e) => {
                        tracing::debug!("Skipping dangling symlink {:?}", e.path());
                        return None;
                    }
                    Err(e) => {
                        return Some(Err(VaultWalkerError::WalkError(
                            self.root.display().to_string(),
                            e,
                        )));
                    }
                };

                let path = entry.path();
                if root_is_file {
                    let name = path.file_name().map(PathBuf::from).unwrap_or_default();
                    return Some(Ok(WalkedFile {
                        absolute_path: path.to_path_buf(),
                        relative_path: name,
                    }));
                }

                if !entry.file_type().is_file() || !self.matches_extension(path) {
                    return None;
                }

                let relative_path =
                    path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
                Some(Ok(WalkedFile { absolute_path: path.to_path_buf(), relative_path }))
            })
    }

    /// Walk the root and return all matching files, sorted by relative path.
    pub fn walk(&self) -> Result<Vec<WalkedFile>, VaultWalkerError> {
        let mut files = self.iter().collect::<Result<Vec<_>, _>>()?;
        files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(files)
    }

    /// Check if an entry should be excluded from walking.
    fn is_excluded(&self, entry: &walkdir::DirEntry) -> bool {
        // Never filter the root itself
        if entry.depth() == 0 {
            return false;
        }

        if self.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            return true;
        }

        if !self.excluded_folders.is_empty()
            && let Ok(relative) = entry.path().strip_prefix(&self.root)
        {
            return self.excluded_folders.iter().any(|excluded| relative.starts_with(excluded));
        }

        false
    }

    fn matches_extension(&self, path: &Path) -> bool {
        path.extension().and_then(|e| e.to_str()).is_some_and(|e| e == self.extension)
    }

    /// Get the canonical root path.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

fn is_dangling_link(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_none()
        && err.path().is_some_and(|p| p.is_symlink() && !p.exists())
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
