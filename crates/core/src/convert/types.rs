//! Data structures for the conversion pipeline.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::vault::{DecodeError, VaultWalkerError};

/// Errors that can occur during a conversion run
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    Walker(#[from] VaultWalkerError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("failed to write file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unresolved block reference in {file}: {target}#^{hash} ({reason})")]
    UnresolvedBlockRef { file: PathBuf, target: String, hash: String, reason: UnresolveReason },
}

/// Why an embed could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolveReason {
    /// The referenced file does not exist under the vault root.
    MissingTarget,
    /// The referenced file has no line marked with the hash.
    MissingBlock,
}

impl fmt::Display for UnresolveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingTarget => write!(f, "target file not found"),
            Self::MissingBlock => write!(f, "no line carries this block marker"),
        }
    }
}

/// What to do with an embed whose block cannot be found
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Stop the whole run at the first unresolved embed.
    #[default]
    Abort,
    /// Leave the embed as written, log it, and keep going.
    Skip,
}

/// The three passes, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Links,
    BlockRefs,
    Markers,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Links => "links",
            Self::BlockRefs => "block-refs",
            Self::Markers => "markers",
        };
        f.write_str(name)
    }
}

/// Result of running one transform over one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The transformed text
    pub text: String,
    /// Number of substitutions made
    pub changes: usize,
    /// Embeds left in place under [`UnresolvedPolicy::Skip`]
    pub unresolved: usize,
}

impl Applied {
    pub fn unchanged(text: &str) -> Self {
        Self { text: text.to_string(), changes: 0, unresolved: 0 }
    }
}

/// A pure text transformation applied to every document in a pass.
pub trait Transform {
    /// Which pass this transform implements.
    fn pass(&self) -> Pass;

    /// Transform `text`, the current content of the document at `doc`.
    fn apply(&self, doc: &Path, text: &str) -> Result<Applied, ConvertError>;
}

/// Statistics from one pass over the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub pass: Pass,
    /// Number of files read and written back.
    pub files: usize,
    /// Number of files whose content changed.
    pub files_changed: usize,
    /// Number of substitutions across all files.
    pub changes: usize,
    /// Number of embeds skipped as unresolved.
    pub unresolved: usize,
}

impl PassStats {
    pub fn new(pass: Pass) -> Self {
        Self { pass, files: 0, files_changed: 0, changes: 0, unresolved: 0 }
    }
}

/// Result of a full conversion run
#[derive(Debug, Clone, Default)]
pub struct ConvertReport {
    pub passes: Vec<PassStats>,
    /// Run duration in milliseconds.
    pub duration_ms: u64,
}

impl ConvertReport {
    pub fn stats(&self, pass: Pass) -> Option<&PassStats> {
        self.passes.iter().find(|p| p.pass == pass)
    }

    /// Total embeds left unresolved across the run
    pub fn unresolved(&self) -> usize {
        self.passes.iter().map(|p| p.unresolved).sum()
    }
}
