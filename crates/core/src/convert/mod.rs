//! Obsidian to Wiki.js conversion pipeline.
//!
//! A run is three passes over the vault, always in this order:
//!
//! 1. [`LinkRewriter`]: `[x](Folder/Note.md)` becomes `[x](/Folder/Note)`.
//! 2. [`BlockRefResolver`]: `![x](Note.md#^abc)` becomes the marked text.
//! 3. [`MarkerStripper`]: ` ^abc` markers are removed from every line.
//!
//! Every pass re-reads each file from disk and writes it back before moving
//! on, so each pass sees the output of the previous one.

mod block_refs;
mod links;
mod markers;
mod types;

use std::fs;
use std::path::{Path, PathBuf};

pub use block_refs::{BlockRef, BlockRefResolver, find_block_refs, find_block_text};
pub use links::{LinkRewriter, rewrite_links, rewrite_url};
pub use markers::{MarkerStripper, strip_block_markers};
pub use types::*;

use crate::config::types::ConvertConfig;
use crate::vault::{VaultWalker, WalkedFile, read_document};

/// Runs the conversion passes over a vault.
#[derive(Debug)]
pub struct Converter {
    walker: VaultWalker,
    options: ConvertConfig,
}

impl Converter {
    /// Create a converter for the vault at `vault_root`.
    pub fn new(vault_root: &Path, options: ConvertConfig) -> Result<Self, ConvertError> {
        let walker = VaultWalker::new(vault_root)?
            .extension(&options.extension)
            .recursive(true)
            .skip_hidden(options.skip_hidden)
            .exclude(options.excluded_folders.iter().map(PathBuf::from));

        Ok(Self { walker, options })
    }

    /// Canonical vault root.
    pub fn root(&self) -> &Path {
        self.walker.root()
    }

    /// The passes of a full run, in order.
    pub fn passes(&self) -> Vec<Box<dyn Transform>> {
        vec![
            Box::new(LinkRewriter),
            Box::new(BlockRefResolver::new(
                self.root(),
                self.options.decoding,
                self.options.on_unresolved,
            )),
            Box::new(MarkerStripper),
        ]
    }

    /// Run all passes. Stops at the first error; files already written by
    /// earlier passes (or earlier in the failing pass) stay converted.
    pub fn run(&self) -> Result<ConvertReport, ConvertError> {
        let start = std::time::Instant::now();
        let mut report = ConvertReport::default();

        for transform in self.passes() {
            let stats = self.run_pass(transform.as_ref())?;
            tracing::info!(
                "pass {}: {} file(s), {} changed, {} substitution(s)",
                stats.pass,
                stats.files,
                stats.files_changed,
                stats.changes
            );
            report.passes.push(stats);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        Ok(report)
    }

    /// Run a single transform over every file in the vault.
    pub fn run_pass(&self, transform: &dyn Transform) -> Result<PassStats, ConvertError> {
        let mut stats = PassStats::new(transform.pass());

        for file in self.walker.walk()? {
            let applied = self.convert_file(transform, &file)?;

            stats.files += 1;
            stats.changes += applied.changes;
            stats.unresolved += applied.unresolved;
            if applied.changes > 0 {
                stats.files_changed += 1;
            }
        }

        Ok(stats)
    }

    fn convert_file(
        &self,
        transform: &dyn Transform,
        file: &WalkedFile,
    ) -> Result<Applied, ConvertError> {
        let path = &file.absolute_path;
        let text = read_document(path, self.options.decoding)?;
        let applied = transform.apply(path, &text)?;

        // Written back even when unchanged
        fs::write(path, &applied.text)
            .map_err(|source| ConvertError::Write { path: path.clone(), source })?;

        tracing::debug!(
            "{} {}: {} change(s)",
            transform.pass(),
            file.relative_path.display(),
            applied.changes
        );
        Ok(applied)
    }
}
