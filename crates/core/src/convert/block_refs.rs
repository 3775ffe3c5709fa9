//! Block-reference embed resolution.
//!
//! Wiki.js has no notion of block embeds, so `![label](Note.md#^abc123)` is
//! replaced by the text of the line in `Note.md` marked with ` ^abc123`.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::convert::types::{
    Applied, ConvertError, Pass, Transform, UnresolveReason, UnresolvedPolicy,
};
use crate::vault::{Decoding, read_document};

static EMBED_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches ![label](path#^hash). The label may hold one level of
    // brackets (`![[embed]]`) but never `](`, so an earlier image or link on
    // the same line is not swallowed.
    // Captures:
    // 1: path of the embedded note
    // 2: block hash
    Regex::new(
        r"!\[(?:[^\[\]\n]|\[[^\]\n]*\])+\]\(([=a-zA-Z0-9_/?&%+#.\-]+)#\^([=a-zA-Z0-9]+)\)",
    )
    .unwrap()
});

/// A block embed found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRef<'a> {
    /// Byte range of the whole embed.
    pub start: usize,
    pub end: usize,
    /// Path of the embedded note as written.
    pub target: &'a str,
    /// Block hash, without the leading `^`.
    pub hash: &'a str,
}

/// Find every block embed in `text`, in order.
pub fn find_block_refs(text: &str) -> Vec<BlockRef<'_>> {
    EMBED_RE
        .captures_iter(text)
        .filter_map(|cap| {
            let full = cap.get(0)?;
            Some(BlockRef {
                start: full.start(),
                end: full.end(),
                target: cap.get(1)?.as_str(),
                hash: cap.get(2)?.as_str(),
            })
        })
        .collect()
}

/// Find the text of the first line carrying the block marker ` ^hash`.
///
/// The hash must match exactly: ` ^abc` does not match ` ^abcd`. Text after
/// the marker is discarded and trailing whitespace is trimmed.
pub fn find_block_text(text: &str, hash: &str) -> Option<String> {
    let pattern = format!(r"(?m)^(.+) \^{}(?:[^=a-zA-Z0-9]|$)", regex::escape(hash));
    let re = Regex::new(&pattern).ok()?;
    re.captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim_end().to_string())
}

/// Second pass: replaces block embeds with the referenced text.
#[derive(Debug)]
pub struct BlockRefResolver {
    vault_root: PathBuf,
    decoding: Decoding,
    policy: UnresolvedPolicy,
}

impl BlockRefResolver {
    pub fn new(vault_root: &Path, decoding: Decoding, policy: UnresolvedPolicy) -> Self {
        Self { vault_root: vault_root.to_path_buf(), decoding, policy }
    }

    /// Locate the embedded note under the vault root.
    ///
    /// The path is always taken relative to the vault root, never to the
    /// embedding note. Percent-encoded paths (`My%20Note.md`) are decoded
    /// when the literal path does not exist.
    fn locate(&self, target: &str) -> Option<PathBuf> {
        let relative = target.trim_start_matches('/');
        let literal = self.vault_root.join(relative);
        if literal.is_file() {
            return Some(literal);
        }

        let decoded = urlencoding::decode(relative).ok()?;
        let decoded = self.vault_root.join(decoded.as_ref());
        decoded.is_file().then_some(decoded)
    }

    /// Look up the text an embed stands for. The outer error is a hard
    /// failure (e.g. strict decoding); the inner one an unresolved embed.
    fn lookup(
        &self,
        block: &BlockRef<'_>,
    ) -> Result<Result<String, UnresolveReason>, ConvertError> {
        let Some(path) = self.locate(block.target) else {
            return Ok(Err(UnresolveReason::MissingTarget));
        };
        let content = read_document(&path, self.decoding)?;
        Ok(find_block_text(&content, block.hash).ok_or(UnresolveReason::MissingBlock))
    }
}

impl Transform for BlockRefResolver {
    fn pass(&self) -> Pass {
        Pass::BlockRefs
    }

    fn apply(&self, doc: &Path, text: &str) -> Result<Applied, ConvertError> {
        let blocks = find_block_refs(text);
        if blocks.is_empty() {
            return Ok(Applied::unchanged(text));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut changes = 0;
        let mut unresolved = 0;

        for block in &blocks {
            let resolved = self.lookup(block)?;

            out.push_str(&text[last..block.start]);
            match resolved {
                Ok(found) => {
                    out.push_str(&found);
                    changes += 1;
                }
                Err(reason) => match self.policy {
                    UnresolvedPolicy::Abort => {
                        return Err(ConvertError::UnresolvedBlockRef {
                            file: doc.to_path_buf(),
                            target: block.target.to_string(),
                            hash: block.hash.to_string(),
                            reason,
                        });
                    }
                    UnresolvedPolicy::Skip => {
                        tracing::warn!(
                            "Leaving unresolved embed {}#^{} in {}: {}",
                            block.target,
                            block.hash,
                            doc.display(),
                            reason
                        );
                        out.push_str(&text[block.start..block.end]);
                        unresolved += 1;
                    }
                },
            }
            last = block.end;
        }
        out.push_str(&text[last..]);

        Ok(Applied { text: out, changes, unresolved })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn vault_with_target(content: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("target.md"), content).unwrap();
        dir
    }

    fn resolver(root: &Path, policy: UnresolvedPolicy) -> BlockRefResolver {
        BlockRefResolver::new(root, Decoding::Lossy, policy)
    }

    #[test]
    fn test_find_block_refs() {
        let text = "a ![[embed]](target.md#^abc123) b ![x](dir/n.md#^Z9=) c";
        let refs = find_block_refs(text);

        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].target, "target.md");
        assert_eq!(refs[0].hash, "abc123");
        assert_eq!(&text[refs[0].start..refs[0].end], "![[embed]](target.md#^abc123)");
        assert_eq!(refs[1].target, "dir/n.md");
        assert_eq!(refs[1].hash, "Z9=");
    }

    #[test]
    fn test_plain_links_are_not_embeds() {
        assert!(find_block_refs("[x](target.md#^abc) ![img](pic.png)").is_empty());
    }

    #[test]
    fn test_find_block_text_trims_trailing_whitespace() {
        let text = "intro\nSome fact.   ^abc123\nmore";
        assert_eq!(find_block_text(text, "abc123").as_deref(), Some("Some fact."));
    }

    #[test]
    fn test_find_block_text_requires_exact_hash() {
        let text = "Longer ^abc1234\nExact ^abc123\n";
        assert_eq!(find_block_text(text, "abc123").as_deref(), Some("Exact"));
        assert_eq!(find_block_text("Only ^abc1234", "abc123"), None);
    }

    #[test]
    fn test_find_block_text_first_match_wins() {
        let text = "First ^dup\nSecond ^dup\n";
        assert_eq!(find_block_text(text, "dup").as_deref(), Some("First"));
    }

    #[test]
    fn test_find_block_text_crlf() {
        assert_eq!(find_block_text("Body ^h1\r\nnext", "h1").as_deref(), Some("Body"));
    }

    #[test]
    fn test_resolves_embed() {
        let vault = vault_with_target("Some fact. ^abc123\n");
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let applied = r
            .apply(&vault.path().join("source.md"), "> ![[embed]](target.md#^abc123)\n")
            .unwrap();

        assert_eq!(applied.text, "> Some fact.\n");
        assert_eq!(applied.changes, 1);
    }

    #[test]
    fn test_two_embeds_on_one_line() {
        let vault = vault_with_target("One ^a1\nTwo ^b2\n");
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let applied = r
            .apply(
                &vault.path().join("source.md"),
                "![x](target.md#^a1) and ![y](target.md#^b2)",
            )
            .unwrap();

        assert_eq!(applied.text, "One and Two");
        assert_eq!(applied.changes, 2);
    }

    #[test]
    fn test_embed_after_image_keeps_image() {
        let vault = vault_with_target("Body ^h1\n");
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let applied = r
            .apply(&vault.path().join("source.md"), "![img](pic.png) see ![e](target.md#^h1)")
            .unwrap();

        assert_eq!(applied.text, "![img](pic.png) see Body");
        assert_eq!(applied.changes, 1);
    }

    #[test]
    fn test_embed_after_link_keeps_link() {
        let refs = find_block_refs("[a](x.md) ![[e]](target.md#^h1)");

        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].start, 10);
        assert_eq!(refs[0].target, "target.md");
    }

    #[test]
    fn test_leading_slash_and_percent_encoding_resolve_in_vault() {
        let vault = TempDir::new().unwrap();
        fs::create_dir(vault.path().join("Sub Dir")).unwrap();
        fs::write(vault.path().join("Sub Dir/My Note.md"), "Deep ^d1").unwrap();
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let applied = r
            .apply(&vault.path().join("s.md"), "![e](/Sub%20Dir/My%20Note.md#^d1)")
            .unwrap();

        assert_eq!(applied.text, "Deep");
    }

    #[test]
    fn test_missing_block_aborts() {
        let vault = vault_with_target("No markers here\n");
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let err = r.apply(&vault.path().join("s.md"), "![e](target.md#^gone)").unwrap_err();
        match err {
            ConvertError::UnresolvedBlockRef { target, hash, reason, .. } => {
                assert_eq!(target, "target.md");
                assert_eq!(hash, "gone");
                assert_eq!(reason, UnresolveReason::MissingBlock);
            }
            other => panic!("expected UnresolvedBlockRef, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_target_aborts() {
        let vault = TempDir::new().unwrap();
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let err = r.apply(&vault.path().join("s.md"), "![e](nowhere.md#^h1)").unwrap_err();
        assert!(matches!(
            err,
            ConvertError::UnresolvedBlockRef { reason: UnresolveReason::MissingTarget, .. }
        ));
    }

    #[test]
    fn test_skip_policy_keeps_embed() {
        let vault = vault_with_target("Kept ^ok\n");
        let r = resolver(vault.path(), UnresolvedPolicy::Skip);

        let text = "![a](target.md#^gone)\n![b](target.md#^ok)\n";
        let applied = r.apply(&vault.path().join("s.md"), text).unwrap();

        assert_eq!(applied.text, "![a](target.md#^gone)\nKept\n");
        assert_eq!(applied.changes, 1);
        assert_eq!(applied.unresolved, 1);
    }

    #[test]
    fn test_no_embeds_is_unchanged() {
        let vault = TempDir::new().unwrap();
        let r = resolver(vault.path(), UnresolvedPolicy::Abort);

        let applied = r.apply(&vault.path().join("s.md"), "plain text ^h1").unwrap();
        assert_eq!(applied, Applied::unchanged("plain text ^h1"));
    }
}
