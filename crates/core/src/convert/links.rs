//! Internal link rewriting.
//!
//! Obsidian writes relative targets such as `[x](Folder/Note.md)`; Wiki.js
//! expects `[x](/Folder/Note)`.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::convert::types::{Applied, ConvertError, Pass, Transform};

static LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches the target half of a link: ](url)
    // Captures:
    // 1: url
    Regex::new(r"\]\(([=a-zA-Z0-9_/?&%+#.\-]+)\)").unwrap()
});

/// Compute the rewritten form of a link target, or `None` if it is already
/// in wiki form.
pub fn rewrite_url(url: &str) -> Option<String> {
    if url == "#" {
        return None;
    }

    let mut new_url = url.to_string();
    let mut changed = false;

    if !url.starts_with('/') {
        new_url.insert(0, '/');
        changed = true;
    }

    if let Some(stripped) = new_url.strip_suffix(".md") {
        new_url = stripped.to_string();
        changed = true;
    }

    changed.then_some(new_url)
}

/// Rewrite every internal link target in `text`.
pub fn rewrite_links(text: &str) -> Applied {
    let mut changes = 0;
    let new_text = LINK_RE.replace_all(text, |caps: &Captures| {
        let span = &caps[0];
        let old_url = &caps[1];
        match rewrite_url(old_url) {
            Some(new_url) => {
                changes += 1;
                span.replacen(old_url, &new_url, 1)
            }
            None => span.to_string(),
        }
    });

    Applied { text: new_text.into_owned(), changes, unresolved: 0 }
}

/// First pass: absolute, suffix-free link targets.
#[derive(Debug, Default)]
pub struct LinkRewriter;

impl Transform for LinkRewriter {
    fn pass(&self) -> Pass {
        Pass::Links
    }

    fn apply(&self, _doc: &Path, text: &str) -> Result<Applied, ConvertError> {
        Ok(rewrite_links(text))
    }
}
