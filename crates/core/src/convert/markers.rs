//! Block marker cleanup.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::convert::types::{Applied, ConvertError, Pass, Transform};

static MARKER_RE: LazyLock<Regex> = LazyLock::new(|| {
    // Matches a line's text up to its last block marker: text ^hash
    // Captures:
    // 1: text before the marker
    // 2: the marker itself, with its leading space
    Regex::new(r"(.+)( \^[=a-zA-Z0-9]+)").unwrap()
});

/// Remove ` ^hash` block markers, keeping the marked text.
pub fn strip_block_markers(text: &str) -> Applied {
    let changes = MARKER_RE.find_iter(text).count();
    if changes == 0 {
        return Applied::unchanged(text);
    }

    let stripped = MARKER_RE.replace_all(text, "${1}");
    Applied { text: stripped.into_owned(), changes, unresolved: 0 }
}

/// Last pass: strips every remaining block marker, referenced or not.
#[derive(Debug, Default)]
pub struct MarkerStripper;

impl Transform for MarkerStripper {
    fn pass(&self) -> Pass {
        Pass::Markers
    }

    fn apply(&self, _doc: &Path, text: &str) -> Result<Applied, ConvertError> {
        Ok(strip_block_markers(text))
    }
}
