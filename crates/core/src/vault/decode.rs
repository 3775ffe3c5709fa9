//! Turning note bytes into text.
//!
//! Note collections routinely contain files with stray non-UTF-8 bytes
//! (copied from PDFs, old editors, etc). The default [`Decoding::Lossy`] mode
//! drops those bytes; [`Decoding::Strict`] rejects the file instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// How file bytes are decoded into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decoding {
    /// Drop malformed UTF-8 sequences without reporting them.
    #[default]
    Lossy,
    /// Fail on malformed UTF-8.
    Strict,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("file {path} is not valid UTF-8 (byte offset {offset})")]
    InvalidUtf8 { path: PathBuf, offset: usize },
}

/// Read a file and decode it according to `mode`.
pub fn read_document(path: &Path, mode: Decoding) -> Result<String, DecodeError> {
    let bytes = fs::read(path)
        .map_err(|source| DecodeError::Read { path: path.to_path_buf(), source })?;
    decode(bytes, mode).map_err(|offset| DecodeError::InvalidUtf8 {
        path: path.to_path_buf(),
        offset,
    })
}

/// Decode raw bytes. On strict failure, returns the offset of the first
/// invalid byte.
pub fn decode(bytes: Vec<u8>, mode: Decoding) -> Result<String, usize> {
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => match mode {
            Decoding::Strict => Err(e.utf8_error().valid_up_to()),
            Decoding::Lossy => {
                let bytes = e.into_bytes();
                let mut text = String::with_capacity(bytes.len());
                let mut dropped = 0;
                for chunk in bytes.utf8_chunks() {
                    text.push_str(chunk.valid());
                    dropped += chunk.invalid().len();
                }
                tracing::debug!("dropped {} malformed byte(s) while decoding", dropped);
                Ok(text)
            }
        },
    }
}
