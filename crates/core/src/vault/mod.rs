//! Vault file discovery and document decoding.
//!
//! This module provides utilities for walking vault directories and
//! turning the bytes of a note back into text.

pub mod decode;
pub mod walker;

pub use decode::{Decoding, DecodeError, decode, read_document};
pub use walker::{VaultWalker, VaultWalkerError, WalkedFile, expand_tilde};
