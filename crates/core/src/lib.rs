//! Core library for wikiport: rewrites an Obsidian vault's Markdown links
//! in place so the notes can be imported into Wiki.js.

pub mod config;
pub mod convert;
pub mod vault;
