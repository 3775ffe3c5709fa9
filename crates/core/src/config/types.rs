use std::path::PathBuf;

use serde::Deserialize;

use crate::convert::UnresolvedPolicy;
use crate::vault::Decoding;

#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    pub version: u32,
    #[serde(default)]
    pub convert: ConvertConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct ConvertConfig {
    /// How file bytes are turned into text (default: lossy).
    #[serde(default)]
    pub decoding: Decoding,
    /// What to do with an embed whose block cannot be found (default: abort).
    #[serde(default)]
    pub on_unresolved: UnresolvedPolicy,
    /// Extension of the files to convert, with or without the leading dot.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Skip hidden files and directories while walking the vault.
    #[serde(default)]
    pub skip_hidden: bool,
    /// Folders to leave untouched (relative to the vault root).
    #[serde(default)]
    pub excluded_folders: Vec<String>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            decoding: Decoding::default(),
            on_unresolved: UnresolvedPolicy::default(),
            extension: default_extension(),
            skip_hidden: false,
            excluded_folders: Vec::new(),
        }
    }
}

fn default_extension() -> String {
    "md".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    /// Config file the values came from, `None` when running on defaults.
    pub source: Option<PathBuf>,
    pub convert: ConvertConfig,
    pub logging: LoggingConfig,
}
