//! Optional TOML configuration for a conversion run.

pub mod loader;
pub mod types;
