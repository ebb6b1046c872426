//! Shared types, error model, and configuration for Clausemap.
//!
//! This crate is the foundation depended on by all other Clausemap crates.
//! It provides:
//! - [`ClausemapError`]: the unified error type
//! - Domain types ([`Obligation`], [`FrameworkRow`], [`Table`])
//! - Configuration ([`AppConfig`], [`RunConfig`], config loading)
//! - Text helpers shared by the pipeline stages ([`text`])

pub mod config;
pub mod error;
pub mod text;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, RunConfig, SourcesConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from, validate_sources,
};
pub use error::{ClausemapError, Result};
pub use types::{FrameworkRow, Obligation, Table, UNKNOWN_DOMAIN, columns};
