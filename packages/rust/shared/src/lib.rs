//! Shared types, error model, and configuration for sheetsum.
//!
//! This crate is the foundation depended on by all other sheetsum crates.
//! It provides:
//! - [`SheetsumError`] — the unified error type
//! - Domain types ([`Row`], [`UrlSummary`], [`SummaryMap`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, AuthConfig, SheetConfig, SummarizerConfig, config_dir, config_file_path,
    expand_home, init_config, load_config, load_config_from, validate_sheet,
};
pub use error::{Result, SheetsumError};
pub use types::{Row, SummaryMap, UrlSummary};
