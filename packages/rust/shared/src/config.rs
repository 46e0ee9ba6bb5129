//! Application configuration for sheetsum.
//!
//! User config lives at `~/.sheetsum/sheetsum.toml`. The spreadsheet id
//! and read/write ranges are config constants, not CLI flags — one run
//! processes one configured sheet.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SheetsumError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "sheetsum.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".sheetsum";

// ---------------------------------------------------------------------------
// Config structs (matching sheetsum.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Target spreadsheet settings.
    #[serde(default)]
    pub sheet: SheetConfig,

    /// Summarization inference settings.
    #[serde(default)]
    pub summarizer: SummarizerConfig,

    /// OAuth credential file locations.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// `[sheet]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetConfig {
    /// Spreadsheet identifier (the long id in the sheet URL).
    #[serde(default)]
    pub spreadsheet_id: String,

    /// A1-notation range to read.
    #[serde(default = "default_range")]
    pub read_range: String,

    /// A1-notation range to write. Usually identical to `read_range`.
    #[serde(default = "default_range")]
    pub write_range: String,
}

impl Default for SheetConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            read_range: default_range(),
            write_range: default_range(),
        }
    }
}

fn default_range() -> String {
    "Sheet1!A:C".into()
}

/// `[summarizer]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Summarization inference endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier sent to the endpoint.
    #[serde(default = "default_model")]
    pub model: String,

    /// Maximum summary length (token-ish units).
    #[serde(default = "default_max_length")]
    pub max_length: u32,

    /// Minimum summary length (token-ish units).
    #[serde(default = "default_min_length")]
    pub min_length: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            max_length: default_max_length(),
            min_length: default_min_length(),
        }
    }
}

fn default_endpoint() -> String {
    "http://127.0.0.1:8090/summarize".into()
}
fn default_model() -> String {
    "t5-small".into()
}
fn default_max_length() -> u32 {
    200
}
fn default_min_length() -> u32 {
    50
}

/// `[auth]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Path to the OAuth client secrets file (Google "installed" schema).
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Path where the authorized user token is persisted between runs.
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_path: default_token_path(),
        }
    }
}

fn default_credentials_path() -> String {
    "~/.sheetsum/credentials.json".into()
}
fn default_token_path() -> String {
    "~/.sheetsum/token.json".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.sheetsum/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SheetsumError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.sheetsum/sheetsum.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SheetsumError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SheetsumError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SheetsumError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| SheetsumError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SheetsumError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Check that the sheet section names a spreadsheet before a run starts.
pub fn validate_sheet(config: &AppConfig) -> Result<()> {
    if config.sheet.spreadsheet_id.is_empty() {
        return Err(SheetsumError::config(
            "spreadsheet_id is not set. Run `sheetsum config init` and edit \
             ~/.sheetsum/sheetsum.toml",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("read_range"));
        assert!(toml_str.contains("Sheet1!A:C"));
        assert!(toml_str.contains("t5-small"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.summarizer.max_length, 200);
        assert_eq!(parsed.summarizer.min_length, 50);
        assert_eq!(parsed.sheet.read_range, "Sheet1!A:C");
    }

    #[test]
    fn config_with_sheet_section() {
        let toml_str = r#"
[sheet]
spreadsheet_id = "1AbcDEF"
read_range = "Links!A:C"
write_range = "Links!A:C"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sheet.spreadsheet_id, "1AbcDEF");
        assert_eq!(config.sheet.read_range, "Links!A:C");
        // Unspecified sections fall back to defaults
        assert_eq!(config.summarizer.model, "t5-small");
    }

    #[test]
    fn sheet_validation() {
        let mut config = AppConfig::default();
        assert!(validate_sheet(&config).is_err());

        config.sheet.spreadsheet_id = "1AbcDEF".into();
        assert!(validate_sheet(&config).is_ok());
    }

    #[test]
    fn expand_home_leaves_absolute_paths() {
        assert_eq!(expand_home("/tmp/x.json"), PathBuf::from("/tmp/x.json"));
    }
}
