//! Google Sheets v4 transport for sheetsum.
//!
//! Implements the [`SheetStore`] seam over the `values.get` /
//! `values.update` REST endpoints. Reads tolerate ragged rows and empty
//! ranges; writes are a full-range overwrite (`valueInputOption=RAW`).
//! Authentication lives in [`auth`] and is resolved once when the client
//! is constructed — the client is built for one run and dropped after.

pub mod auth;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use sheetsum_core::SheetStore;
use sheetsum_shared::{AuthConfig, Result, Row, SheetsumError, expand_home};

use crate::auth::Authenticator;

/// Production API endpoint.
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Response body of `values.get`. The API omits `values` entirely for an
/// empty range.
#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Row>,
}

/// Request body of `values.update`.
#[derive(Debug, Serialize)]
struct UpdateBody<'a> {
    values: &'a [Row],
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated Sheets API client, scoped to a single run.
pub struct SheetsClient {
    http: Client,
    base_url: String,
    access_token: String,
}

impl SheetsClient {
    /// Build a client around an already-obtained access token.
    pub fn new(access_token: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SheetsumError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: SHEETS_API_BASE.to_string(),
            access_token,
        })
    }

    /// Resolve credentials per the `[auth]` config section and build an
    /// authenticated client. Runs the consent flow on first use.
    pub async fn connect(auth_config: &AuthConfig) -> Result<Self> {
        let credentials_path = expand_home(&auth_config.credentials_path);
        let token_path = expand_home(&auth_config.token_path);

        let authenticator = Authenticator::new(&credentials_path, &token_path)?;
        let access_token = authenticator.access_token().await?;

        Self::new(access_token)
    }

    /// Point the client at a mock server.
    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/v4/spreadsheets/{spreadsheet_id}/values/{range}",
            self.base_url
        )
    }
}

#[async_trait]
impl SheetStore for SheetsClient {
    async fn read_rows(&self, spreadsheet_id: &str, range: &str) -> Result<Vec<Row>> {
        let url = self.values_url(spreadsheet_id, range);
        debug!(%url, "reading rows");

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(|e| SheetsumError::Transport(format!("read failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Transport(format!(
                "read of {range} rejected: HTTP {status}"
            )));
        }

        let value_range: ValueRange = response
            .json()
            .await
            .map_err(|e| SheetsumError::Transport(format!("invalid read response: {e}")))?;

        Ok(value_range.values)
    }

    async fn write_rows(&self, spreadsheet_id: &str, range: &str, rows: &[Row]) -> Result<()> {
        let url = self.values_url(spreadsheet_id, range);
        debug!(%url, rows = rows.len(), "writing rows");

        let response = self
            .http
            .put(&url)
            .query(&[("valueInputOption", "RAW")])
            .bearer_auth(&self.access_token)
            .json(&UpdateBody { values: rows })
            .send()
            .await
            .map_err(|e| SheetsumError::Transport(format!("write failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Transport(format!(
                "write of {range} rejected: HTTP {status}"
            )));
        }

        Ok(())
    }
}
