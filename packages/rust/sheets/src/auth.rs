//! OAuth2 installed-app credentials for the Sheets API.
//!
//! First run: an interactive consent flow prints the authorization URL,
//! captures the redirect on a loopback listener, exchanges the code, and
//! persists the resulting token to disk. Subsequent runs reuse the
//! persisted token, refreshing it automatically when expired. The core
//! pipeline never sees any of this.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info};
use url::Url;

use sheetsum_shared::{Result, SheetsumError};

/// OAuth scope for spreadsheet read/write access.
const SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Loopback port the consent redirect lands on.
const REDIRECT_PORT: u16 = 59681;

/// Slack subtracted from the recorded expiry so a token is refreshed
/// before it actually lapses mid-run.
const EXPIRY_SKEW_SECS: i64 = 60;

// ---------------------------------------------------------------------------
// Client secrets (credentials.json, Google "installed" schema)
// ---------------------------------------------------------------------------

/// OAuth client secrets loaded from `credentials.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    pub auth_uri: String,
    pub token_uri: String,
}

/// On-disk wrapper: `{"installed": {...}}`.
#[derive(Debug, Deserialize)]
struct SecretsFile {
    installed: ClientSecrets,
}

impl ClientSecrets {
    /// Load secrets from a `credentials.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| SheetsumError::io(path, e))?;
        let file: SecretsFile = serde_json::from_str(&content).map_err(|e| {
            SheetsumError::Auth(format!("invalid credentials file {}: {e}", path.display()))
        })?;
        Ok(file.installed)
    }
}

// ---------------------------------------------------------------------------
// Stored token (token.json)
// ---------------------------------------------------------------------------

/// The persisted offline credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expiry: DateTime<Utc>,
}

impl StoredToken {
    /// Whether the access token is past (or within the skew of) expiry.
    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= self.expiry
    }

    /// Load a previously persisted token, `None` if the file is absent.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| SheetsumError::io(path, e))?;
        let token = serde_json::from_str(&content).map_err(|e| {
            SheetsumError::Auth(format!("invalid token file {}: {e}", path.display()))
        })?;
        Ok(Some(token))
    }

    /// Persist the token for reuse on the next run.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SheetsumError::io(parent, e))?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| SheetsumError::Auth(format!("failed to serialize token: {e}")))?;
        std::fs::write(path, content).map_err(|e| SheetsumError::io(path, e))
    }
}

/// Token endpoint response for both the code exchange and the refresh.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TokenResponse {
    fn into_stored(self, previous_refresh: Option<String>) -> StoredToken {
        StoredToken {
            access_token: self.access_token,
            // A refresh response usually omits the refresh token; keep the
            // one we already had.
            refresh_token: self.refresh_token.or(previous_refresh),
            expiry: Utc::now() + Duration::seconds(self.expires_in),
        }
    }
}

// ---------------------------------------------------------------------------
// Authenticator
// ---------------------------------------------------------------------------

/// Produces a valid access token, refreshing or running the consent flow
/// as needed. Constructed per run; owns no global state.
pub struct Authenticator {
    secrets: ClientSecrets,
    token_path: PathBuf,
    http: Client,
}

impl Authenticator {
    /// Build an authenticator from the configured credential paths.
    pub fn new(credentials_path: &Path, token_path: &Path) -> Result<Self> {
        let secrets = ClientSecrets::load(credentials_path)?;
        let http = Client::new();
        Ok(Self {
            secrets,
            token_path: token_path.to_path_buf(),
            http,
        })
    }

    /// Construct directly from already-loaded secrets.
    pub fn from_secrets(secrets: ClientSecrets, token_path: PathBuf) -> Self {
        Self {
            secrets,
            token_path,
            http: Client::new(),
        }
    }

    /// Return a valid access token, persisting any newly obtained token.
    pub async fn access_token(&self) -> Result<String> {
        let token = match StoredToken::load(&self.token_path)? {
            Some(token) if !token.is_expired() => {
                debug!("reusing persisted access token");
                token
            }
            Some(token) => match token.refresh_token.clone() {
                Some(refresh) => {
                    info!("access token expired, refreshing");
                    let refreshed = self.refresh(&refresh, token.refresh_token).await?;
                    refreshed.save(&self.token_path)?;
                    refreshed
                }
                None => {
                    info!("access token expired and not refreshable, re-running consent");
                    let fresh = self.consent_flow().await?;
                    fresh.save(&self.token_path)?;
                    fresh
                }
            },
            None => {
                info!("no persisted token, running consent flow");
                let fresh = self.consent_flow().await?;
                fresh.save(&self.token_path)?;
                fresh
            }
        };

        Ok(token.access_token)
    }

    /// Exchange a refresh token for a fresh access token.
    async fn refresh(
        &self,
        refresh_token: &str,
        previous_refresh: Option<String>,
    ) -> Result<StoredToken> {
        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
            ])
            .send()
            .await
            .map_err(|e| SheetsumError::Auth(format!("token refresh request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Auth(format!(
                "token refresh rejected: HTTP {status}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsumError::Auth(format!("invalid token response: {e}")))?;

        Ok(parsed.into_stored(previous_refresh))
    }

    /// Interactive first-run consent: print the authorization URL, wait
    /// for the browser redirect on the loopback listener, exchange the
    /// authorization code.
    async fn consent_flow(&self) -> Result<StoredToken> {
        let redirect_uri = format!("http://127.0.0.1:{REDIRECT_PORT}");
        let consent_url = Url::parse_with_params(
            &self.secrets.auth_uri,
            &[
                ("client_id", self.secrets.client_id.as_str()),
                ("redirect_uri", redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| SheetsumError::Auth(format!("invalid auth_uri: {e}")))?;

        println!("Open this URL in your browser to authorize sheetsum:");
        println!("{consent_url}");

        let code = wait_for_auth_code().await?;

        let response = self
            .http
            .post(&self.secrets.token_uri)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code.as_str()),
                ("client_id", &self.secrets.client_id),
                ("client_secret", &self.secrets.client_secret),
                ("redirect_uri", &redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| SheetsumError::Auth(format!("code exchange failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetsumError::Auth(format!(
                "code exchange rejected: HTTP {status}"
            )));
        }

        let parsed: TokenResponse = response
            .json()
            .await
            .map_err(|e| SheetsumError::Auth(format!("invalid token response: {e}")))?;

        Ok(parsed.into_stored(None))
    }
}

/// Accept one connection on the loopback redirect port and pull the
/// authorization code out of the request line.
async fn wait_for_auth_code() -> Result<String> {
    let listener = TcpListener::bind(("127.0.0.1", REDIRECT_PORT))
        .await
        .map_err(|e| SheetsumError::Auth(format!("cannot bind redirect port: {e}")))?;

    let (mut stream, _) = listener
        .accept()
        .await
        .map_err(|e| SheetsumError::Auth(format!("redirect accept failed: {e}")))?;

    let mut buf = vec![0u8; 4096];
    let n = stream
        .read(&mut buf)
        .await
        .map_err(|e| SheetsumError::Auth(format!("redirect read failed: {e}")))?;
    let request = String::from_utf8_lossy(&buf[..n]).into_owned();

    let body = "<html><body>Authorization received. You can close this window.</body></html>";
    let reply = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let _ = stream.write_all(reply.as_bytes()).await;

    parse_auth_code(&request)
        .ok_or_else(|| SheetsumError::Auth("redirect carried no authorization code".into()))
}

/// Extract the `code` query parameter from an HTTP request line.
fn parse_auth_code(request: &str) -> Option<String> {
    let request_line = request.lines().next()?;
    let target = request_line.split_whitespace().nth(1)?;
    let url = Url::parse(&format!("http://localhost{target}")).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
}
