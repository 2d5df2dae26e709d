//! Stored OAuth sessions, one file per account name.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::app_config::{self, base_dir};

pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the recorded expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Body of a successful token endpoint response.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only sent on the first exchange
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub expires_in: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

pub struct Session {
    account: String,
    data: SessionData,
}

impl Session {
    pub fn from_tokens(account: &str, tokens: TokenResponse) -> Result<Self> {
        let refresh_token = tokens
            .refresh_token
            .context("Google did not return a refresh token")?;

        Ok(Session {
            account: account.to_string(),
            data: SessionData {
                access_token: tokens.access_token,
                refresh_token,
                expires_at: Utc::now() + Duration::seconds(tokens.expires_in),
            },
        })
    }

    pub fn path_for_account(account: &str) -> Result<PathBuf> {
        let slug = account.replace(['/', '\\', ':'], "_");

        Ok(base_dir()?.join("session").join(format!("{slug}.toml")))
    }

    pub fn access_token(&self) -> &str {
        &self.data.access_token
    }

    /// Load a session and refresh it if expired.
    pub async fn load_valid(account: &str, http: &reqwest::Client) -> Result<Self> {
        let mut session = Self::load(account)?;

        if session.is_expired() {
            session.refresh(http).await?;
        }

        Ok(session)
    }

    fn load(account: &str) -> Result<Self> {
        let path = Self::path_for_account(account)?;

        if !path.exists() {
            anyhow::bail!(
                "No Google session for '{account}'. Run `calmirror auth {account}` first."
            );
        }

        let contents = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read Google OAuth session from {}", path.display())
        })?;

        let data: SessionData = toml::from_str(&contents).with_context(|| {
            format!("Failed to parse Google OAuth session from {}", path.display())
        })?;

        Ok(Session {
            account: account.to_string(),
            data,
        })
    }

    pub fn save(&self) -> Result<PathBuf> {
        let contents = toml::to_string_pretty(&self.data).context("Failed to serialize session")?;

        let path = Self::path_for_account(&self.account)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write session to {}", path.display()))?;

        // Owner-only, the file holds OAuth tokens
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))
                .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
        }

        Ok(path)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_MARGIN_SECS) >= self.data.expires_at
    }

    pub async fn refresh(&mut self, http: &reqwest::Client) -> Result<()> {
        debug!("Refreshing Google access token for '{}'", self.account);

        let creds = app_config::load()?;

        let response = http
            .post(TOKEN_URL)
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("refresh_token", self.data.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .context("Failed to send token refresh request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Failed to refresh token for '{}': {status} - {body}", self.account);
        }

        let tokens: TokenResponse = response
            .json()
            .await
            .context("Failed to parse token refresh response")?;

        self.data.access_token = tokens.access_token;
        self.data.expires_at = Utc::now() + Duration::seconds(tokens.expires_in);
        // Google usually keeps the old refresh token
        if let Some(refresh_token) = tokens.refresh_token {
            self.data.refresh_token = refresh_token;
        }
        self.save()?;

        Ok(())
    }
}
