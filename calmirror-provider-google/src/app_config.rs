//! OAuth client credentials.
//!
//! User-provided, stored at:
//!   ~/.config/calmirror/google/credentials.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Google OAuth client credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

pub fn base_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Could not determine config directory")?
        .join("calmirror")
        .join("google"))
}

pub fn load() -> Result<Credentials> {
    load_from(&base_dir()?.join("credentials.toml"))
}

pub fn load_from(path: &Path) -> Result<Credentials> {
    if !path.exists() {
        anyhow::bail!(
            "Google credentials not found.\n\n\
            Create {} with:\n\n\
            client_id = \"your-client-id.apps.googleusercontent.com\"\n\
            client_secret = \"your-client-secret\"\n\n\
            See https://console.cloud.google.com/apis/credentials for setup.",
            path.display()
        );
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read credentials from {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse credentials from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_explains_setup() {
        let err = load_from(Path::new("/nonexistent/calmirror/credentials.toml")).unwrap_err();
        assert!(err.to_string().contains("client_secret"));
    }
}
