//! Run configuration.
//!
//! One TOML file describes one mirror: the source calendar and search text,
//! the satellite calendar and its sync token, and the run options. Default
//! location is ~/.config/calmirror/config.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{CalMirrorError, CalMirrorResult};
use crate::event::Attendee;
use crate::naming::NamingConfig;

const DEFAULT_MONTHS_TO_LOOK_AHEAD: u32 = 2;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_months_to_look_ahead() -> u32 {
    DEFAULT_MONTHS_TO_LOOK_AHEAD
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_source_account() -> String {
    "source".to_string()
}

fn default_satellite_account() -> String {
    "satellite".to_string()
}

fn default_satellite_calendar() -> String {
    "primary".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Manage next-morning handover reminders for L1 shifts
    #[serde(default)]
    pub use_handover_reminders: bool,

    #[serde(default = "default_months_to_look_ahead")]
    pub months_to_look_ahead: u32,

    /// IANA zone used for "today" and for reminder times; host zone when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    pub source: SourceConfig,
    pub satellite: SatelliteConfig,
}

/// The upstream, read-only calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub calendar_id: String,
    /// Free-text search selecting the events to mirror
    pub search_text: String,
    /// Name of the stored OAuth session used for this calendar
    #[serde(default = "default_source_account")]
    pub account: String,
}

/// The destination calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteConfig {
    #[serde(default = "default_satellite_calendar")]
    pub calendar_id: String,
    pub sync_token: String,
    #[serde(flatten)]
    pub naming: NamingConfig,
    /// Attendees set on every created event
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    #[serde(default = "default_satellite_account")]
    pub account: String,
}

impl SyncConfig {
    pub fn default_path() -> CalMirrorResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalMirrorError::Config("Could not determine config directory".into()))?
            .join("calmirror");

        Ok(config_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> CalMirrorResult<Self> {
        if !path.exists() {
            return Err(CalMirrorError::Config(format!(
                "Config file not found at {}",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CalMirrorResult<Self> {
        let config: SyncConfig =
            toml::from_str(content).map_err(|e| CalMirrorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> CalMirrorResult<()> {
        require("source.calendar_id", &self.source.calendar_id)?;
        require("source.search_text", &self.source.search_text)?;
        require("satellite.calendar_id", &self.satellite.calendar_id)?;
        require("satellite.sync_token", &self.satellite.sync_token)?;

        if self.months_to_look_ahead == 0 {
            return Err(CalMirrorError::Config(
                "months_to_look_ahead must be at least 1".into(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(CalMirrorError::Config(
                "request_timeout_secs must be at least 1".into(),
            ));
        }

        if let Some(name) = &self.time_zone {
            parse_zone(name)?;
        }

        Ok(())
    }

    /// Zone used for "local time": the configured one, else the host's, else UTC.
    pub fn zone(&self) -> CalMirrorResult<Tz> {
        match &self.time_zone {
            Some(name) => parse_zone(name),
            None => Ok(iana_time_zone::get_timezone()
                .ok()
                .and_then(|name| name.parse::<Tz>().ok())
                .unwrap_or(Tz::UTC)),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn require(field: &str, value: &str) -> CalMirrorResult<()> {
    if value.trim().is_empty() {
        return Err(CalMirrorError::Config(format!("{field} must not be empty")));
    }
    Ok(())
}

fn parse_zone(name: &str) -> CalMirrorResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CalMirrorError::Config(format!("Unknown time zone '{name}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
[source]
calendar_id = "rota@group.calendar.google.com"
search_text = "alice"

[satellite]
sync_token = "work"
"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = SyncConfig::from_toml_str(MINIMAL).unwrap();

        assert!(!config.use_handover_reminders);
        assert_eq!(config.months_to_look_ahead, 2);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.satellite.calendar_id, "primary");
        assert_eq!(config.satellite.account, "satellite");
        assert_eq!(config.source.account, "source");
        assert_eq!(config.satellite.naming, NamingConfig::verbatim());
        assert!(config.satellite.attendees.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let content = r#"
use_handover_reminders = true
months_to_look_ahead = 3
time_zone = "Europe/London"

[source]
calendar_id = "rota"
search_text = "alice"
account = "rota-reader"

[satellite]
calendar_id = "primary"
sync_token = "work"
prefix_text = "[Rota] "

[[satellite.attendees]]
email = "alice@example.com"
display_name = "Alice"
response_status = "accepted"
organizer = true
self = true

[[satellite.attendees]]
email = "alice@home.example"
"#;
        let config = SyncConfig::from_toml_str(content).unwrap();

        assert!(config.use_handover_reminders);
        assert_eq!(config.months_to_look_ahead, 3);
        assert_eq!(config.zone().unwrap(), chrono_tz::Europe::London);
        assert_eq!(config.source.account, "rota-reader");
        assert_eq!(config.satellite.naming.prefix_text.as_deref(), Some("[Rota] "));
        assert_eq!(config.satellite.naming.overridden_summary, None);
        assert_eq!(config.satellite.attendees.len(), 2);
        assert!(config.satellite.attendees[0].is_self);
        assert!(config.satellite.attendees[0].organizer);
        assert!(!config.satellite.attendees[1].is_self);
    }

    #[test]
    fn rejects_empty_sync_token() {
        let content = MINIMAL.replace("sync_token = \"work\"", "sync_token = \"\"");
        let err = SyncConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("satellite.sync_token"));
    }

    #[test]
    fn rejects_zero_month_window() {
        let content = format!("months_to_look_ahead = 0\n{MINIMAL}");
        assert!(SyncConfig::from_toml_str(&content).is_err());
    }

    #[test]
    fn rejects_unknown_zone() {
        let content = format!("time_zone = \"Mars/Olympus\"\n{MINIMAL}");
        let err = SyncConfig::from_toml_str(&content).unwrap_err();
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = SyncConfig::load(file.path()).unwrap();
        assert_eq!(config.source.search_text, "alice");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SyncConfig::load(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, CalMirrorError::Config(_)));
    }
}
