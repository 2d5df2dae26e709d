//! Comparison keys.
//!
//! Two events are the same shift iff their [`EventKey`]s are equal. The key is
//! computed the same way for source and satellite events, with the naming
//! configuration passed in explicitly.

use serde::{Deserialize, Serialize};

use crate::error::{CalMirrorError, CalMirrorResult};
use crate::event::Event;

/// How satellite event summaries are derived from source summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Prepended to the source summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix_text: Option<String>,
    /// Replaces the source summary entirely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden_summary: Option<String>,
}

impl NamingConfig {
    /// Naming that keeps summaries unchanged.
    ///
    /// Satellite events already carry the rewritten summary, so their keys are
    /// computed with this.
    pub fn verbatim() -> Self {
        NamingConfig::default()
    }

    /// Resolve the summary used for comparison and for new satellite events.
    ///
    /// An override wins outright, then a prefix, then the raw summary. Empty
    /// strings count as unset.
    pub fn comparison_summary(&self, raw_summary: &str) -> String {
        if let Some(overridden) = non_empty(&self.overridden_summary) {
            return overridden.to_string();
        }
        if let Some(prefix) = non_empty(&self.prefix_text) {
            return format!("{prefix}{raw_summary}");
        }
        raw_summary.to_string()
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Identity of an event for matching purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventKey {
    pub summary: String,
    /// Milliseconds since the Unix epoch
    pub start: i64,
    pub end: i64,
}

/// Derive the comparison key of `event` under `naming`.
pub fn compute_key(event: &Event, naming: &NamingConfig) -> CalMirrorResult<EventKey> {
    let start = event
        .start
        .instant_millis()
        .ok_or_else(|| CalMirrorError::invalid_event(&event.id, "start has no date or time"))?;
    let end = event
        .end
        .instant_millis()
        .ok_or_else(|| CalMirrorError::invalid_event(&event.id, "end has no date or time"))?;

    Ok(EventKey {
        summary: naming.comparison_summary(&event.summary),
        start,
        end,
    })
}
