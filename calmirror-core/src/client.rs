//! Access to a remote calendar.
//!
//! The decision layer never calls this; only `apply`, `sync` and the reminder
//! lookup in `handover` do.

use async_trait::async_trait;

use crate::error::CalMirrorResult;
use crate::event::{Event, NewEvent, SYNC_TOKEN_PROPERTY};
use crate::window::TimeWindow;

/// Which events a listing returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    /// Free-text search (source reads, reminder lookups)
    TextSearch(String),
    /// Equality on a private extended property (satellite reads)
    PrivateProperty { key: String, value: String },
}

impl EventFilter {
    pub fn text(query: &str) -> Self {
        EventFilter::TextSearch(query.to_string())
    }

    /// Events owned by `sync_token`.
    pub fn owned_by(sync_token: &str) -> Self {
        EventFilter::PrivateProperty {
            key: SYNC_TOKEN_PROPERTY.to_string(),
            value: sync_token.to_string(),
        }
    }

    /// Local evaluation of the filter.
    ///
    /// Text search is a case-insensitive substring match on the summary and
    /// description, which is a subset of what a remote calendar searches.
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            EventFilter::TextSearch(query) => {
                let query = query.to_lowercase();
                event.summary.to_lowercase().contains(&query)
                    || event
                        .description
                        .as_deref()
                        .is_some_and(|d| d.to_lowercase().contains(&query))
            }
            EventFilter::PrivateProperty { key, value } => {
                event.private_properties.get(key) == Some(value)
            }
        }
    }
}

/// Read/write access to one calendar.
///
/// Implementations attempt each call once. Result ordering from
/// `list_events` is unspecified.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// Events overlapping `window` and matching `filter`.
    async fn list_events(
        &self,
        window: &TimeWindow,
        filter: &EventFilter,
    ) -> CalMirrorResult<Vec<Event>>;

    async fn create_event(&self, event: &NewEvent) -> CalMirrorResult<Event>;

    /// Delete by id. An event that is already gone counts as deleted.
    async fn delete_event(&self, event_id: &str) -> CalMirrorResult<()>;

    /// Human-readable label for logs. Never used for matching.
    fn describe(&self, event: &Event) -> String {
        event.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventDateTime;

    #[test]
    fn text_search_is_case_insensitive() {
        let mut event = Event::new("e", "Alice L1", EventDateTime::default(), EventDateTime::default());
        assert!(EventFilter::text("alice").matches(&event));
        assert!(!EventFilter::text("bob").matches(&event));

        event.description = Some("covering for Bob".into());
        assert!(EventFilter::text("bob").matches(&event));
    }

    #[test]
    fn property_filter_requires_exact_value() {
        let mut event = Event::new("e", "Alice L1", EventDateTime::default(), EventDateTime::default());
        let filter = EventFilter::owned_by("work");
        assert!(!filter.matches(&event));

        event
            .private_properties
            .insert(SYNC_TOKEN_PROPERTY.into(), "work-2".into());
        assert!(!filter.matches(&event));

        event
            .private_properties
            .insert(SYNC_TOKEN_PROPERTY.into(), "work".into());
        assert!(filter.matches(&event));
    }
}
