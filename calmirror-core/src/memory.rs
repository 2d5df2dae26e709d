//! In-process calendar.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::client::{CalendarClient, EventFilter};
use crate::error::{CalMirrorError, CalMirrorResult};
use crate::event::{Event, NewEvent};
use crate::window::TimeWindow;

#[derive(Default)]
struct State {
    events: Vec<Event>,
    next_id: u64,
    failing_summaries: HashSet<String>,
    failing_deletes: HashSet<String>,
    failing_queries: HashSet<String>,
    list_calls: usize,
}

/// A calendar held in memory.
///
/// Listings return events in insertion order. Text searches, creates and
/// deletes can be made to fail for chosen queries / summaries / ids to
/// exercise error handling.
#[derive(Default)]
pub struct MemoryCalendar {
    state: Mutex<State>,
}

impl MemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_events(events: Vec<Event>) -> Self {
        let calendar = Self::new();
        calendar.lock().events = events;
        calendar
    }

    /// Snapshot of the stored events.
    pub fn events(&self) -> Vec<Event> {
        self.lock().events.clone()
    }

    /// Make `create_event` fail for payloads with this summary.
    pub fn fail_creates_for(&self, summary: &str) {
        self.lock().failing_summaries.insert(summary.to_string());
    }

    /// Make `delete_event` fail for this id.
    pub fn fail_deletes_for(&self, event_id: &str) {
        self.lock().failing_deletes.insert(event_id.to_string());
    }

    /// Make `list_events` fail for text searches with this query.
    pub fn fail_lists_for(&self, query: &str) {
        self.lock().failing_queries.insert(query.to_string());
    }

    pub fn list_calls(&self) -> usize {
        self.lock().list_calls
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A poisoned lock only means a test panicked mid-call; the data is still usable
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CalendarClient for MemoryCalendar {
    async fn list_events(
        &self,
        window: &TimeWindow,
        filter: &EventFilter,
    ) -> CalMirrorResult<Vec<Event>> {
        let mut state = self.lock();
        state.list_calls += 1;

        if let EventFilter::TextSearch(query) = filter {
            if state.failing_queries.contains(query) {
                return Err(CalMirrorError::Api(format!("search rejected for '{query}'")));
            }
        }

        Ok(state
            .events
            .iter()
            .filter(|e| filter.matches(e))
            .filter(|e| match (e.start.instant_millis(), e.end.instant_millis()) {
                (Some(start), Some(end)) => window.overlaps(start, end),
                // Events without times are returned so callers see them
                _ => true,
            })
            .cloned()
            .collect())
    }

    async fn create_event(&self, event: &NewEvent) -> CalMirrorResult<Event> {
        let mut state = self.lock();

        if state.failing_summaries.contains(&event.summary) {
            return Err(CalMirrorError::Api(format!(
                "create rejected for '{}'",
                event.summary
            )));
        }

        state.next_id += 1;
        let created = event.clone().into_event(&format!("mem-{}", state.next_id));
        state.events.push(created.clone());

        Ok(created)
    }

    async fn delete_event(&self, event_id: &str) -> CalMirrorResult<()> {
        let mut state = self.lock();

        if state.failing_deletes.contains(event_id) {
            return Err(CalMirrorError::Api(format!("delete rejected for '{event_id}'")));
        }

        state.events.retain(|e| e.id != event_id);
        Ok(())
    }
}
