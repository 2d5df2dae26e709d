//! Handover reminders for L1 shifts.
//!
//! Creating an L1 shift also books a one-minute "Send handover email" event
//! at 09:00 local time the following morning. Deleting a shift looks for such
//! reminders in the same slot and removes every one found.
//!
//! Planning is pure; only [`find_reminders`] and [`resolve_cleanups`] talk to
//! the calendar.

use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::client::{CalendarClient, EventFilter};
use crate::config::SyncConfig;
use crate::diff::Reconciliation;
use crate::error::{CalMirrorError, CalMirrorResult};
use crate::event::{Attendee, Event, EventDateTime, NewEvent};
use crate::transform::ownership_properties;
use crate::window::{TimeWindow, first_valid_local};

/// Summary of every reminder event.
pub const HANDOVER_SUMMARY: &str = "Send handover email";

/// Suffix after the search text that marks a source shift needing a reminder.
pub const CREATE_TRIGGER_SUFFIX: &str = " L1";

/// Suffix after the search text that marks a satellite shift whose reminder
/// should be cleaned up. Not the same as [`CREATE_TRIGGER_SUFFIX`].
pub const DELETE_TRIGGER_SUFFIX: &str = " (L1)";

const REMINDER_HOUR: u32 = 9;
const REMINDER_LENGTH_MINUTES: i64 = 1;

/// Whether `event` is a handover reminder rather than a mirrored shift.
///
/// Reminders carry the sync token too, so satellite listings return them
/// alongside the shifts.
pub fn is_reminder(event: &Event) -> bool {
    event.summary == HANDOVER_SUMMARY
}

/// A lookup to run against the satellite calendar; every hit gets deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderCleanup {
    /// The satellite shift whose deletion triggered the cleanup
    pub trigger: Event,
    pub window: TimeWindow,
    pub search_text: String,
}

/// Reminder work derived from one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReminderPlan {
    /// (source shift id, reminder payload)
    pub creates: Vec<(String, NewEvent)>,
    pub cleanups: Vec<ReminderCleanup>,
}

impl ReminderPlan {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.cleanups.is_empty()
    }
}

/// Reminder rules for one mirror.
#[derive(Debug, Clone)]
pub struct HandoverReminders {
    search_text: String,
    sync_token: String,
    attendees: Vec<Attendee>,
    zone: Tz,
}

impl HandoverReminders {
    pub fn new(search_text: &str, sync_token: &str, attendees: Vec<Attendee>, zone: Tz) -> Self {
        HandoverReminders {
            search_text: search_text.to_string(),
            sync_token: sync_token.to_string(),
            attendees,
            zone,
        }
    }

    /// `None` when reminders are switched off.
    pub fn from_config(config: &SyncConfig) -> CalMirrorResult<Option<Self>> {
        if !config.use_handover_reminders {
            return Ok(None);
        }

        Ok(Some(Self::new(
            &config.source.search_text,
            &config.satellite.sync_token,
            config.satellite.attendees.clone(),
            config.zone()?,
        )))
    }

    fn create_trigger(&self) -> String {
        format!("{}{}", self.search_text, CREATE_TRIGGER_SUFFIX)
    }

    fn delete_trigger(&self) -> String {
        format!("{}{}", self.search_text, DELETE_TRIGGER_SUFFIX)
    }

    /// Reminder to create alongside the copy of `source`, if it is an L1 shift.
    pub fn reminder_for(&self, source: &Event) -> Option<NewEvent> {
        if source.summary != self.create_trigger() {
            return None;
        }

        let window = self.next_morning(&source.start)?;
        let start = window.min.with_timezone(&self.zone).fixed_offset();
        let end = window.max.with_timezone(&self.zone).fixed_offset();

        Some(NewEvent {
            summary: HANDOVER_SUMMARY.to_string(),
            description: None,
            start: EventDateTime::timed(start).with_time_zone(self.zone.name()),
            end: EventDateTime::timed(end).with_time_zone(self.zone.name()),
            attendees: self.attendees.clone(),
            hangout_link: None,
            use_default_reminders: true,
            private_properties: ownership_properties(&self.sync_token),
        })
    }

    /// Cleanup to run when `satellite` is deleted, if it is an L1 shift.
    pub fn cleanup_for(&self, satellite: &Event) -> Option<ReminderCleanup> {
        if satellite.summary != self.delete_trigger() {
            return None;
        }

        Some(ReminderCleanup {
            trigger: satellite.clone(),
            window: self.next_morning(&satellite.start)?,
            search_text: HANDOVER_SUMMARY.to_string(),
        })
    }

    pub fn plan_reminders(&self, reconciliation: &Reconciliation) -> ReminderPlan {
        ReminderPlan {
            creates: reconciliation
                .creates
                .iter()
                .filter_map(|e| self.reminder_for(e).map(|r| (e.id.clone(), r)))
                .collect(),
            cleanups: reconciliation
                .deletes
                .iter()
                .filter_map(|e| self.cleanup_for(e))
                .collect(),
        }
    }

    /// 09:00 to 09:01 local time on the day after `start`.
    fn next_morning(&self, start: &EventDateTime) -> Option<TimeWindow> {
        let day = start.local_date(&self.zone)?.succ_opt()?;
        let from = at_local(&self.zone, day, REMINDER_HOUR)?;
        Some(TimeWindow::new(
            from,
            from + Duration::minutes(REMINDER_LENGTH_MINUTES),
        ))
    }
}

fn at_local(zone: &Tz, day: NaiveDate, hour: u32) -> Option<DateTime<Utc>> {
    first_valid_local(zone, day.and_time(NaiveTime::from_hms_opt(hour, 0, 0)?))
}

/// Run a cleanup lookup. Every reminder found is returned, even duplicates.
pub async fn find_reminders<C>(client: &C, cleanup: &ReminderCleanup) -> CalMirrorResult<Vec<Event>>
where
    C: CalendarClient + ?Sized,
{
    let found = client
        .list_events(&cleanup.window, &EventFilter::text(&cleanup.search_text))
        .await
        .map_err(|e| match e {
            CalMirrorError::Api(msg) => CalMirrorError::Api(format!(
                "reminder lookup for {}: {msg}",
                client.describe(&cleanup.trigger)
            )),
            other => other,
        })?;

    Ok(found
        .into_iter()
        .filter(|e| e.summary == cleanup.search_text)
        .collect())
}

/// Reminder deletes found by [`resolve_cleanups`].
#[derive(Debug, Default)]
pub struct ResolvedCleanups {
    /// (triggering shift id, reminder to delete)
    pub deletes: Vec<(String, Event)>,
    pub failures: Vec<(ReminderCleanup, CalMirrorError)>,
}

/// Run every cleanup lookup and collect the reminders to delete.
///
/// Reminders already in `planned` (ids) or found by an earlier lookup are not
/// repeated. A failed lookup is recorded and the others still run.
pub async fn resolve_cleanups<C>(
    client: &C,
    cleanups: &[ReminderCleanup],
    planned: &[String],
) -> ResolvedCleanups
where
    C: CalendarClient + ?Sized,
{
    let mut resolved = ResolvedCleanups::default();
    let mut seen: HashSet<String> = planned.iter().cloned().collect();

    for cleanup in cleanups {
        match find_reminders(client, cleanup).await {
            Ok(found) => {
                debug!(
                    "Found {} reminder(s) for {}",
                    found.len(),
                    client.describe(&cleanup.trigger)
                );
                for reminder in found {
                    if seen.insert(reminder.id.clone()) {
                        resolved
                            .deletes
                            .push((cleanup.trigger.id.clone(), reminder));
                    }
                }
            }
            Err(e) => {
                warn!("Reminder lookup failed: {e}");
                resolved.failures.push((cleanup.clone(), e));
            }
        }
    }

    resolved
}
