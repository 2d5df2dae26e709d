//! Provider-neutral event types.
//!
//! These mirror the shape the calendar API hands back: a start or end is either
//! a timed instant (with an optional IANA zone) or an all-day date. Providers
//! convert their wire types into these, and the decision layer works
//! exclusively with them.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Private extended property holding the sync token on satellite-owned events.
pub const SYNC_TOKEN_PROPERTY: &str = "syncCalendarToken";

/// Start or end of an event.
///
/// Both fields are optional because that is what the remote calendar returns;
/// an event with neither is invalid and is rejected by key extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDateTime {
    pub fn timed(date_time: DateTime<FixedOffset>) -> Self {
        EventDateTime {
            date: None,
            date_time: Some(date_time),
            time_zone: None,
        }
    }

    pub fn all_day(date: NaiveDate) -> Self {
        EventDateTime {
            date: Some(date),
            date_time: None,
            time_zone: None,
        }
    }

    pub fn with_time_zone(mut self, time_zone: &str) -> Self {
        self.time_zone = Some(time_zone.to_string());
        self
    }

    /// Milliseconds since the Unix epoch.
    ///
    /// The timed instant wins over the date; an all-day date resolves to
    /// midnight UTC of that day.
    pub fn instant_millis(&self) -> Option<i64> {
        if let Some(dt) = self.date_time {
            return Some(dt.timestamp_millis());
        }
        self.date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp_millis())
    }

    /// Calendar date of this point as seen from `tz`.
    pub fn local_date<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        match (self.date_time, self.date) {
            (Some(dt), _) => Some(dt.with_timezone(tz).date_naive()),
            (None, Some(d)) => Some(d),
            (None, None) => None,
        }
    }
}

impl fmt::Display for EventDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.date_time, self.date) {
            (Some(dt), _) => write!(f, "{}", dt.to_rfc3339()),
            (None, Some(d)) => write!(f, "{}", d.format("%Y-%m-%d")),
            (None, None) => write!(f, "(no time)"),
        }
    }
}

/// An event attendee.
///
/// Also the shape of the fixed attendee list in the satellite configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// "accepted", "declined", "tentative" or "needsAction"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default)]
    pub organizer: bool,
    #[serde(default, rename = "self")]
    pub is_self: bool,
}

impl Attendee {
    pub fn new(email: &str) -> Self {
        Attendee {
            email: email.to_string(),
            display_name: None,
            response_status: None,
            organizer: false,
            is_self: false,
        }
    }
}

/// A calendar event as read from a calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Opaque identifier assigned by the remote calendar
    pub id: String,
    pub summary: String,
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
    /// Meeting link
    pub hangout_link: Option<String>,
    /// Private extended properties (key -> value)
    pub private_properties: BTreeMap<String, String>,
}

impl Event {
    pub fn new(id: &str, summary: &str, start: EventDateTime, end: EventDateTime) -> Self {
        Event {
            id: id.to_string(),
            summary: summary.to_string(),
            description: None,
            start,
            end,
            attendees: Vec::new(),
            hangout_link: None,
            private_properties: BTreeMap::new(),
        }
    }

    pub fn sync_token(&self) -> Option<&str> {
        self.private_properties
            .get(SYNC_TOKEN_PROPERTY)
            .map(String::as_str)
    }

    pub fn is_owned_by(&self, sync_token: &str) -> bool {
        self.sync_token() == Some(sync_token)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} - {}]", self.summary, self.start, self.end)
    }
}

/// Payload for an event about to be created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    pub summary: String,
    pub description: Option<String>,
    pub start: EventDateTime,
    pub end: EventDateTime,
    pub attendees: Vec<Attendee>,
    pub hangout_link: Option<String>,
    /// Ask the calendar to apply its default popup reminders
    pub use_default_reminders: bool,
    pub private_properties: BTreeMap<String, String>,
}

impl NewEvent {
    /// Materialise the event as the calendar would return it after creation.
    pub fn into_event(self, id: &str) -> Event {
        Event {
            id: id.to_string(),
            summary: self.summary,
            description: self.description,
            start: self.start,
            end: self.end,
            attendees: self.attendees,
            hangout_link: self.hangout_link,
            private_properties: self.private_properties,
        }
    }
}

impl fmt::Display for NewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} - {}]", self.summary, self.start, self.end)
    }
}
