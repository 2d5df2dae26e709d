//! Calendar v3 JSON shapes and their conversion to calmirror types.

use std::collections::BTreeMap;

use anyhow::{Result, bail};
use calmirror_core::{Attendee, Event, EventDateTime, NewEvent};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleDateTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<FixedOffset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleAttendee {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<bool>,
    #[serde(default, rename = "self", skip_serializing_if = "Option::is_none")]
    pub is_self: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub private: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub shared: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleReminders {
    pub use_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<GoogleDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<GoogleDateTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<GoogleAttendee>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hangout_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extended_properties: Option<ExtendedProperties>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminders: Option<GoogleReminders>,
}

/// One page of an `events.list` response.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsPage {
    #[serde(default)]
    pub items: Vec<GoogleEvent>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl From<GoogleDateTime> for EventDateTime {
    fn from(value: GoogleDateTime) -> Self {
        EventDateTime {
            date: value.date,
            date_time: value.date_time,
            time_zone: value.time_zone,
        }
    }
}

impl From<&EventDateTime> for GoogleDateTime {
    fn from(value: &EventDateTime) -> Self {
        GoogleDateTime {
            date: value.date,
            date_time: value.date_time,
            time_zone: value.time_zone.clone(),
        }
    }
}

impl From<GoogleAttendee> for Attendee {
    fn from(value: GoogleAttendee) -> Self {
        Attendee {
            email: value.email,
            display_name: value.display_name,
            response_status: value.response_status,
            organizer: value.organizer.unwrap_or(false),
            is_self: value.is_self.unwrap_or(false),
        }
    }
}

/// `organizer` and `self` are read-only in the Calendar API: Google derives
/// them from the calendar owner, so they are never sent.
impl From<&Attendee> for GoogleAttendee {
    fn from(value: &Attendee) -> Self {
        GoogleAttendee {
            email: value.email.clone(),
            display_name: value.display_name.clone(),
            response_status: value.response_status.clone(),
            organizer: None,
            is_self: None,
        }
    }
}

impl TryFrom<GoogleEvent> for Event {
    type Error = anyhow::Error;

    /// Missing start/end are kept empty so reconciliation can skip the event.
    fn try_from(value: GoogleEvent) -> Result<Self> {
        let Some(id) = value.id.filter(|id| !id.is_empty()) else {
            bail!("Event without id: {:?}", value.summary);
        };

        Ok(Event {
            id,
            summary: value.summary.unwrap_or_default(),
            description: value.description,
            start: value.start.map(Into::into).unwrap_or_default(),
            end: value.end.map(Into::into).unwrap_or_default(),
            attendees: value.attendees.into_iter().map(Into::into).collect(),
            hangout_link: value.hangout_link,
            private_properties: value
                .extended_properties
                .map(|p| p.private)
                .unwrap_or_default(),
        })
    }
}

/// Convert one listed page, dropping cancelled instances and items that
/// cannot be converted.
pub fn listed_events(items: Vec<GoogleEvent>) -> Vec<Event> {
    items
        .into_iter()
        // Cancelled instances carry no usable data
        .filter(|item| item.status.as_deref() != Some("cancelled"))
        .filter_map(|item| match Event::try_from(item) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!("Skipping listed event: {e:#}");
                None
            }
        })
        .collect()
}

impl From<&NewEvent> for GoogleEvent {
    fn from(value: &NewEvent) -> Self {
        GoogleEvent {
            id: None,
            status: None,
            summary: Some(value.summary.clone()),
            description: value.description.clone(),
            start: Some((&value.start).into()),
            end: Some((&value.end).into()),
            attendees: value.attendees.iter().map(Into::into).collect(),
            hangout_link: value.hangout_link.clone(),
            extended_properties: Some(ExtendedProperties {
                private: value.private_properties.clone(),
                shared: BTreeMap::new(),
            }),
            reminders: Some(GoogleReminders {
                use_default: value.use_default_reminders,
            }),
        }
    }
}
