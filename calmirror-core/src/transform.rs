//! Building satellite-owned events from source events.

use std::collections::BTreeMap;

use crate::config::SatelliteConfig;
use crate::event::{Event, NewEvent, SYNC_TOKEN_PROPERTY};

/// Private properties that mark an event as owned by `sync_token`.
pub fn ownership_properties(sync_token: &str) -> BTreeMap<String, String> {
    BTreeMap::from([(SYNC_TOKEN_PROPERTY.to_string(), sync_token.to_string())])
}

/// Payload for the satellite copy of `source`.
///
/// Start and end are copied verbatim. Attendees come from the satellite
/// configuration, never from the source event.
pub fn build_satellite_event(source: &Event, satellite: &SatelliteConfig) -> NewEvent {
    NewEvent {
        summary: satellite.naming.comparison_summary(&source.summary),
        description: source.description.clone(),
        start: source.start.clone(),
        end: source.end.clone(),
        attendees: satellite.attendees.clone(),
        hangout_link: source.hangout_link.clone(),
        use_default_reminders: false,
        private_properties: ownership_properties(&satellite.sync_token),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Attendee, EventDateTime};
    use crate::naming::{NamingConfig, compute_key};
    use chrono::DateTime;

    fn satellite(naming: NamingConfig) -> SatelliteConfig {
        SatelliteConfig {
            calendar_id: "primary".into(),
            sync_token: "work".into(),
            naming,
            attendees: vec![Attendee::new("me@example.com")],
            account: "satellite".into(),
        }
    }

    fn source_event() -> Event {
        let mut event = Event::new(
            "src-1",
            "alice L1",
            EventDateTime::timed(DateTime::parse_from_rfc3339("2024-01-10T09:00:00+01:00").unwrap())
                .with_time_zone("Europe/Paris"),
            EventDateTime::timed(DateTime::parse_from_rfc3339("2024-01-10T17:00:00+01:00").unwrap())
                .with_time_zone("Europe/Paris"),
        );
        event.attendees.push(Attendee::new("rota-owner@example.com"));
        event.hangout_link = Some("https://meet.google.com/abc-defg-hij".into());
        event.description = Some("Primary on-call".into());
        event
    }

    #[test]
    fn copies_times_and_tags_with_token() {
        let source = source_event();
        let payload = build_satellite_event(&source, &satellite(NamingConfig::verbatim()));

        assert_eq!(payload.summary, "alice L1");
        assert_eq!(payload.start, source.start);
        assert_eq!(payload.end, source.end);
        assert_eq!(payload.hangout_link, source.hangout_link);
        assert_eq!(payload.description, source.description);
        assert_eq!(
            payload.private_properties.get(SYNC_TOKEN_PROPERTY).map(String::as_str),
            Some("work")
        );
        assert_eq!(payload.private_properties.len(), 1);
    }

    #[test]
    fn attendees_come_from_configuration() {
        let source = source_event();
        let payload = build_satellite_event(&source, &satellite(NamingConfig::verbatim()));

        assert_eq!(payload.attendees, vec![Attendee::new("me@example.com")]);
    }

    #[test]
    fn summary_matches_comparison_key() {
        let naming = NamingConfig {
            prefix_text: Some("[Rota] ".into()),
            overridden_summary: None,
        };
        let source = source_event();
        let payload = build_satellite_event(&source, &satellite(naming.clone()));

        let key = compute_key(&source, &naming).unwrap();
        assert_eq!(payload.summary, key.summary);
        assert_eq!(payload.summary, "[Rota] alice L1");
    }

    #[test]
    fn override_replaces_summary() {
        let naming = NamingConfig {
            prefix_text: Some("[Rota] ".into()),
            overridden_summary: Some("Busy".into()),
        };
        let payload = build_satellite_event(&source_event(), &satellite(naming));
        assert_eq!(payload.summary, "Busy");
    }
}
