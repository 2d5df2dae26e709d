use calmirror_core::apply::PlannedAction;
use calmirror_core::config::SyncConfig;
use calmirror_core::diff::ActionKind;
use calmirror_core::handover::HANDOVER_SUMMARY;
use calmirror_core::sync::{plan_sync, run_sync};
use calmirror_core::transform::ownership_properties;
use calmirror_core::{Event, EventDateTime, MemoryCalendar, SYNC_TOKEN_PROPERTY, TimeWindow};
use chrono::{DateTime, Utc};

fn config(extra: &str) -> SyncConfig {
    SyncConfig::from_toml_str(&format!(
        r#"
time_zone = "UTC"
{extra}

[source]
calendar_id = "rota"
search_text = "alice"

[satellite]
sync_token = "work"

[[satellite.attendees]]
email = "me@example.com"
"#
    ))
    .unwrap()
}

fn with_reminders() -> SyncConfig {
    config("use_handover_reminders = true")
}

fn utc(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn january() -> TimeWindow {
    TimeWindow::new(utc("2024-01-01T00:00:00Z"), utc("2024-02-01T00:00:00Z"))
}

fn timed(s: &str) -> EventDateTime {
    EventDateTime::timed(DateTime::parse_from_rfc3339(s).unwrap())
}

fn shift(id: &str, summary: &str, start: &str, end: &str) -> Event {
    Event::new(id, summary, timed(start), timed(end))
}

fn owned(mut event: Event) -> Event {
    event.private_properties = ownership_properties("work");
    event
}

fn summaries(calendar: &MemoryCalendar) -> Vec<String> {
    calendar.events().into_iter().map(|e| e.summary).collect()
}

#[tokio::test]
async fn empty_satellite_gets_copy_and_reminder() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::new();

    let report = run_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    assert!(report.is_success());
    let events = satellite.events();
    assert_eq!(events.len(), 2);

    let copy = &events[0];
    assert_eq!(copy.summary, "alice L1");
    assert_eq!(copy.sync_token(), Some("work"));
    assert_eq!(copy.attendees[0].email, "me@example.com");

    let reminder = &events[1];
    assert_eq!(reminder.summary, HANDOVER_SUMMARY);
    assert_eq!(
        reminder.start.instant_millis(),
        Some(utc("2024-01-11T09:00:00Z").timestamp_millis())
    );
    assert_eq!(
        reminder.end.instant_millis(),
        Some(utc("2024-01-11T09:01:00Z").timestamp_millis())
    );
    assert_eq!(reminder.sync_token(), Some("work"));
}

#[tokio::test]
async fn matching_copy_means_nothing_to_do() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::with_events(vec![owned(shift(
        "t1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    ))]);

    let plan = plan_sync(&source, &satellite, &config(""), &january())
        .await
        .unwrap();

    assert!(plan.is_empty());
}

#[tokio::test]
async fn stale_copy_is_removed() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::with_events(vec![
        owned(shift("t1", "alice L1", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z")),
        owned(shift("t2", "alice L2", "2024-01-12T09:00:00Z", "2024-01-12T17:00:00Z")),
    ]);

    let report = run_sync(&source, &satellite, &config(""), &january())
        .await
        .unwrap();

    assert_eq!(report.applied.deleted, vec!["t2".to_string()]);
    assert_eq!(summaries(&satellite), vec!["alice L1".to_string()]);
}

#[tokio::test]
async fn only_owned_events_are_touched() {
    let source = MemoryCalendar::new();
    let mut foreign = shift("mine", "alice L2", "2024-01-12T09:00:00Z", "2024-01-12T17:00:00Z");
    foreign
        .private_properties
        .insert(SYNC_TOKEN_PROPERTY.into(), "someone-else".into());
    let satellite = MemoryCalendar::with_events(vec![
        foreign,
        shift("personal", "dentist", "2024-01-12T09:00:00Z", "2024-01-12T10:00:00Z"),
    ]);

    let report = run_sync(&source, &satellite, &config(""), &january())
        .await
        .unwrap();

    assert!(report.plan.is_empty());
    assert_eq!(satellite.events().len(), 2);
}

#[tokio::test]
async fn prefixed_mirror_is_idempotent() {
    let mut config = config("");
    config.satellite.naming.prefix_text = Some("[Rota] ".into());
    config.use_handover_reminders = true;

    let source = MemoryCalendar::with_events(vec![
        shift("s1", "alice L1", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z"),
        shift("s2", "alice L2", "2024-01-11T09:00:00Z", "2024-01-11T17:00:00Z"),
    ]);
    let satellite = MemoryCalendar::new();

    let first = run_sync(&source, &satellite, &config, &january())
        .await
        .unwrap();
    assert_eq!(first.applied.created.len(), 3);

    let second = plan_sync(&source, &satellite, &config, &january())
        .await
        .unwrap();
    assert!(second.is_empty(), "{:?}", second.actions);
    assert_eq!(
        summaries(&satellite),
        vec![
            "[Rota] alice L1".to_string(),
            HANDOVER_SUMMARY.to_string(),
            "[Rota] alice L2".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_create_is_reported_and_the_rest_applied() {
    let source = MemoryCalendar::with_events(vec![
        shift("s1", "alice L1", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z"),
        shift("s2", "alice L2", "2024-01-11T09:00:00Z", "2024-01-11T17:00:00Z"),
    ]);
    let satellite = MemoryCalendar::new();
    satellite.fail_creates_for("alice L1");

    let report = run_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.applied.failures.len(), 1);
    assert_eq!(report.applied.failures[0].kind, ActionKind::Create);
    assert_eq!(
        summaries(&satellite),
        vec![HANDOVER_SUMMARY.to_string(), "alice L2".to_string()]
    );
}

#[tokio::test]
async fn deleting_l1_copy_removes_every_reminder_in_its_slot() {
    let reminder = |id: &str, start: &str, end: &str| owned(shift(id, HANDOVER_SUMMARY, start, end));
    let satellite = MemoryCalendar::with_events(vec![
        owned(shift("t1", "alice (L1)", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z")),
        reminder("r1", "2024-01-11T09:00:00Z", "2024-01-11T09:01:00Z"),
        reminder("r2", "2024-01-11T09:00:00Z", "2024-01-11T09:01:00Z"),
        // A different morning, left alone
        reminder("r3", "2024-01-12T09:00:00Z", "2024-01-12T09:01:00Z"),
    ]);
    let source = MemoryCalendar::new();

    let plan = plan_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    let deletes: Vec<&str> = plan
        .actions
        .iter()
        .map(|a| match a {
            PlannedAction::Delete(e) => e.id.as_str(),
            PlannedAction::Create(_) => panic!("unexpected create {a}"),
        })
        .collect();
    assert_eq!(deletes, vec!["t1", "r1", "r2"]);

    let report = run_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();
    assert!(report.is_success());
    let left: Vec<String> = satellite.events().into_iter().map(|e| e.id).collect();
    assert_eq!(left, vec!["r3".to_string()]);
}

#[tokio::test]
async fn reminders_are_not_pruned_as_orphans() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::with_events(vec![
        owned(shift("t1", "alice L1", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z")),
        owned(shift("r1", HANDOVER_SUMMARY, "2024-01-11T09:00:00Z", "2024-01-11T09:01:00Z")),
    ]);

    let plan = plan_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    assert!(plan.is_empty());
}

#[tokio::test]
async fn invalid_source_event_is_skipped() {
    let source = MemoryCalendar::with_events(vec![
        Event::new("broken", "alice L2", EventDateTime::default(), EventDateTime::default()),
        shift("s1", "alice L2", "2024-01-11T09:00:00Z", "2024-01-11T17:00:00Z"),
    ]);
    let satellite = MemoryCalendar::new();

    let report = run_sync(&source, &satellite, &config(""), &january())
        .await
        .unwrap();

    assert!(report.is_success());
    assert_eq!(report.plan.reconciliation.skipped.len(), 1);
    assert_eq!(report.plan.reconciliation.skipped[0].event.id, "broken");
    assert_eq!(summaries(&satellite), vec!["alice L2".to_string()]);
}

#[tokio::test]
async fn reminders_off_means_no_reminder_writes() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-10T09:00:00Z",
        "2024-01-10T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::new();

    run_sync(&source, &satellite, &config(""), &january())
        .await
        .unwrap();

    assert_eq!(summaries(&satellite), vec!["alice L1".to_string()]);
    // Source once, satellite once; no reminder lookups
    assert_eq!(source.list_calls(), 1);
    assert_eq!(satellite.list_calls(), 1);
}

#[tokio::test]
async fn failed_reminder_lookup_keeps_reminders_and_fails_run() {
    let satellite = MemoryCalendar::with_events(vec![
        owned(shift("t1", "alice (L1)", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z")),
        owned(shift("r1", HANDOVER_SUMMARY, "2024-01-11T09:00:00Z", "2024-01-11T09:01:00Z")),
    ]);
    satellite.fail_lists_for(HANDOVER_SUMMARY);
    let source = MemoryCalendar::new();

    let report = run_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    let deletes: Vec<&str> = report
        .plan
        .actions
        .iter()
        .filter_map(|a| match a {
            PlannedAction::Delete(e) => Some(e.id.as_str()),
            PlannedAction::Create(_) => None,
        })
        .collect();
    assert_eq!(deletes, vec!["t1"]);
    assert_eq!(report.plan.lookup_failures.len(), 1);
    assert_eq!(report.plan.lookup_failures[0].0.trigger.id, "t1");

    assert!(report.applied.is_success());
    assert!(!report.is_success());
    let left: Vec<String> = satellite.events().into_iter().map(|e| e.id).collect();
    assert_eq!(left, vec!["r1".to_string()]);
}

#[tokio::test]
async fn moved_l1_shift_leaves_old_reminder() {
    let source = MemoryCalendar::with_events(vec![shift(
        "s1",
        "alice L1",
        "2024-01-12T09:00:00Z",
        "2024-01-12T17:00:00Z",
    )]);
    let satellite = MemoryCalendar::with_events(vec![
        owned(shift("t1", "alice L1", "2024-01-10T09:00:00Z", "2024-01-10T17:00:00Z")),
        owned(shift("r1", HANDOVER_SUMMARY, "2024-01-11T09:00:00Z", "2024-01-11T09:01:00Z")),
    ]);

    let report = run_sync(&source, &satellite, &with_reminders(), &january())
        .await
        .unwrap();

    // Only "(L1)" copies trigger a cleanup, so the plain L1 copy goes alone
    assert!(report.is_success());
    assert_eq!(report.applied.deleted, vec!["t1".to_string()]);
    assert_eq!(
        summaries(&satellite),
        vec![
            HANDOVER_SUMMARY.to_string(),
            "alice L1".to_string(),
            HANDOVER_SUMMARY.to_string(),
        ]
    );
}
