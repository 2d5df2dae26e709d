//! One sync run: read both calendars, decide, write.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::apply::{ApplyReport, PlannedAction, apply_actions};
use crate::client::{CalendarClient, EventFilter};
use crate::config::SyncConfig;
use crate::diff::{Reconciliation, reconcile};
use crate::error::{CalMirrorError, CalMirrorResult};
use crate::event::Event;
use crate::handover::{HandoverReminders, ReminderCleanup, is_reminder, resolve_cleanups};
use crate::transform::build_satellite_event;
use crate::window::TimeWindow;

/// Everything a run would do, before any write.
#[derive(Debug)]
pub struct SyncPlan {
    pub window: TimeWindow,
    pub reconciliation: Reconciliation,
    /// Writes in execution order
    pub actions: Vec<PlannedAction>,
    /// Reminder lookups that failed; their reminders are left in place
    pub lookup_failures: Vec<(ReminderCleanup, CalMirrorError)>,
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

#[derive(Debug)]
pub struct SyncReport {
    pub plan: SyncPlan,
    pub applied: ApplyReport,
}

impl SyncReport {
    pub fn is_success(&self) -> bool {
        self.applied.is_success() && self.plan.lookup_failures.is_empty()
    }
}

/// Query window for a run started at `now`, in the configured zone.
pub fn window_for(config: &SyncConfig, now: DateTime<Utc>) -> CalMirrorResult<TimeWindow> {
    let zone = config.zone()?;
    TimeWindow::look_ahead(&now.with_timezone(&zone), config.months_to_look_ahead)
}

/// Read both calendars and work out the writes, without applying them.
///
/// Each create is followed by its reminder, each delete by the reminders
/// it cleans up. Failing to read either calendar aborts the run.
pub async fn plan_sync<S, T>(
    source: &S,
    satellite: &T,
    config: &SyncConfig,
    window: &TimeWindow,
) -> CalMirrorResult<SyncPlan>
where
    S: CalendarClient + ?Sized,
    T: CalendarClient + ?Sized,
{
    info!(
        "Loading source events matching '{}' in {window}",
        config.source.search_text
    );
    let source_events = source
        .list_events(window, &EventFilter::text(&config.source.search_text))
        .await?;

    info!(
        "Loading satellite events owned by '{}'",
        config.satellite.sync_token
    );
    let owned = satellite
        .list_events(window, &EventFilter::owned_by(&config.satellite.sync_token))
        .await?;
    let (existing_reminders, shifts): (Vec<Event>, Vec<Event>) = owned
        .into_iter()
        .filter(|e| e.is_owned_by(&config.satellite.sync_token))
        .partition(is_reminder);

    debug!(
        "{} source event(s), {} satellite shift(s), {} reminder(s)",
        source_events.len(),
        shifts.len(),
        existing_reminders.len()
    );

    let reconciliation = reconcile(&source_events, &shifts, &config.satellite.naming);

    for skipped in &reconciliation.skipped {
        warn!(
            "Skipping {} event '{}': {}",
            skipped.side, skipped.event.id, skipped.reason
        );
    }
    for (source_event, copy) in &reconciliation.matched {
        debug!("Matched {} with satellite '{}'", source_event.summary, copy.id);
    }
    for action in reconciliation.actions() {
        debug!("Decided {action}");
    }

    let reminder_plan = match HandoverReminders::from_config(config)? {
        Some(rules) => rules.plan_reminders(&reconciliation),
        None => Default::default(),
    };

    let delete_ids: Vec<String> = reconciliation.deletes.iter().map(|e| e.id.clone()).collect();
    let resolved = resolve_cleanups(satellite, &reminder_plan.cleanups, &delete_ids).await;

    let mut actions = Vec::new();

    let mut reminder_creates = reminder_plan.creates.into_iter().peekable();
    for event in &reconciliation.creates {
        actions.push(PlannedAction::Create(build_satellite_event(
            event,
            &config.satellite,
        )));
        while let Some((_, reminder)) = reminder_creates.next_if(|(id, _)| *id == event.id) {
            actions.push(PlannedAction::Create(reminder));
        }
    }

    let mut reminder_deletes = resolved.deletes.into_iter().peekable();
    for event in &reconciliation.deletes {
        actions.push(PlannedAction::Delete(event.clone()));
        while let Some((_, reminder)) = reminder_deletes.next_if(|(id, _)| *id == event.id) {
            actions.push(PlannedAction::Delete(reminder));
        }
    }

    Ok(SyncPlan {
        window: *window,
        reconciliation,
        actions,
        lookup_failures: resolved.failures,
    })
}

/// Plan, then apply every action against the satellite calendar.
pub async fn run_sync<S, T>(
    source: &S,
    satellite: &T,
    config: &SyncConfig,
    window: &TimeWindow,
) -> CalMirrorResult<SyncReport>
where
    S: CalendarClient + ?Sized,
    T: CalendarClient + ?Sized,
{
    let plan = plan_sync(source, satellite, config, window).await?;

    if plan.is_empty() {
        info!("Satellite calendar is up to date");
    }

    let applied = apply_actions(satellite, &plan.actions).await;

    info!(
        "Created {}, deleted {}, {} failed",
        applied.created.len(),
        applied.deleted.len(),
        applied.failures.len() + plan.lookup_failures.len()
    );

    Ok(SyncReport { plan, applied })
}
