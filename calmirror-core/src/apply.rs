//! Turning planned actions into calendar writes.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::{error, info};

use crate::client::CalendarClient;
use crate::diff::ActionKind;
use crate::error::CalMirrorError;
use crate::event::{Event, NewEvent};

/// A write against the satellite calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlannedAction {
    Create(NewEvent),
    /// Delete an existing satellite event
    Delete(Event),
}

impl PlannedAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            PlannedAction::Create(_) => ActionKind::Create,
            PlannedAction::Delete(_) => ActionKind::Delete,
        }
    }

    /// Human-readable label, as the client would describe the event.
    pub fn label<C: CalendarClient + ?Sized>(&self, client: &C) -> String {
        match self {
            PlannedAction::Create(event) => event.to_string(),
            PlannedAction::Delete(event) => client.describe(event),
        }
    }
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Create(event) => write!(f, "{}: {}", self.kind(), event),
            PlannedAction::Delete(event) => write!(f, "{}: {}", self.kind(), event),
        }
    }
}

/// Stable id tying together the log lines for one action.
///
/// First 8 bytes of the SHA-256 of the action's label, hex encoded.
pub fn correlation_id(label: &str) -> String {
    let digest = Sha256::digest(label.as_bytes());
    hex::encode(&digest[..8])
}

/// An action that could not be applied.
#[derive(Debug)]
pub struct ActionFailure {
    pub kind: ActionKind,
    pub label: String,
    pub correlation_id: String,
    pub error: CalMirrorError,
}

impl fmt::Display for ActionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}: {}",
            self.correlation_id, self.kind, self.label, self.error
        )
    }
}

/// Outcome of applying a batch of actions.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub created: Vec<Event>,
    /// Ids of deleted events
    pub deleted: Vec<String>,
    pub failures: Vec<ActionFailure>,
}

impl ApplyReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply `actions` in order, one call each.
///
/// A failed action is recorded and the rest still run.
pub async fn apply_actions<C>(client: &C, actions: &[PlannedAction]) -> ApplyReport
where
    C: CalendarClient + ?Sized,
{
    let mut report = ApplyReport::default();

    for action in actions {
        let label = action.label(client);
        let id = correlation_id(&label);

        let outcome = match action {
            PlannedAction::Create(event) => {
                info!("[{id}] Creating {label}");
                client.create_event(event).await.map(|created| {
                    report.created.push(created);
                })
            }
            PlannedAction::Delete(event) => {
                info!("[{id}] Deleting {label}");
                client.delete_event(&event.id).await.map(|()| {
                    report.deleted.push(event.id.clone());
                })
            }
        };

        if let Err(e) = outcome {
            error!("[{id}] Failed to {} {label}: {e}", verb(action.kind()));
            report.failures.push(ActionFailure {
                kind: action.kind(),
                label,
                correlation_id: id,
                error: e,
            });
        }
    }

    report
}

fn verb(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Create => "create",
        ActionKind::Delete => "delete",
    }
}
