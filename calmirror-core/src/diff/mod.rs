//! Reconciliation of source events against satellite events.

mod action;
mod reconcile;

pub use action::{Action, ActionKind};
pub use reconcile::{Reconciliation, Side, SkippedEvent, reconcile};
