use std::fmt;

use crate::diff::Action;
use crate::event::Event;
use crate::naming::{EventKey, NamingConfig, compute_key};

/// Which calendar an event was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Source,
    Satellite,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Satellite => write!(f, "satellite"),
        }
    }
}

/// An event left out of matching because no key could be derived for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEvent {
    pub side: Side,
    pub event: Event,
    pub reason: String,
}

/// Result of diffing one source window against one satellite window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Source events with no satellite counterpart, in source order
    pub creates: Vec<Event>,
    /// Satellite events matching no source event, in satellite order
    pub deletes: Vec<Event>,
    /// `(source, satellite)` pairs that already agree
    pub matched: Vec<(Event, Event)>,
    pub skipped: Vec<SkippedEvent>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.creates.is_empty() && self.deletes.is_empty()
    }

    /// Creates first, then deletes.
    pub fn actions(&self) -> Vec<Action> {
        self.creates
            .iter()
            .cloned()
            .map(Action::Create)
            .chain(self.deletes.iter().cloned().map(Action::Delete))
            .collect()
    }
}

/// Diff `source` against `satellite`.
///
/// Source keys are computed under `naming`; satellite events already carry the
/// rewritten summary and are keyed verbatim. Each source event consumes the
/// first satellite event with an equal key, so duplicates on the satellite side
/// are left over and deleted. Fields outside the key (attendees, description)
/// are never compared.
pub fn reconcile(source: &[Event], satellite: &[Event], naming: &NamingConfig) -> Reconciliation {
    let mut result = Reconciliation::default();
    let verbatim = NamingConfig::verbatim();

    // Working set of unconsumed satellite events, kept in input order
    let mut unmatched: Vec<(EventKey, &Event)> = Vec::with_capacity(satellite.len());
    for event in satellite {
        match compute_key(event, &verbatim) {
            Ok(key) => unmatched.push((key, event)),
            Err(e) => result.skipped.push(SkippedEvent {
                side: Side::Satellite,
                event: event.clone(),
                reason: e.to_string(),
            }),
        }
    }

    for event in source {
        let key = match compute_key(event, naming) {
            Ok(key) => key,
            Err(e) => {
                result.skipped.push(SkippedEvent {
                    side: Side::Source,
                    event: event.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match unmatched.iter().position(|(candidate, _)| *candidate == key) {
            Some(index) => {
                let (_, copy) = unmatched.remove(index);
                result.matched.push((event.clone(), copy.clone()));
            }
            None => result.creates.push(event.clone()),
        }
    }

    result.deletes = unmatched.into_iter().map(|(_, e)| e.clone()).collect();
    result
}
