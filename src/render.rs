//! Colored terminal output for calmirror types.

use calmirror_core::apply::{ApplyReport, PlannedAction};
use calmirror_core::diff::{ActionKind, SkippedEvent};
use calmirror_core::sync::SyncPlan;
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for ActionKind {
    fn render(&self) -> String {
        let symbol = self.symbol();
        match self {
            ActionKind::Create => symbol.green().to_string(),
            ActionKind::Delete => symbol.red().to_string(),
        }
    }
}

fn colorize(kind: ActionKind, text: &str) -> String {
    match kind {
        ActionKind::Create => text.green().to_string(),
        ActionKind::Delete => text.red().to_string(),
    }
}

impl Render for PlannedAction {
    fn render(&self) -> String {
        let (summary, start, end) = match self {
            PlannedAction::Create(e) => (&e.summary, &e.start, &e.end),
            PlannedAction::Delete(e) => (&e.summary, &e.start, &e.end),
        };
        let time = format!("{start} - {end}");

        format!(
            "{} {} {}",
            self.kind().render(),
            colorize(self.kind(), summary),
            time.dimmed()
        )
    }
}

impl Render for SkippedEvent {
    fn render(&self) -> String {
        format!(
            "{} skipped {} event {}: {}",
            "!".yellow(),
            self.side,
            self.event.id,
            self.reason.dimmed()
        )
    }
}

impl Render for SyncPlan {
    fn render(&self) -> String {
        let mut lines = vec![format!("Window {}", self.window).dimmed().to_string()];

        for skipped in &self.reconciliation.skipped {
            lines.push(format!("   {}", skipped.render()));
        }

        if self.actions.is_empty() {
            lines.push(format!("   {}", "Up to date".dimmed()));
        }
        for action in &self.actions {
            lines.push(format!("   {}", action.render()));
        }

        for (cleanup, error) in &self.lookup_failures {
            lines.push(format!(
                "   {} reminder lookup for {} failed: {}",
                "!".red(),
                cleanup.trigger,
                error.to_string().red()
            ));
        }

        lines.join("\n")
    }
}

impl Render for ApplyReport {
    fn render(&self) -> String {
        let mut lines = vec![format!(
            "Created {}, deleted {}",
            self.created.len(),
            self.deleted.len()
        )];

        if !self.failures.is_empty() {
            lines.push(
                format!("{} {} failed:", self.failures.len(), pluralize("action", self.failures.len()))
                    .red()
                    .to_string(),
            );
            for failure in &self.failures {
                lines.push(format!("   {}", failure.to_string().red()));
            }
        }

        lines.join("\n")
    }
}

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}
