use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use calmirror_core::config::SyncConfig;
use calmirror_core::sync::{plan_sync, run_sync, window_for};
use calmirror_provider_google::GoogleCalendar;
use chrono::Utc;
use tracing::info;

use crate::render::Render;

/// Plan a run and, when `apply` is set, carry it out.
pub async fn run(config: &SyncConfig, apply: bool) -> Result<ExitCode> {
    let started = Instant::now();
    let window = window_for(config, Utc::now())?;
    let timeout = config.request_timeout();

    info!(
        "Starting {} from {} into {}",
        run_kind(apply),
        config.source.calendar_id,
        config.satellite.calendar_id
    );

    let source = GoogleCalendar::connect(&config.source.account, &config.source.calendar_id, timeout)
        .await
        .context("Failed to open source calendar")?;
    let satellite = GoogleCalendar::connect(
        &config.satellite.account,
        &config.satellite.calendar_id,
        timeout,
    )
    .await
    .context("Failed to open satellite calendar")?;

    let success = if apply {
        let report = run_sync(&source, &satellite, config, &window).await?;

        println!("{}", report.plan.render());
        println!("\n{}", report.applied.render());
        report.is_success()
    } else {
        let plan = plan_sync(&source, &satellite, config, &window).await?;

        println!("{}", plan.render());
        plan.lookup_failures.is_empty()
    };

    info!(
        "Finished {} in {:.1?}{}",
        run_kind(apply),
        started.elapsed(),
        if success { "" } else { " with failures" }
    );

    Ok(if success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_kind(apply: bool) -> &'static str {
    if apply { "sync" } else { "plan" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milestones_name_the_subcommand() {
        assert_eq!(run_kind(true), "sync");
        assert_eq!(run_kind(false), "plan");
    }
}
