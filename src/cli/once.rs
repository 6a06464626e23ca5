//! Once command: a single round over every target.

use crate::cli::run::{init_tracing, load_config_with_overrides, shutdown_signal};
use crate::cli::OnceArgs;
use crate::ping::RoundOutcome;
use crate::scheduler::Scheduler;
use tokio_util::sync::CancellationToken;

/// Render one summary line per target.
pub fn format_summary(outcomes: &[(String, RoundOutcome)]) -> String {
    outcomes
        .iter()
        .map(|(url, outcome)| {
            let detail = match outcome {
                RoundOutcome::Success { status, .. } | RoundOutcome::Rejected { status, .. } => {
                    format!("status={}", status)
                }
                RoundOutcome::Exhausted {
                    last_status: Some(status),
                    ..
                } => format!("status={}", status),
                RoundOutcome::Exhausted {
                    last_error: Some(error),
                    ..
                } => format!("error=\"{}\"", error),
                RoundOutcome::Exhausted { .. } | RoundOutcome::Cancelled { .. } => String::new(),
            };
            format!(
                "{:<9} {} attempts={} {}",
                outcome.label(),
                url,
                outcome.attempts(),
                detail
            )
            .trim_end()
            .to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Handle `keepalive once`. Returns true when every target succeeded.
pub async fn handle_once(args: &OnceArgs) -> Result<bool, Box<dyn std::error::Error>> {
    let config = load_config_with_overrides(&args.source)?;
    config.validate()?;
    init_tracing(&config.logging)?;

    let scheduler = Scheduler::from_config(config.ping)?;
    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(shutdown_signal(cancel.clone()));

    let outcomes = scheduler.run_once(&cancel).await;
    scheduler.shutdown().await;
    cancel.cancel();
    watcher.await?;

    println!("{}", format_summary(&outcomes));
    Ok(!outcomes.is_empty() && outcomes.iter().all(|(_, o)| o.is_success()))
}
