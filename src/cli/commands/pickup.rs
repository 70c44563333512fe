//! cli::commands::pickup
//!
//! Import a node's pickup chest into storage.
//!
//! # Repeat
//!
//! Each engine call is a single acquire/submit/release cycle. `--repeat`
//! composes cycles here: another cycle runs while the previous one was
//! granted at least one slot, up to `--max-cycles`. The first error stops
//! the loop.

use anyhow::{Context as _, Result};

use super::{connect, verbosity};
use crate::api::{AutomationApi, Priority};
use crate::engine::{self, Context, OperationError, PickupReport};
use crate::ui::output::{self, Verbosity};

/// Run the pickup command.
pub fn pickup(ctx: &Context, destination: &str, repeat: bool, max_cycles: u32) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let verbosity = verbosity(ctx);
        let (api, config) = connect(ctx)?;

        let cycles = if repeat { max_cycles.max(1) } else { 1 };
        let reports = run_cycles(&api, destination, config.priority(), cycles, verbosity)
            .await
            .context("Pickup failed")?;

        let slots: usize = reports.iter().map(|r| r.granted).sum();
        if repeat {
            output::success(
                format!(
                    "{} pickup(s) from {} submitted ({} slot(s) total)",
                    reports.len(),
                    destination,
                    slots
                ),
                verbosity,
            );
        }
        Ok(())
    })
}

/// Run up to `max_cycles` pickups, stopping after one that was granted no slots.
pub async fn run_cycles(
    api: &dyn AutomationApi,
    destination: &str,
    priority: Priority,
    max_cycles: u32,
    verbosity: Verbosity,
) -> Result<Vec<PickupReport>, OperationError> {
    let mut reports = Vec::new();

    for cycle in 1..=max_cycles {
        let report = engine::pickup(api, destination, priority).await?;
        let granted = report.granted;

        output::success(
            format!(
                "Pickup from {} submitted ({} slot(s))",
                report.destination, granted
            ),
            verbosity,
        );
        reports.push(report);

        if granted == 0 {
            if cycle < max_cycles {
                output::warn("no free slots granted, stopping", verbosity);
            }
            break;
        }
    }

    Ok(reports)
}
