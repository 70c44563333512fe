//! cli::commands::stats
//!
//! Show server counters.

use anyhow::{Context as _, Result};

use super::{connect, verbosity};
use crate::api::AutomationApi;
use crate::core::types::Stats;
use crate::engine::Context;
use crate::ui::output::{self, format_count, Verbosity};

/// Run the stats command.
pub fn stats(ctx: &Context) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let (api, _) = connect(ctx)?;
        show(&api, verbosity(ctx)).await.map(|_| ())
    })
}

/// Fetch counters and print them. Returns the rendered lines.
async fn show(api: &dyn AutomationApi, verbosity: Verbosity) -> Result<Vec<String>> {
    let stats = api.stats().await.context("Failed to get stats")?;
    let lines = render(&stats);
    for line in &lines {
        output::print(line, verbosity);
    }
    Ok(lines)
}

fn render(stats: &Stats) -> Vec<String> {
    let usage = match stats.usage_percent() {
        Some(p) => format!("{:.1}% used", p),
        None => "no slots".to_string(),
    };

    let mut lines = vec![
        "Storage".to_string(),
        format!(
            "  Inventories in memory: {}",
            format_count(stats.inventories_in_mem)
        ),
        format!(
            "  Slots: {} total, {} free ({})",
            format_count(stats.total_slots),
            format_count(stats.free_slots),
            usage
        ),
        format!("  Current holds: {}", format_count(stats.current_holds)),
        "Operations".to_string(),
        format!("  Pending: {}", format_count(stats.operations_pending)),
        format!(
            "  In progress: {}",
            format_count(stats.operations_in_progress)
        ),
        format!("  Complete: {}", format_count(stats.operations_complete)),
        format!("  Aborted: {}", format_count(stats.operations_aborted)),
        format!("Agents connected: {}", stats.agents_connected),
    ];

    let services = stats.services_by_tick_time();
    if !services.is_empty() {
        lines.push("Service tick times".to_string());
        let width = services
            .iter()
            .map(|(name, _)| name.chars().count())
            .max()
            .unwrap_or(0);
        for (name, micros) in services {
            lines.push(format!(
                "  {:<width$}  {} µs",
                name,
                format_count(micros),
                width = width
            ));
        }
    }

    lines
}
