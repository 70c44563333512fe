//! cli::commands::deliver
//!
//! Deliver items to a node's drop-off point.
//!
//! # Design
//!
//! The catalog is fetched to resolve item keys into stackable hashes and
//! stack sizes. Quantities for the same key are combined into one delivery
//! line, so `--item k=10 --shulker k=1` yields one line with both counts.
//! Availability is not checked here; the server decides when holds are
//! requested.

use anyhow::{bail, Context as _, Result};

use super::{connect, verbosity};
use crate::cli::args::Quantity;
use crate::engine::catalog::{self, CatalogEntry};
use crate::engine::filters::{build_delivery_filters, DeliveryIntent, DeliveryItem};
use crate::engine::{self, Context};
use crate::ui::output::{self, format_list};

/// Run the deliver command.
pub fn deliver(
    ctx: &Context,
    destination: &str,
    items: &[Quantity],
    shulkers: &[Quantity],
    dry_run: bool,
) -> Result<()> {
    if items.is_empty() && shulkers.is_empty() {
        bail!("Nothing to deliver. Use --item KEY=COUNT or --shulker KEY=COUNT.");
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(deliver_async(ctx, destination, items, shulkers, dry_run))
}

async fn deliver_async(
    ctx: &Context,
    destination: &str,
    items: &[Quantity],
    shulkers: &[Quantity],
    dry_run: bool,
) -> Result<()> {
    let verbosity = verbosity(ctx);
    let (api, config) = connect(ctx)?;

    let entries = catalog::fetch_catalog(&api)
        .await
        .context("Failed to fetch items")?;
    let intent = build_intent(destination, &entries, items, shulkers)?;

    output::print(format!("Delivery to {}:", intent.destination), verbosity);
    output::print(format_list(&intent.summary_lines(), "  "), verbosity);

    if dry_run {
        let filters = build_delivery_filters(&intent.items);
        output::print(
            format!("Dry run: would request {} hold filter(s).", filters.len()),
            verbosity,
        );
        return Ok(());
    }

    let report = engine::deliver(&api, &intent, config.priority())
        .await
        .context("Delivery failed")?;

    output::success(
        format!(
            "Delivery to {} submitted ({} slot(s))",
            report.destination, report.slots
        ),
        verbosity,
    );
    Ok(())
}

/// Resolve command-line quantities against the catalog.
///
/// # Errors
///
/// Fails if any key is not in the catalog.
pub fn build_intent(
    destination: &str,
    entries: &[CatalogEntry],
    items: &[Quantity],
    shulkers: &[Quantity],
) -> Result<DeliveryIntent> {
    let mut lines: Vec<(&str, u64, u64)> = Vec::new();
    for q in items {
        add_line(&mut lines, &q.key, q.count, 0);
    }
    for q in shulkers {
        add_line(&mut lines, &q.key, 0, q.count);
    }

    let mut intent = DeliveryIntent::new(destination);
    for (key, item_count, shulker_count) in lines {
        let entry = catalog::find_by_key(entries, key).with_context(|| {
            format!(
                "Unknown item key '{}'. Run 'sso items' to see available keys.",
                key
            )
        })?;
        intent = intent.with_item(DeliveryItem::from_catalog(entry, item_count, shulker_count));
    }

    Ok(intent)
}

fn add_line<'a>(lines: &mut Vec<(&'a str, u64, u64)>, key: &'a str, items: u64, shulkers: u64) {
    match lines.iter_mut().find(|(k, _, _)| *k == key) {
        Some(line) => {
            line.1 = line.1.saturating_add(items);
            line.2 = line.2.saturating_add(shulkers);
        }
        None => lines.push((key, items, shulkers)),
    }
}
