//! cli::commands::items
//!
//! List stock, most plentiful first.

use anyhow::{Context as _, Result};

use super::{connect, verbosity};
use crate::engine::catalog::{self, CatalogEntry};
use crate::engine::Context;
use crate::ui::output::{self, format_count};

/// Run the items command.
pub fn items(ctx: &Context, query: Option<&str>, limit: Option<usize>) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(items_async(ctx, query, limit))
}

async fn items_async(ctx: &Context, query: Option<&str>, limit: Option<usize>) -> Result<()> {
    let verbosity = verbosity(ctx);
    let (api, _) = connect(ctx)?;

    let mut entries = catalog::fetch_catalog(&api)
        .await
        .context("Failed to fetch items")?;
    catalog::sort_by_count_desc(&mut entries);

    let mut shown: Vec<&CatalogEntry> = match query {
        Some(q) => catalog::search(&entries, q),
        None => entries.iter().collect(),
    };
    if let Some(limit) = limit {
        shown.truncate(limit);
    }

    if shown.is_empty() {
        match query {
            Some(q) => output::print(format!("No items match '{}'.", q), verbosity),
            None => output::print("No items in storage.", verbosity),
        }
        return Ok(());
    }

    for line in render(&shown) {
        output::print(line, verbosity);
    }
    Ok(())
}

/// One aligned line per entry: count, name, key.
fn render(entries: &[&CatalogEntry]) -> Vec<String> {
    let name_width = entries
        .iter()
        .map(|e| e.display_name.chars().count())
        .max()
        .unwrap_or(0);

    entries
        .iter()
        .map(|e| {
            format!(
                "{:>13}  {:<width$}  {}",
                format_count(u64::from(e.count)),
                e.display_name,
                e.key(),
                width = name_width
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InventoryRecord, ItemType};
    use crate::engine::catalog::merge_catalog;

    #[test]
    fn render_aligns_columns() {
        let catalog = merge_catalog(
            &[ItemType {
                raw_id: 1,
                key: "minecraft:stone".into(),
                max_count: 64,
                display_name: "Stone".into(),
            }],
            &[
                InventoryRecord {
                    item_id: 1,
                    count: 12_345,
                    data_components: None,
                    stack_size: 64,
                    stackable_hash: "1".into(),
                    full_shulker_stackable_hash: None,
                },
                InventoryRecord {
                    item_id: 7,
                    count: 3,
                    data_components: None,
                    stack_size: 1,
                    stackable_hash: "7".into(),
                    full_shulker_stackable_hash: None,
                },
            ],
        );
        let refs: Vec<&CatalogEntry> = catalog.iter().collect();
        let lines = render(&refs);

        assert_eq!(lines[0], "       12,345  Stone           minecraft:stone");
        assert_eq!(lines[1], "            3  Unknown Item 7  unknown:7");
    }
}
