//! cli::commands::nodes
//!
//! List site nodes from the sign configuration.

use anyhow::{Context as _, Result};

use super::{connect, verbosity};
use crate::api::AutomationApi;
use crate::core::types::{Node, SignConfig};
use crate::engine::Context;
use crate::ui::output;

/// Run the nodes command.
pub fn nodes(ctx: &Context, deliveries: bool, pickups: bool) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(nodes_async(ctx, deliveries, pickups))
}

async fn nodes_async(ctx: &Context, deliveries: bool, pickups: bool) -> Result<()> {
    let verbosity = verbosity(ctx);
    let (api, _) = connect(ctx)?;

    let config = api
        .sign_config()
        .await
        .context("Failed to get sign config")?;

    let names: Vec<&str> = if deliveries {
        config.delivery_destinations()
    } else if pickups {
        config.pickup_locations()
    } else {
        config.nodes.keys().map(String::as_str).collect()
    };

    if names.is_empty() {
        output::print("No matching nodes.", verbosity);
        return Ok(());
    }

    for line in render(&config, &names) {
        output::print(line, verbosity);
    }
    Ok(())
}

fn capabilities(node: &Node) -> String {
    let mut caps = Vec::new();
    if node.dropoff.is_some() {
        caps.push("deliver");
    }
    if node.pickup.is_some() {
        caps.push("pickup");
    }
    if node.home {
        caps.push("home");
    }
    caps.join(", ")
}

fn render(config: &SignConfig, names: &[&str]) -> Vec<String> {
    let width = names.iter().map(|n| n.chars().count()).max().unwrap_or(0);

    names
        .iter()
        .filter_map(|name| config.node(name).map(|node| (name, node)))
        .map(|(name, node)| {
            format!(
                "{:<width$}  {}  [{}]",
                name,
                node.location,
                capabilities(node),
                width = width
            )
        })
        .collect()
}
