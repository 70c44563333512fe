//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers never take or release holds themselves.
//!
//! # Async Commands
//!
//! Every command that talks to the server is async. The handler builds a
//! tokio runtime and blocks on the async body, keeping dispatch synchronous.

mod completion;
mod config_cmd;
mod deliver;
mod items;
mod nodes;
mod pickup;
mod stats;

// Re-export command functions for testing and direct invocation
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use deliver::{build_intent, deliver};
pub use items::items;
pub use nodes::nodes;
pub use pickup::{pickup, run_cycles};
pub use stats::stats;

use anyhow::{Context as _, Result};

use crate::api::HttpClient;
use crate::cli::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::engine::Context;
use crate::ui::output::Verbosity;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Items { search, limit } => items::items(ctx, search.as_deref(), limit),
        Command::Nodes { deliveries, pickups } => nodes::nodes(ctx, deliveries, pickups),
        Command::Deliver {
            destination,
            items,
            shulkers,
            dry_run,
        } => deliver::deliver(ctx, &destination, &items, &shulkers, dry_run),
        Command::Pickup {
            destination,
            repeat,
            max_cycles,
        } => pickup::pickup(ctx, &destination, repeat, max_cycles),
        Command::Stats => stats::stats(ctx),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, value),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration and build an HTTP client from it.
fn connect(ctx: &Context) -> Result<(HttpClient, Config)> {
    let config = ctx.config().context("Failed to load config")?;
    let client = HttpClient::from_config(&config).context("Failed to create API client")?;
    tracing::debug!(base_url = client.base_url(), "connected");
    Ok((client, config))
}

fn verbosity(ctx: &Context) -> Verbosity {
    Verbosity::from_flags(ctx.quiet, ctx.debug)
}
