//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this config file
//! - `--base-url <url>` / `--api-key <key>`: Override server settings
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand};

/// Sorting Operator - reserve and move items in an automated storage system
#[derive(Parser, Debug)]
#[command(name = "sso")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this config file instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Automation server base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// API key sent with every request
    #[arg(long, global = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List items in storage
    #[command(
        name = "items",
        long_about = "List items currently in storage, most plentiful first.\n\n\
            Item metadata and the live inventory listing are fetched together and \
            joined by item id. Items the server has no metadata for are shown as \
            'Unknown Item <id>'. The KEY column is what `sso deliver` expects.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Everything in storage
    sso items

    # Find something to deliver
    sso items --search cobble

    # Top ten by count
    sso items --limit 10"
    )]
    Items {
        /// Only show items whose name or key contains this text
        #[arg(short, long)]
        search: Option<String>,

        /// Show at most this many items
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List site nodes and what they support
    #[command(
        name = "nodes",
        long_about = "List the named nodes from the site's sign configuration.\n\n\
            Each node shows its location and whether it accepts deliveries \
            (has a drop-off point) or pickups (has a pickup chest).",
        after_help = "\
WORKFLOW EXAMPLES:
    # All nodes
    sso nodes

    # Only nodes you can deliver to
    sso nodes --deliveries

    # Only nodes you can pick up from
    sso nodes --pickups"
    )]
    Nodes {
        /// Only nodes with a drop-off point
        #[arg(long, conflicts_with = "pickups")]
        deliveries: bool,

        /// Only nodes with a pickup chest
        #[arg(long)]
        pickups: bool,
    },

    /// Deliver items to a node's drop-off point
    #[command(
        name = "deliver",
        long_about = "Reserve items in storage and have them thrown at a node's drop-off.\n\n\
            Every requested quantity must be available: if the server cannot \
            satisfy any one item, nothing is delivered and every slot reserved \
            for this request is released. A single delivery moves at most one \
            container's worth (27 slots).\n\n\
            --shulker requests whole shulker boxes. When the server tracks packed \
            boxes of the item they are moved as boxes; otherwise the request is \
            expanded to the equivalent number of loose items.",
        after_help = "\
WORKFLOW EXAMPLES:
    # 128 stone to the 'base' node
    sso deliver base --item minecraft:stone=128

    # Two full boxes of cobblestone plus some torches
    sso deliver base --shulker minecraft:cobblestone=2 --item minecraft:torch=64

    # Show what would be requested without reserving anything
    sso deliver base --item minecraft:stone=128 --dry-run"
    )]
    Deliver {
        /// Destination node name
        destination: String,

        /// Loose items as KEY=COUNT (repeatable)
        #[arg(long = "item", value_name = "KEY=COUNT")]
        items: Vec<Quantity>,

        /// Shulker boxes as KEY=COUNT (repeatable)
        #[arg(long = "shulker", value_name = "KEY=COUNT")]
        shulkers: Vec<Quantity>,

        /// Show the request without reserving anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Pick up a node's chest into storage
    #[command(
        name = "pickup",
        long_about = "Reserve free storage slots and import a node's pickup chest into them.\n\n\
            Up to 27 free slots are requested; whatever the server grants is used. \
            With --repeat the pickup runs again while the previous run was granted \
            at least one free storage slot, up to --max-cycles runs.\n\n\
            The client cannot see how much the chest held, so --repeat does not \
            stop when the chest is empty. It stops only when storage grants no \
            free slot or --max-cycles is reached; on a site with free space every \
            cycle is granted slots, so expect all --max-cycles imports to run.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Empty the chest at 'farm' once
    sso pickup farm

    # Keep importing until storage is full or the limit is reached
    sso pickup farm --repeat --max-cycles 5"
    )]
    Pickup {
        /// Pickup node name
        destination: String,

        /// Run again while storage keeps granting free slots (not until the chest is empty)
        #[arg(long)]
        repeat: bool,

        /// Upper bound on runs with --repeat; usually every run happens
        #[arg(long, default_value_t = 10)]
        max_cycles: u32,
    },

    /// Show server statistics
    #[command(
        name = "stats",
        long_about = "Show storage usage, operation queue counters, connected agents, \
            and service tick times reported by the server."
    )]
    Stats,

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Manage the sso config file.\n\n\
            The file is found via $SSO_CONFIG, then $XDG_CONFIG_HOME/sso/config.toml, \
            then ~/.sso/config.toml. API_BASE_URL, API_KEY and SSO_TIMEOUT_SECS \
            override file values; --base-url and --api-key override everything.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Show effective settings
    sso config list

    # Point at a different server
    sso config set server.base_url http://storage.lan:8080

    # Store the API key without echoing it
    sso config set server.api_key"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    sso completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    sso completion zsh >> ~/.zshrc

    # Fish
    sso completion fish > ~/.config/fish/completions/sso.fish

    # PowerShell
    sso completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set (prompted without echo when omitted)
        value: Option<String>,
    },
    /// List effective configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    #[value(name = "powershell")]
    PowerShell,
}

/// A `KEY=COUNT` pair from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Quantity {
    pub key: String,
    pub count: u64,
}

impl FromStr for Quantity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, count) = s
            .rsplit_once('=')
            .ok_or_else(|| format!("expected KEY=COUNT, got '{}'", s))?;

        if key.is_empty() {
            return Err(format!("missing item key in '{}'", s));
        }

        let count: u64 = count
            .parse()
            .map_err(|_| format!("invalid count '{}', expected a positive integer", count))?;
        if count == 0 {
            return Err(format!("count for '{}' must be greater than zero", key));
        }

        Ok(Quantity {
            key: key.to_string(),
            count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn quantity_parses_key_and_count() {
        let q: Quantity = "minecraft:stone=128".parse().unwrap();
        assert_eq!(q.key, "minecraft:stone");
        assert_eq!(q.count, 128);
    }

    #[test]
    fn quantity_rejects_bad_input() {
        assert!("minecraft:stone".parse::<Quantity>().is_err());
        assert!("=5".parse::<Quantity>().is_err());
        assert!("stone=0".parse::<Quantity>().is_err());
        assert!("stone=-3".parse::<Quantity>().is_err());
        assert!("stone=lots".parse::<Quantity>().is_err());
    }

    #[test]
    fn deliver_collects_repeated_flags() {
        let cli = Cli::try_parse_from([
            "sso",
            "deliver",
            "base",
            "--item",
            "a=1",
            "--item",
            "b=2",
            "--shulker",
            "c=3",
        ])
        .unwrap();

        match cli.command {
            Command::Deliver {
                destination,
                items,
                shulkers,
                dry_run,
            } => {
                assert_eq!(destination, "base");
                assert_eq!(items.len(), 2);
                assert_eq!(shulkers[0].count, 3);
                assert!(!dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn pickup_defaults() {
        let cli = Cli::try_parse_from(["sso", "pickup", "farm"]).unwrap();
        match cli.command {
            Command::Pickup {
                repeat, max_cycles, ..
            } => {
                assert!(!repeat);
                assert_eq!(max_cycles, 10);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
