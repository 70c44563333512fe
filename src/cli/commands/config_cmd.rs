//! config command - Get, set, or list configuration values
//!
//! `get` and `list` show effective values (file, environment, and flags
//! combined). `set` only ever writes the config file.

use std::io::{self, Write};

use anyhow::{bail, Context as _, Result};

use super::verbosity;
use crate::core::config::schema::KEYS;
use crate::core::config::Config;
use crate::engine::Context;
use crate::ui::output;

const API_KEY: &str = "server.api_key";

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let config = ctx.config().context("Failed to load config")?;
    println!("{}", effective_value(&config, key)?);
    Ok(())
}

/// Set a configuration value in the config file.
///
/// When `value` is omitted for the API key it is read without echo.
pub fn set(ctx: &Context, key: &str, value: Option<String>) -> Result<()> {
    let value = match value {
        Some(v) => v,
        None if key == API_KEY => prompt_api_key()?,
        None => bail!("Missing value for '{}'.", key),
    };

    let mut config =
        Config::load(ctx.config_path.as_deref()).context("Failed to load config")?;
    config.file.set(key, &value)?;
    let path = config.save().context("Failed to write config")?;

    let shown = if key == API_KEY {
        mask(&value)
    } else {
        value
    };
    output::success(
        format!("Set {} = {} in {}", key, shown, path.display()),
        verbosity(ctx),
    );
    Ok(())
}

/// List effective configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let config = ctx.config().context("Failed to load config")?;

    match config.loaded_from() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# no config file, using defaults"),
    }

    for key in KEYS {
        let value = effective_value(&config, key)?;
        let value = if *key == API_KEY { mask(&value) } else { value };
        println!("{} = {}", key, value);
    }
    Ok(())
}

fn effective_value(config: &Config, key: &str) -> Result<String> {
    Ok(match key {
        "server.base_url" => config.base_url(),
        "server.api_key" => config.api_key(),
        "server.timeout_secs" => config.timeout().as_secs().to_string(),
        "server.priority" => config.priority().to_string(),
        _ => bail!(
            "Unknown configuration key: {}. Valid keys: {}",
            key,
            KEYS.join(", ")
        ),
    })
}

fn prompt_api_key() -> Result<String> {
    print!("API key: ");
    io::stdout().flush()?;

    let key = rpassword::read_password().context("Failed to read API key")?;
    if key.is_empty() {
        bail!("API key cannot be empty.");
    }
    Ok(key)
}

/// Show only the first four characters of a secret.
fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}
