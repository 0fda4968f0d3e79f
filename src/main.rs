// src/main.rs

//! Command-line entry point for the userpass credential backend.

use anyhow::{Result, anyhow};
use serde_json::{Map, Value};
use std::env;
use tracing::{error, info, warn};
use tracing_subscriber::filter::EnvFilter;
use userpass::config::Config;
use userpass::core::userpass::fields::{LEGACY_POLICIES_FIELD, TOKEN_POLICIES_FIELD};
use userpass::userpass::UserpassBackend;

const USAGE: &str = "Usage: userpass [--config path] update-policies <username> [--token-policies LIST] [--policies LIST]";

#[tokio::main]
async fn main() -> Result<()> {
    run_app().await
}

async fn run_app() -> Result<()> {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let args: Vec<String> = env::args().collect();

    if args.contains(&"--version".to_string()) {
        println!("userpass version {VERSION}");
        return Ok(());
    }

    // The config file is optional; without one the defaults (empty in-memory store) apply.
    let config = match flag_value(&args, "--config")? {
        Some(path) => match Config::from_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("Failed to load configuration from \"{path}\": {e:#}");
                std::process::exit(1);
            }
        },
        None => Config::default(),
    };

    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .compact()
        .with_ansi(true)
        .init();

    if config.is_ephemeral() {
        warn!(
            "Using the in-memory store, which starts empty; every user will be reported as missing. \
             Pass --config with `[storage] backend = \"file\"` to update persisted users."
        );
    }

    let Some(command_index) = args.iter().position(|arg| arg == "update-policies") else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };
    let Some(username) = args
        .get(command_index + 1)
        .filter(|arg| !arg.starts_with("--"))
    else {
        eprintln!("{USAGE}");
        std::process::exit(1);
    };

    let mut fields = Map::new();
    if let Some(list) = flag_value(&args, "--token-policies")? {
        fields.insert(
            TOKEN_POLICIES_FIELD.to_string(),
            Value::String(list.to_string()),
        );
    }
    if let Some(list) = flag_value(&args, "--policies")? {
        fields.insert(
            LEGACY_POLICIES_FIELD.to_string(),
            Value::String(list.to_string()),
        );
    }

    let backend = UserpassBackend::from_config(&config);
    let path = format!("users/{username}/policies");
    match backend.handle_update(&path, &fields).await {
        Ok(response) => {
            if let Some(warning) = response.warning {
                println!("WARNING: {warning}");
            }
            info!("Policies for '{}' updated.", username);
            println!("OK");
            Ok(())
        }
        Err(e) => {
            error!("Policy update for '{}' failed: {}", username, e);
            Err(e.into())
        }
    }
}

/// Returns the value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|v| Some(v.as_str()))
            .ok_or_else(|| anyhow!("{flag} flag requires a value")),
        None => Ok(None),
    }
}
