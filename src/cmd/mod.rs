mod check;
mod config;
mod serve;

use std::path::PathBuf;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bige_guard::config::{load_config, load_config_file};
use bige_guard::logs;
use bige_guard::server::config::ServerConfig;
use clap::{Args, Parser, Subcommand};
use log::warn;

#[derive(Parser)]
#[command(author, version, about)]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    Serve(serve::ServeArgs),
    Check(check::CheckArgs),
    Config(config::ShowConfigArgs),
}

#[async_trait(?Send)]
pub trait RunCommand {
    async fn run(&self) -> Result<()>;
}

#[async_trait(?Send)]
impl RunCommand for App {
    async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Serve(args) => args.run().await,
            Commands::Check(args) => args.run().await,
            Commands::Config(args) => args.run().await,
        }
    }
}

#[derive(Args)]
pub struct ConfigArgs {
    /// Path to the guard config file. Defaults to `$BIGE_GUARD_CONFIG`, then
    /// `~/.config/bige-guard/guard.toml`.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<ServerConfig> {
        load_config(self.config.as_deref())
    }

    /// Loads the config, then initializes logging with its level.
    pub fn load_and_init_logs(&self) -> Result<ServerConfig> {
        let loaded = load_config_file::<ServerConfig>(self.config.as_deref())?;
        logs::init(&loaded.cfg.logs.level)?;
        if !loaded.found {
            warn!("Config file {} not found, using defaults", loaded.path.display());
        }
        Ok(loaded.cfg)
    }
}

/// Parses `name=value` arguments.
pub fn parse_pair(s: &str) -> Result<(String, String)> {
    match s.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => bail!("expect 'name=value', found '{s}'"),
    }
}
