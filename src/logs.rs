use std::io::{self, IsTerminal};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::config::CommonConfig;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LogConfig {
    /// One of `error`, `warn`, `info`, `debug`.
    /// Default: info
    #[serde(default = "LogConfig::default_level")]
    pub level: String,
}

impl CommonConfig for LogConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }

    fn complete(&mut self) -> Result<()> {
        self.level = self.level.to_lowercase();
        parse_level(&self.level)?;
        Ok(())
    }
}

impl LogConfig {
    pub fn default_level() -> String {
        String::from("info")
    }
}

fn parse_level(level: &str) -> Result<LevelFilter> {
    Ok(match level {
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        _ => bail!("unknown log level '{}'", level),
    })
}

pub fn init(level: &str) -> Result<()> {
    let level = parse_level(level)?;
    let is_terminal = io::stderr().is_terminal();

    let colors = ColoredLevelConfig::new()
        .info(Color::Green)
        .warn(Color::Yellow)
        .debug(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = humantime::format_rfc3339_millis(SystemTime::now());
            if is_terminal {
                out.finish(format_args!(
                    "{} [{}] {}",
                    now,
                    colors.color(record.level()),
                    message
                ))
            } else {
                out.finish(format_args!("{} [{}] {}", now, record.level(), message))
            }
        })
        .level(level)
        // Per-request access lines from actix are too chatty below debug
        .level_for("actix_server", level.min(LevelFilter::Info))
        .chain(io::stderr())
        .apply()
        .context("init logger")?;

    Ok(())
}
