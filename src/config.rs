//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::state::EngineOptions;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "countup")]
#[command(about = "A background stopwatch with a live display and persisted state")]
#[command(version)]
pub struct Config {
    /// Port to bind the command API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// File holding the persisted stopwatch state
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Display refresh period in milliseconds while running
    #[arg(long, default_value = "1000", value_parser = clap::value_parser!(u64).range(10..))]
    pub tick_ms: u64,

    /// Reject invalid transitions with 409 instead of ignoring them
    #[arg(long)]
    pub strict: bool,

    /// Do not render the live display on stdout
    #[arg(long)]
    pub no_display: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// State file location, defaulting to the user's data directory
    pub fn state_file(&self) -> PathBuf {
        self.state_file.clone().unwrap_or_else(default_state_file)
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            tick_period: Duration::from_millis(self.tick_ms),
            strict: self.strict,
        }
    }
}

fn default_state_file() -> PathBuf {
    dirs::data_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("countup")
        .join("state.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["countup"]).unwrap();

        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.log_level(), "info");
        assert!(config.state_file().ends_with("countup/state.json"));

        let options = config.engine_options();
        assert_eq!(options.tick_period, Duration::from_secs(1));
        assert!(!options.strict);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "countup",
            "--port",
            "9000",
            "--state-file",
            "/tmp/countup.json",
            "--tick-ms",
            "100",
            "--strict",
            "--no-display",
            "-v",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.state_file(), PathBuf::from("/tmp/countup.json"));
        assert_eq!(config.engine_options().tick_period, Duration::from_millis(100));
        assert!(config.engine_options().strict);
        assert!(config.no_display);
        assert_eq!(config.log_level(), "debug");
    }

    #[test]
    fn rejects_tiny_tick_period() {
        assert!(Config::try_parse_from(["countup", "--tick-ms", "1"]).is_err());
    }
}
