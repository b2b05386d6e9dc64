//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::agent::DEFAULT_PAGE_PATTERN;

/// CLI argument parsing structure
#[derive(Debug, Parser)]
#[command(name = "auto-save")]
#[command(about = "Periodically trigger a save action on a target page")]
#[command(version)]
pub struct Config {
    /// Port to bind the settings API to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the persisted settings; kept in memory when omitted
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Address of the active page to load a page agent into
    #[arg(long)]
    pub page_url: Option<String>,

    /// Path segment a page address must contain for the agent to load
    #[arg(long, default_value = DEFAULT_PAGE_PATTERN)]
    pub page_pattern: String,

    /// Shell command run when the page's save control is activated
    #[arg(long)]
    pub save_command: Option<String>,

    /// Open the settings panel on the console
    #[arg(short, long)]
    pub interactive: bool,

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
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::try_parse_from(["auto-save"]).unwrap();
        assert_eq!(config.address(), "127.0.0.1:20554");
        assert_eq!(config.page_pattern, "/workflow/");
        assert!(config.store.is_none());
        assert_eq!(config.log_level(), "info");
    }

    #[test]
    fn page_and_command_flags() {
        let config = Config::try_parse_from([
            "auto-save",
            "--store",
            "/tmp/settings.json",
            "--page-url",
            "https://app.example/workflow/3",
            "--save-command",
            "xdotool key ctrl+s",
            "-v",
            "-i",
        ])
        .unwrap();
        assert_eq!(config.page_url.as_deref(), Some("https://app.example/workflow/3"));
        assert_eq!(config.save_command.as_deref(), Some("xdotool key ctrl+s"));
        assert!(config.interactive);
        assert_eq!(config.log_level(), "debug");
    }
}
