//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ClickUp Insights - workspace dashboard and reports for ClickUp spaces
///
/// Counts tasks by status and priority, rolls up assignee workload, and
/// writes Markdown reports, optionally summarised by a hosted LLM.
///
/// Examples:
///   clickup-insights --token pk_123 teams
///   clickup-insights --token pk_123 spaces --team 9001
///   clickup-insights --token pk_123 stats --space 4242 --days-back 14
///   clickup-insights --token pk_123 --llm-key gsk_456 report --space 4242
///   clickup-insights serve --port 8080
///   clickup-insights init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .clickup-insights.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// ClickUp personal API token
    #[arg(long, env = "CLICKUP_API_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    /// ClickUp API base URL
    #[arg(long, value_name = "URL", env = "CLICKUP_API_URL", global = true)]
    pub clickup_url: Option<String>,

    /// API key for the LLM service (enables delegated reports)
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true, global = true)]
    pub llm_key: Option<String>,

    /// LLM model identifier
    #[arg(long, value_name = "MODEL", env = "LLM_MODEL", global = true)]
    pub llm_model: Option<String>,

    /// Maximum ClickUp requests in flight while walking a space
    #[arg(long, value_name = "NUM", global = true)]
    pub concurrency: Option<usize>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the dashboard HTTP server
    Serve {
        /// Address to bind
        #[arg(long, value_name = "HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, value_name = "PORT")]
        port: Option<u16>,
    },

    /// List the teams (workspaces) the token can access
    Teams,

    /// List the spaces of a team
    Spaces {
        /// Team identifier
        #[arg(long, value_name = "TEAM_ID")]
        team: String,
    },

    /// Print task statistics for a space as JSON
    Stats {
        /// Space identifier
        #[arg(long, value_name = "SPACE_ID")]
        space: String,

        /// Only count tasks created in the last N days (0 = all)
        #[arg(long, value_name = "DAYS")]
        days_back: Option<u32>,
    },

    /// Generate a Markdown report for a space
    Report {
        /// Space identifier
        #[arg(long, value_name = "SPACE_ID")]
        space: String,

        /// Only include tasks created in the last N days
        #[arg(long, value_name = "DAYS")]
        days_back: Option<u32>,

        /// Write to this file instead of the reports directory
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate a default .clickup-insights.toml configuration file
    InitConfig,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.command == Command::InitConfig {
            return Ok(());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.concurrency == Some(0) {
            return Err("Concurrency must be at least 1".to_string());
        }

        if let Some(ref url) = self.clickup_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("ClickUp URL must start with 'http://' or 'https://'".to_string());
            }
        }

        match &self.command {
            Command::Spaces { team } if team.trim().is_empty() => {
                Err("Team id must not be empty".to_string())
            }
            Command::Stats { space, .. } | Command::Report { space, .. }
                if space.trim().is_empty() =>
            {
                Err("Space id must not be empty".to_string())
            }
            Command::Serve { port: Some(0), .. } => Err("Port must be non-zero".to_string()),
            _ => Ok(()),
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `verbose_default` comes from the config file; `--quiet` overrides it.
    pub fn log_level(&self, verbose_default: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || verbose_default {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["clickup-insights"];
        full.extend_from_slice(argv);
        Args::parse_from(full)
    }

    #[test]
    fn test_parse_stats() {
        let args = parse(&["--token", "pk", "stats", "--space", "42", "--days-back", "7"]);
        assert_eq!(
            args.command,
            Command::Stats {
                space: "42".to_string(),
                days_back: Some(7)
            }
        );
        assert_eq!(args.token.as_deref(), Some("pk"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["teams", "--verbose", "--concurrency", "3"]);
        assert!(args.verbose);
        assert_eq!(args.concurrency, Some(3));
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["-v", "-q", "teams"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let args = parse(&["--concurrency", "0", "teams"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_invalid_url() {
        let args = parse(&["--clickup-url", "ftp://example.com", "teams"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_parse_serve() {
        let args = parse(&["serve", "--port", "8080"]);
        assert_eq!(
            args.command,
            Command::Serve {
                host: None,
                port: Some(8080)
            }
        );
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["teams"]);
        assert_eq!(args.log_level(false), tracing::Level::INFO);
        assert_eq!(args.log_level(true), tracing::Level::DEBUG);

        args.verbose = true;
        assert_eq!(args.log_level(false), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(false), tracing::Level::ERROR);
        assert_eq!(args.log_level(true), tracing::Level::ERROR);
    }
}
