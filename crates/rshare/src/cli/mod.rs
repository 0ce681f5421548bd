//! Command-line interface for rshare.
//!
//! This module provides the CLI structure for the `rshare` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, DriverCommand, ExportFormat, HistoryCommand, OutputFormat, PageArg,
    RiderCommand, StatusCommand, WatchCommand,
};

/// rshare - A local ride board
///
/// Riders post ride requests, drivers post empty rides, and a driver accepts
/// a request by hand. Everything lives in one local database that any number
/// of terminals can share.
#[derive(Debug, Parser)]
#[command(name = "rshare")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a demo rider request
    Sample,

    /// Rider page actions
    #[command(subcommand)]
    Rider(RiderCommand),

    /// Driver page actions
    #[command(subcommand)]
    Driver(DriverCommand),

    /// Completed ride history
    #[command(subcommand)]
    History(HistoryCommand),

    /// Re-render a page whenever another terminal changes the board
    Watch(WatchCommand),

    /// Show storage status
    Status(StatusCommand),

    /// View configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn cli_with(verbose: u8, quiet: bool) -> Cli {
        Cli {
            config: None,
            verbose,
            quiet,
            command: Command::Status(StatusCommand { json: false }),
        }
    }

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "rshare");
    }

    #[test]
    fn test_verbosity_levels() {
        use crate::logging::Verbosity;

        assert_eq!(cli_with(0, true).verbosity(), Verbosity::Quiet);
        assert_eq!(cli_with(0, false).verbosity(), Verbosity::Normal);
        assert_eq!(cli_with(1, false).verbosity(), Verbosity::Verbose);
        assert_eq!(cli_with(2, false).verbosity(), Verbosity::Trace);
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_rider_request() {
        let args = vec![
            "rshare", "rider", "request", "--from", "A", "--to", "B", "--name", "Ann",
            "--contact", "555", "--id-doc", "PAN-1",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Rider(RiderCommand::Request { id_document, .. }) => {
                assert_eq!(id_document, "PAN-1");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_driver_accept_complete() {
        let args = vec![
            "rshare", "driver", "accept", "rq_1", "--complete", "--rating", "5",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Driver(DriverCommand::Accept { complete: true, rating: Some(_), .. })
        ));
    }

    #[test]
    fn test_rating_requires_complete() {
        let args = vec!["rshare", "driver", "accept", "rq_1", "--rating", "5"];
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn test_parse_signup_partial() {
        let args = vec!["rshare", "driver", "signup", "--contact", "555"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Driver(DriverCommand::Signup {
                name,
                contact,
                licence,
            }) => {
                assert!(name.is_none());
                assert_eq!(contact.as_deref(), Some("555"));
                assert!(licence.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_history_export() {
        let args = vec!["rshare", "history", "export", "-f", "html", "-o", "out.html"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::History(HistoryCommand::Export { format, output }) => {
                assert_eq!(format, ExportFormat::Html);
                assert_eq!(output, Some(PathBuf::from("out.html")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_watch_driver() {
        let args = vec!["rshare", "watch", "--view", "driver"];
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Command::Watch(cmd) => assert_eq!(cmd.view, PageArg::Driver),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["rshare", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose_and_quiet() {
        let cli = Cli::try_parse_from(vec!["rshare", "-v", "sample"]).unwrap();
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(vec!["rshare", "-q", "sample"]).unwrap();
        assert!(cli.quiet);
    }
}
