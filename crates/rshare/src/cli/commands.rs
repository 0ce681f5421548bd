//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::view::PageKind;

/// Rider page commands.
#[derive(Debug, Subcommand)]
pub enum RiderCommand {
    /// Request a ride
    Request {
        /// Pickup location
        #[arg(long)]
        from: String,

        /// Drop-off location
        #[arg(long)]
        to: String,

        /// Your name
        #[arg(long)]
        name: String,

        /// Phone number or email
        #[arg(long)]
        contact: String,

        /// Identity document reference
        #[arg(long = "id-doc")]
        id_document: String,
    },

    /// Show requests, available rides and history
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show the details of a rider request
    Review {
        /// Request id
        id: String,
    },

    /// Close a rider request
    Close {
        /// Request id
        id: String,
    },

    /// Show the details of a driver post
    ReviewPost {
        /// Post id
        id: String,
    },

    /// Remove a driver post
    ClosePost {
        /// Post id
        id: String,
    },
}

/// Driver page commands.
#[derive(Debug, Subcommand)]
pub enum DriverCommand {
    /// Create or update the driver profile
    Signup {
        /// Full name (keeps the current value if omitted)
        #[arg(long)]
        name: Option<String>,

        /// Phone number or email (keeps the current value if omitted)
        #[arg(long)]
        contact: Option<String>,

        /// Licence number (keeps the current value if omitted)
        #[arg(long)]
        licence: Option<String>,
    },

    /// Forget the driver profile
    Logout,

    /// Publish an empty ride
    Publish {
        /// Departure location
        #[arg(long)]
        from: String,

        /// Destination
        #[arg(long)]
        to: String,
    },

    /// Show requests, your published rides and history
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show the details of a rider request
    Review {
        /// Request id
        id: String,
    },

    /// Accept a rider request
    Accept {
        /// Request id
        id: String,

        /// Complete the ride now instead of only accepting it
        #[arg(long)]
        complete: bool,

        /// Rating for the rider (1-5)
        #[arg(long, requires = "complete")]
        rating: Option<String>,
    },

    /// Complete a previously accepted rider request
    Complete {
        /// Request id
        id: String,

        /// Rating for the rider (1-5)
        #[arg(long)]
        rating: Option<String>,
    },

    /// Remove a rider request
    Close {
        /// Request id
        id: String,
    },

    /// Remove one of your published rides
    Unpublish {
        /// Post id
        id: String,
    },
}

/// Completed ride history commands.
#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Show completed rides
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Export completed rides
    Export {
        /// Export format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Delete all completed rides
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Watch command arguments.
#[derive(Debug, Args)]
pub struct WatchCommand {
    /// Which page to keep rendering
    #[arg(long, value_enum, default_value = "rider")]
    pub view: PageArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Page argument for the watch command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PageArg {
    /// The rider page
    Rider,
    /// The driver page
    Driver,
}

impl From<PageArg> for PageKind {
    fn from(arg: PageArg) -> Self {
        match arg {
            PageArg::Rider => Self::Rider,
            PageArg::Driver => Self::Driver,
        }
    }
}

/// Output format for views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

impl OutputFormat {
    /// Check if this format is JSON.
    #[must_use]
    pub fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Export format for history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// Comma-separated values
    #[default]
    Csv,
    /// Printable HTML table
    Html,
}
