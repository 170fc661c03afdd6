//! CLI definitions for AutoReply.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub(crate) const DEFAULT_ENDPOINT: &str = "http://localhost:9222";
pub(crate) const DEFAULT_PAGE_FRAGMENT: &str = "app.slack.com";

/// AutoReply CLI.
#[derive(Parser)]
#[command(name = "autoreply")]
#[command(about = "Mention auto-reply agent for web chat workspaces")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.autoreply/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Write logs to rolling files in this directory instead of stderr
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Attach to the workspace page and run the watcher (default)
    Run {
        /// Chrome debugging endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// URL fragment identifying the workspace tab
        #[arg(long, default_value = DEFAULT_PAGE_FRAGMENT)]
        page: String,
    },

    /// Probe the generation backend and list available models
    TestConnection,

    /// Generate a single reply without touching any page
    Generate {
        /// Message text to reply to
        message: String,

        /// Sender display name
        #[arg(long, default_value = "")]
        sender: String,

        /// Surrounding conversation block
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Export saved messages from the workspace page
    Export {
        #[arg(long, value_enum, default_value_t = ExportFormatArg::Csv)]
        format: ExportFormatArg,

        /// Add context and AI title/detail columns
        #[arg(long)]
        detailed: bool,

        /// Maximum number of items to collect
        #[arg(long)]
        limit: Option<usize>,

        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Chrome debugging endpoint
        #[arg(long, default_value = DEFAULT_ENDPOINT)]
        endpoint: String,

        /// URL fragment identifying the workspace tab
        #[arg(long, default_value = DEFAULT_PAGE_FRAGMENT)]
        page: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub(crate) enum ExportFormatArg {
    Csv,
    Tsv,
}
