use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

use crate::output::ColorName;

#[derive(Parser, Debug)]
#[command(
    name = "hlsq",
    author,
    version,
    about = "Query, filter and pretty-print HLS (M3U8) manifests",
    args_conflicts_with_subcommands = true
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Manifest file path or http(s) URL; `-` or omitted reads stdin
    #[arg(value_name = "INPUT")]
    pub input: Option<String>,

    /// Only print tags with an attribute matching EXPR, e.g. "BANDWIDTH > 1000000"
    #[arg(short, long, value_name = "EXPR")]
    pub query: Option<String>,

    /// Remove blank lines between tags
    #[arg(long)]
    pub chomp: bool,

    /// Color used for tag names
    #[arg(long, value_enum, value_name = "COLOR")]
    pub color_tag: Option<ColorName>,

    /// Color used for attribute keys
    #[arg(long, value_enum, value_name = "COLOR")]
    pub color_attr: Option<ColorName>,

    /// Disable colorized output
    #[arg(long)]
    pub no_color: bool,

    /// Re-fetch a URL input on an interval and print only new content
    #[arg(short, long)]
    pub poll: bool,

    /// Polling interval in seconds
    #[arg(long, value_name = "SECS")]
    pub interval: Option<u64>,

    /// HTTP request timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
