//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::config::OutputFormat;

/// Hierarchical configuration tree: merge layered config files and query dotted paths
#[derive(Parser, Debug)]
#[command(name = "conftree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Settings file (default: $XDG_CONFIG_HOME/conftree/conftree.toml)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Configuration sources, lowest precedence first.
#[derive(Args, Debug, Clone, Default)]
pub struct SourceArgs {
    /// Config files (.json, .toml); later files override earlier ones
    #[arg(value_hint = ValueHint::FilePath)]
    pub files: Vec<PathBuf>,

    /// Layer <PREFIX>_* environment variables on top (nest with __)
    #[arg(short, long, value_name = "PREFIX")]
    pub env: Option<String>,

    /// Fail if a layer hits a leaf/branch conflict
    #[arg(long)]
    pub strict: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Merge sources and print the result
    Merge {
        #[command(flatten)]
        sources: SourceArgs,
        /// Output format (default from settings)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Print the node at a dotted path of the merged sources
    Get {
        /// Dotted path, e.g. server.port
        path: String,
        #[command(flatten)]
        sources: SourceArgs,
        /// Output format (default from settings)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Show the merged sources as a tree
    Tree {
        #[command(flatten)]
        sources: SourceArgs,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective settings
    Show,
    /// Print a settings template
    Template,
    /// Print the global settings file location
    Path,
}
