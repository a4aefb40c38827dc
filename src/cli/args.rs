//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// Build and edit nested AND/OR rule trees stored as JSON
#[derive(Parser, Debug)]
#[command(name = "ruletree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global config
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Maximum nesting depth (overrides config)
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub max_deep: Option<i64>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a fresh tree (one empty condition)
    New,

    /// Show a tree with the actions an editor would offer
    Show {
        /// Tree JSON file, `-` for stdin
        #[arg(default_value = "-", value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Omit action markers
        #[arg(long)]
        plain: bool,
    },

    /// Print the tree if it is complete, fail otherwise
    Check {
        /// Tree JSON file, `-` for stdin
        #[arg(default_value = "-", value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Append an empty condition to a group
    AddSibling {
        /// Tree JSON file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Group id
        group: String,
    },

    /// Turn a condition into a group of two (on a group: append a condition)
    Promote {
        /// Tree JSON file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Node id
        node: String,
    },

    /// Remove the child at INDEX from a group
    Delete {
        /// Tree JSON file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Parent group id
        parent: String,
        /// Zero-based child index
        index: usize,
    },

    /// Merge KEY=VALUE pairs into a condition (VALUE is JSON, else a string)
    SetField {
        /// Tree JSON file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Condition id
        node: String,
        /// KEY=VALUE pairs
        #[arg(required = true, num_args = 1..)]
        pairs: Vec<String>,
        /// Replace all fields instead of merging
        #[arg(long)]
        replace: bool,
    },

    /// Set or toggle a group's link operator
    Link {
        /// Tree JSON file, `-` for stdin
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Group id
        group: String,
        /// New operator
        #[arg(value_enum)]
        op: LinkArg,
    },

    /// Show effective settings
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkArg {
    And,
    Or,
    Toggle,
}
