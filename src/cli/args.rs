//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand};

/// Organization hierarchy editor: typed units, cost centers, and budget/headcount roll-ups
#[derive(Parser, Debug)]
#[command(name = "orgctl")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (-d info, -dd debug, -ddd trace)
    #[arg(short = 'd', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the organization tree
    Tree,

    /// Show one unit (with its subtree) as JSON
    Show {
        /// Unit id
        id: String,
    },

    /// Create a unit under an existing parent
    Create {
        /// Parent unit id
        parent_id: String,
        /// New unit id (lowercase letters, digits, hyphens)
        #[arg(long)]
        id: String,
        /// Display name
        #[arg(short, long)]
        name: String,
        /// Unit type
        #[arg(short = 't', long = "type")]
        unit_type: String,
        /// 4-digit cost center
        #[arg(short = 'c', long = "cost-center")]
        cost_center: String,
        /// Responsible manager
        #[arg(short, long)]
        manager: Option<String>,
    },

    /// Update fields of a unit (omitted fields stay untouched)
    Update {
        /// Unit id
        id: String,
        /// New display name
        #[arg(short, long)]
        name: Option<String>,
        /// New manager
        #[arg(short, long, conflicts_with = "clear_manager")]
        manager: Option<String>,
        /// Remove the manager
        #[arg(long)]
        clear_manager: bool,
        /// New 4-digit cost center
        #[arg(short = 'c', long = "cost-center")]
        cost_center: Option<String>,
        /// New unit type
        #[arg(short = 't', long = "type")]
        unit_type: Option<String>,
    },

    /// Delete a unit
    Delete {
        /// Unit id
        id: String,
        /// Reassign the unit's children to this unit (required for non-leaves)
        #[arg(long)]
        reassign_to: Option<String>,
    },

    /// Move a unit (with its subtree) under a new parent
    Move {
        /// Unit id
        id: String,
        /// New parent unit id
        new_parent_id: String,
    },

    /// Probe whether a cost center is free
    CheckCc {
        /// 4-digit cost center
        cost_center: String,
    },

    /// List unit types
    Types {
        /// Only types allowed as children of this parent type
        #[arg(long)]
        children_of: Option<String>,
    },

    /// Validate the stored organization document
    Validate,

    /// Budget and headcount roll-up report for a unit
    Report {
        /// Unit id
        id: String,
    },

    /// Manage document backups
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
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
pub enum BackupCommands {
    /// Create a manual snapshot of the current document
    Create,

    /// List backups, newest first
    List,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,
}
