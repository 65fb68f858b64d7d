//! Command-line interface definition.

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use parcelbase_core::{PackageStatus, Priority};

#[derive(Parser)]
#[command(name = "parcelbase", version, about = "Admin CLI for the parcelbase tracking backend")]
pub struct Cli {
    /// Configuration file (TOML). Defaults and PARCELBASE_* env vars apply
    /// either way.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Run against seeded in-memory data instead of the real backend.
    #[arg(long, global = true)]
    pub demo: bool,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect packages.
    Packages {
        #[command(subcommand)]
        command: PackageCommands,
    },
    /// List staff profiles.
    Users,
    /// List documents of a package.
    Documents {
        /// Package id.
        package_id: Uuid,
    },
    /// List recent audit log entries.
    Audit {
        /// Restrict to one table.
        #[arg(long)]
        table: Option<String>,
    },
    /// Probe backend connectivity.
    Check,
    /// Export all package data as JSON.
    Export,
    /// Show the demo session and what it may access.
    Whoami,
}

#[derive(Subcommand)]
pub enum PackageCommands {
    /// List packages, newest first.
    List {
        #[arg(long)]
        status: Option<PackageStatus>,

        #[arg(long)]
        priority: Option<Priority>,

        /// Substring match on the tracking number.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one package.
    Get {
        /// Package id.
        id: Uuid,
    },
}
