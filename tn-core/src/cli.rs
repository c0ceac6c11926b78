//! CLI argument parsing.
//!
//! The console menu is the default entry point when no subcommand is given.

use crate::settings::DEFAULT_SETTINGS_PATH;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "tn-installer")]
#[command(about = "Appliance console installer and provisioning API")]
#[command(long_about = "Appliance console installer and provisioning API\n\n\
    Run without arguments to show the console setup menu while serving the\n\
    provisioning API in the background.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Settings file (TOML)
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH, global = true)]
    pub config: PathBuf,

    /// Log file; falls back to stderr when it cannot be opened
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Address the provisioning API listens on (overrides the settings file)
    #[arg(long, global = true)]
    pub listen: Option<SocketAddr>,

    /// Run in dry-run mode (no disks are touched, no power actions run)
    #[arg(long, global = true)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Console setup menu plus the provisioning API (default)
    Menu,

    /// Provisioning API only
    Serve,

    /// Print the detected disk inventory and exit
    Disks,
}
