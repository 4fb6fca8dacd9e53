//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// pkgshare - NuGet packages on a mapped Azure file share
#[derive(Parser, Debug)]
#[command(name = "pkgshare")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Store configuration file (.toml, .json, .yaml)
    #[arg(
        short,
        long,
        global = true,
        env = "PKGSHARE_CONFIG",
        default_value = "pkgshare.toml"
    )]
    pub config: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a template configuration
    ///
    /// Examples:
    ///   pkgshare init                 # Writes pkgshare.toml
    ///   pkgshare init store.yaml      # Any supported format
    Init {
        /// Where to write the configuration (defaults to --config)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Validate the configuration without touching the share
    Check {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Copy a stored package out of the share
    Get {
        /// Package id
        id: String,

        /// Package version
        version: String,

        /// Output file (defaults to <id>.<version>.nupkg in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Store a .nupkg under the identity declared in its manifest
    Push {
        /// Package file to upload
        file: PathBuf,
    },

    /// Delete a stored package
    Delete {
        /// Package id
        id: String,

        /// Package version
        version: String,
    },

    /// Repair misnamed packages and remove empty package folders
    Clean,
}
