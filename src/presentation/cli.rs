//! CLI Argument Parsing
//!
//! This module defines the CLI interface using clap.
//!
//! ## Design Notes
//!
//! - Global flags (--json, --verbose, --config) are inherited by all subcommands
//! - `up` and `down` share one argument set; the subcommand picks the direction

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::application::RawOptions;
use crate::domain::value_objects::Direction;

/// Beam - export a branch, run deploy commands and rsync it to a server
#[derive(Parser, Debug)]
#[command(name = "beam")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "Servers and commands are read from beam.json, beam.toml or beam.yaml in the source directory.")]
pub struct Cli {
    /// Emit NDJSON events on stdout
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to beam.{json,toml,yaml,yml} in the source directory)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy local files to a server
    Up(DeployArgs),

    /// Pull files from a server
    Down(DeployArgs),
}

impl Commands {
    pub fn direction(&self) -> Direction {
        match self {
            Commands::Up(_) => Direction::Up,
            Commands::Down(_) => Direction::Down,
        }
    }

    pub fn args(&self) -> &DeployArgs {
        match self {
            Commands::Up(args) | Commands::Down(args) => args,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct DeployArgs {
    /// Server name from the config
    #[arg(short, long)]
    pub remote: String,

    /// Branch to export (defaults to the server's locked branch or the current one)
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Sub path below the local path and the webroot
    #[arg(short, long)]
    pub path: Option<String>,

    /// Source directory
    #[arg(long, default_value = ".")]
    pub srcdir: PathBuf,

    /// Export directory, relative to the parent of the source directory
    #[arg(long, value_name = "DIR")]
    pub exportdir: Option<String>,

    /// rsync exclude file, relative to the local path
    #[arg(long, value_name = "FILE")]
    pub excludes_file: Option<String>,

    /// Deploy the working copy instead of an export
    #[arg(short, long)]
    pub working_copy: bool,

    /// Dry run - show what would be transferred
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Delete files on the receiving side that don't exist on the sending side
    #[arg(long)]
    pub delete: bool,

    /// Compare by modification time and size instead of checksum
    #[arg(long)]
    pub no_checksum: bool,

    #[arg(long)]
    pub no_compress: bool,

    #[arg(long)]
    pub no_archive: bool,

    #[arg(long)]
    pub no_delay_updates: bool,

    /// Skip the preview and confirmation
    #[arg(short, long)]
    pub yes: bool,
}

impl DeployArgs {
    /// Options for the resolver; defaults stay unset so the resolver applies them
    pub fn to_raw_options(&self, direction: Direction) -> RawOptions {
        let mut raw = RawOptions::new(direction.as_str(), &self.remote, &self.srcdir)
            .with_working_copy(self.working_copy)
            .with_dry_run(self.dry_run)
            .with_delete(self.delete)
            .with_checksum(!self.no_checksum)
            .with_compress(!self.no_compress)
            .with_archive(!self.no_archive)
            .with_delay_updates(!self.no_delay_updates);

        if let Some(branch) = &self.branch {
            raw = raw.with_branch(branch);
        }
        if let Some(path) = &self.path {
            raw = raw.with_path(path.as_str());
        }
        if let Some(exportdir) = &self.exportdir {
            raw = raw.with_export_dir(exportdir);
        }
        if let Some(excludes_file) = &self.excludes_file {
            raw = raw.with_excludes_file(excludes_file);
        }
        raw
    }
}
