//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Resolve asset paths against this directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Warnings and errors only

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// gitea-release - publish Gitea releases from a versioning pipeline
#[derive(Parser, Debug)]
#[command(name = "gitea-release")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolve asset paths against this directory instead of the context's
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Inputs shared by every hook.
#[derive(Args, Debug, Clone)]
pub struct HookArgs {
    /// Pipeline context as a JSON file (`-` reads stdin)
    #[arg(long, value_name = "FILE")]
    pub context: PathBuf,

    /// Plugin options file (`.json` or `.toml`)
    #[arg(long, value_name = "FILE", conflicts_with = "options")]
    pub config: Option<PathBuf>,

    /// Plugin options as inline JSON
    #[arg(long, value_name = "JSON")]
    pub options: Option<String>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check options, token, and repository access
    #[command(
        name = "verify",
        after_help = "\
EXAMPLES:
    # Verify with options from a file
    GITEA_TOKEN=... gitea-release verify --context ctx.json --config release.toml"
    )]
    Verify(HookArgs),

    /// Create or update the release for the next tag and upload assets
    #[command(
        name = "publish",
        after_help = "\
EXAMPLES:
    # Publish, uploading everything under dist/
    gitea-release publish --context ctx.json --options '{\"assets\": [\"dist/*\"]}'"
    )]
    Publish(HookArgs),

    /// Promote an existing release to the branch's channel
    #[command(name = "add-channel")]
    AddChannel(HookArgs),
}

impl Command {
    /// The hook arguments of any command.
    pub fn hook_args(&self) -> &HookArgs {
        match self {
            Command::Verify(args) | Command::Publish(args) | Command::AddChannel(args) => args,
        }
    }
}
