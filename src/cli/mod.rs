//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load the pipeline context and plugin options
//! - Run one lifecycle hook and print its result as JSON on stdout
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and hands off to an
//! [`crate::engine::Session`]. Progress goes to stderr through `tracing`.

pub mod args;

pub use args::{Cli, Command, HookArgs};

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::core::config::PluginConfig;
use crate::core::errors::AggregateError;
use crate::core::types::PipelineContext;
use crate::engine::{ReleaseError, Session};
use crate::ui::output::{self, Verbosity};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    output::init_logging(Verbosity::from_flags(cli.quiet, cli.debug));

    let args = cli.command.hook_args();
    let ctx = load_context(&args.context, cli.cwd.as_deref())?;
    let config = load_options(args)?;

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let mut session = Session::gitea();
        match &cli.command {
            Command::Verify(_) => {
                session.verify_conditions(&config, &ctx).await?;
                tracing::info!("Verification succeeded");
            }
            Command::Publish(_) => {
                let result = session.publish(&config, &ctx).await?;
                println!("{}", serde_json::to_string(&result)?);
            }
            Command::AddChannel(_) => {
                let result = session.add_channel(&config, &ctx).await?;
                println!("{}", serde_json::to_string(&result)?);
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

/// Print an error returned by [`run`] to stderr.
///
/// Plugin errors are shown with their code, message and details.
pub fn report(err: &anyhow::Error) {
    match plugin_report(err) {
        Some(text) => eprintln!("{}", text),
        None => output::error(format!("{:#}", err)),
    }
}

/// All plugin errors carried by `err`, formatted, or `None` if it carries
/// none.
fn plugin_report(err: &anyhow::Error) -> Option<String> {
    let errors = err.downcast_ref::<ReleaseError>()?.plugin_errors();
    if errors.is_empty() {
        return None;
    }
    Some(output::format_aggregate(&AggregateError::new(errors)))
}

/// Read the pipeline context, filling in the process environment and
/// working directory where the file leaves them out.
fn load_context(path: &Path, cwd: Option<&Path>) -> Result<PipelineContext> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read context from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("failed to read context file '{}'", path.display()))?
    };

    let mut ctx: PipelineContext = serde_json::from_str(&raw)
        .with_context(|| format!("invalid pipeline context in '{}'", path.display()))?;

    if ctx.env.is_empty() {
        ctx.env = std::env::vars().collect();
    }
    if let Some(cwd) = cwd {
        ctx.cwd = cwd.to_path_buf();
    } else if ctx.cwd.as_os_str().is_empty() {
        ctx.cwd = std::env::current_dir()?;
    }

    Ok(ctx)
}

fn load_options(args: &HookArgs) -> Result<PluginConfig> {
    if let Some(path) = &args.config {
        return Ok(PluginConfig::load(path)?);
    }
    if let Some(inline) = &args.options {
        let value: serde_json::Value =
            serde_json::from_str(inline).context("--options is not valid JSON")?;
        return Ok(PluginConfig::from_value(value)?);
    }
    Ok(PluginConfig::default())
}
