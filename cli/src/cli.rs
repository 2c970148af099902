//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags};
use crate::commands;

/// Start a service and hold it to its health checks
#[derive(Parser)]
#[command(
    name = "mega-launch",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output (`NO_COLOR` set to anything but a false-ish value)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start a unit and verify its ports and logs, retrying with rescues
    Launch(commands::launch::LaunchArgs),

    /// Probe a running unit once, without starting or stopping it
    Check(commands::check::CheckArgs),

    /// Report on or clean up a launch job record
    Status(commands::status::StatusArgs),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            no_color,
            quiet,
            json,
            command,
        } = self;
        let flags = AppFlags {
            no_color,
            quiet,
            json,
        };
        let app = || AppContext::new(&flags);
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Launch(args) => commands::launch::run(&args, &app()?).await,
            Command::Check(args) => commands::check::run(&args, &app()?).await,
            Command::Status(args) => commands::status::run(&args, &app()?).await,
        }
    }
}
