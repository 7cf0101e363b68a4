mod burrow;
mod ecoflow;
mod link;
mod notify;
mod run;

use clap::{Parser, Subcommand};

use crate::cli::{burrow::BurrowArgs, notify::NotifierArgs, run::RunArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[clap(flatten)]
    pub notifier: NotifierArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: run one charge cycle and release the relay once the device is full.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_verify_args() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_run_defaults() -> crate::prelude::Result {
        let args = Args::try_parse_from([
            "dormouse",
            "run",
            "--ecoflow-access-key=access",
            "--ecoflow-secret-key=secret",
            "--serial-number=R331ZEB4ZE8Q0123",
        ])?;
        assert!(matches!(args.command, Command::Run(_)));
        Ok(())
    }
}
