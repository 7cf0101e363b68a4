mod api;
mod cli;
mod cycle;
mod link;
mod notify;
mod prelude;
mod relay;
mod shutdown;
mod station;
mod tables;
#[cfg(test)]
mod testing;

use std::process::ExitCode;

use clap::{Parser, crate_version};
use tracing_subscriber::EnvFilter;

use crate::{
    cli::{Args, Command},
    prelude::*,
    shutdown::{Cancelled, Shutdown},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .without_time()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    info!(version = crate_version!(), "starting…");

    let args = Args::parse();
    let notifier = args.notifier.new_notifier()?;

    match args.command {
        Command::Run(args) => match args.run(Shutdown::listen()?).await {
            Ok(()) => {
                info!("the charge cycle has completed");
                notifier.send("The charge cycle has completed, the relay is released.").await;
            }
            Err(error) if error.is::<Cancelled>() => {
                warn!("the charge cycle has been cancelled");
                return Ok(ExitCode::FAILURE);
            }
            Err(error) => {
                error!("the charge cycle has failed: {error:#}");
                notifier.send(&format!("The charge cycle has failed: {error:#}")).await;
                return Ok(ExitCode::FAILURE);
            }
        },
        Command::Burrow(args) => {
            args.run().await?;
        }
    }

    info!("done!");
    Ok(ExitCode::SUCCESS)
}
