use clap::{Parser, Subcommand};

use crate::{
    cli::ecoflow::EcoFlowApiArgs,
    prelude::*,
    station::{AcOutput, Delta2, PowerStation},
    tables::{build_devices_table, build_parameters_table, build_status_table},
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[clap(flatten)]
    ecoflow: EcoFlowApiArgs,

    #[command(subcommand)]
    command: BurrowCommand,
}

#[derive(Subcommand)]
pub enum BurrowCommand {
    /// List the devices linked to the account.
    Devices,

    /// Show the current device status.
    Status,

    /// Dump every parameter the device reports.
    Quotas,
}

impl BurrowArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let api = self.ecoflow.new_client()?;
        match self.command {
            BurrowCommand::Devices => {
                let devices = api.list_devices().await?;
                info!(n_devices = devices.len(), "gotcha");
                println!("{}", build_devices_table(&devices));
            }
            BurrowCommand::Status => {
                let status = Delta2::new(api, AcOutput::default()).get_status().await?;
                println!("{}", build_status_table(&status));
            }
            BurrowCommand::Quotas => {
                let parameters = api.get_all_params().await?;
                info!(n_parameters = parameters.len(), "gotcha");
                println!("{}", build_parameters_table(&parameters));
            }
        }
        Ok(())
    }
}
