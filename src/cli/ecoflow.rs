use std::time::Duration;

use clap::Parser;
use reqwest::Url;

use crate::{
    api::ecoflow::{Api, Credentials},
    prelude::*,
};

#[derive(Parser)]
pub struct EcoFlowApiArgs {
    #[clap(long = "ecoflow-access-key", env = "ECOFLOW_ACCESS_KEY", hide_env_values = true)]
    access_key: String,

    #[clap(long = "ecoflow-secret-key", env = "ECOFLOW_SECRET_KEY", hide_env_values = true)]
    secret_key: String,

    #[clap(long, alias = "serial", env = "ECOFLOW_SERIAL_NUMBER")]
    serial_number: String,

    #[clap(
        long = "ecoflow-api-url",
        env = "ECOFLOW_API_URL",
        default_value = Api::DEFAULT_BASE_URL
    )]
    base_url: Url,

    /// Timeout of every API call.
    #[clap(long = "ecoflow-timeout-secs", env = "ECOFLOW_TIMEOUT_SECS", default_value = "10")]
    timeout_secs: u64,
}

impl EcoFlowApiArgs {
    pub fn new_client(self) -> Result<Api> {
        let credentials = Credentials {
            access_key: self.access_key,
            secret_key: self.secret_key,
            serial_number: self.serial_number,
        };
        Api::new(self.base_url, credentials, Duration::from_secs(self.timeout_secs))
    }
}
