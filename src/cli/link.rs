use std::time::Duration;

use clap::Parser;

use crate::{link::ProbeLink, shutdown::Shutdown};

#[derive(Parser)]
pub struct LinkArgs {
    /// Address to probe with a TCP connection to tell whether the link is up.
    #[clap(
        long = "link-probe-address",
        env = "LINK_PROBE_ADDRESS",
        default_value = "api.ecoflow.com:443"
    )]
    probe_address: String,

    #[clap(long = "link-probe-timeout-secs", env = "LINK_PROBE_TIMEOUT_SECS", default_value = "5")]
    probe_timeout_secs: u64,

    /// Delay before retrying after a link failure.
    #[clap(long = "link-retry-delay-secs", env = "LINK_RETRY_DELAY_SECS", default_value = "30")]
    retry_delay_secs: u64,

    #[clap(
        long = "link-max-attempts-before-reset",
        env = "LINK_MAX_ATTEMPTS_BEFORE_RESET",
        default_value = "3"
    )]
    max_attempts_before_reset: u32,

    /// Shell command that bounces the network interface, for example:
    /// `nmcli radio wifi off && nmcli radio wifi on`.
    #[clap(long = "link-reset-command", env = "LINK_RESET_COMMAND")]
    reset_command: Option<String>,
}

impl LinkArgs {
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    pub fn new_link(self, shutdown: Shutdown) -> ProbeLink {
        let retry_delay = self.retry_delay();
        ProbeLink::builder()
            .address(self.probe_address)
            .probe_timeout(Duration::from_secs(self.probe_timeout_secs))
            .retry_delay(retry_delay)
            .max_attempts_before_reset(self.max_attempts_before_reset)
            .maybe_reset_command(self.reset_command)
            .shutdown(shutdown)
            .build()
    }
}
