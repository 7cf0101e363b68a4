use std::{path::PathBuf, time::Duration};

use clap::Parser;

use crate::{
    cli::{ecoflow::EcoFlowApiArgs, link::LinkArgs},
    cycle::{ChargeCycle, Delays},
    link::{Link, Resilient},
    prelude::*,
    relay::{DryRunRelay, Relay, SysfsRelay},
    shutdown::Shutdown,
    station::{AcOutput, Delta2, PowerStation},
};

#[derive(Parser)]
pub struct RunArgs {
    #[clap(flatten)]
    ecoflow: EcoFlowApiArgs,

    #[clap(flatten)]
    delays: DelayArgs,

    #[clap(flatten)]
    ac_output: AcOutputArgs,

    #[clap(flatten)]
    link: LinkArgs,

    #[clap(flatten)]
    relay: RelayArgs,
}

impl RunArgs {
    pub async fn run(self, shutdown: Shutdown) -> Result {
        let station = Delta2::new(self.ecoflow.new_client()?, self.ac_output.into());
        let retry_delay = self.link.retry_delay();
        let mut runner =
            Resilient::new(self.link.new_link(shutdown.clone()), retry_delay, shutdown.clone());
        let delays = Delays::from(self.delays);
        match self.relay.value_path {
            Some(value_path) => {
                run_cycle(station, SysfsRelay::new(value_path), delays, shutdown, &mut runner).await
            }
            None => {
                warn!("no relay is configured, running dry…");
                run_cycle(station, DryRunRelay::default(), delays, shutdown, &mut runner).await
            }
        }
    }
}

async fn run_cycle<S: PowerStation, R: Relay, L: Link>(
    station: S,
    relay: R,
    delays: Delays,
    shutdown: Shutdown,
    runner: &mut Resilient<L>,
) -> Result {
    ChargeCycle::builder()
        .station(station)
        .relay(relay)
        .delays(delays)
        .shutdown(shutdown)
        .build()
        .run(runner)
        .await
}

/// Stage delays, in whole seconds.
#[derive(Copy, Clone, Parser)]
pub struct DelayArgs {
    /// Delay before the cycle starts.
    #[clap(long = "startup-delay-secs", env = "STARTUP_DELAY_SECS", default_value = "10")]
    startup_secs: u64,

    /// Poll interval while the device is offline.
    #[clap(
        long = "device-offline-delay-secs",
        env = "DEVICE_OFFLINE_DELAY_SECS",
        default_value = "60"
    )]
    device_offline_secs: u64,

    /// Poll interval while the charging line is unplugged.
    #[clap(
        long = "charging-line-delay-secs",
        env = "CHARGING_LINE_DELAY_SECS",
        default_value = "10"
    )]
    charging_line_secs: u64,

    /// Delay before every AC-off command.
    #[clap(long = "ac-off-delay-secs", env = "AC_OFF_DELAY_SECS", default_value = "10")]
    ac_off_secs: u64,

    /// Delay after every AC-off command, before checking the AC output again.
    #[clap(long = "ac-settle-delay-secs", env = "AC_SETTLE_DELAY_SECS", default_value = "5")]
    ac_settle_secs: u64,

    /// Margin added to the remaining charging time reported by the device.
    #[clap(
        long = "charge-check-add-delay-secs",
        env = "CHARGE_CHECK_ADD_DELAY_SECS",
        default_value = "10"
    )]
    charge_check_add_secs: u64,

    /// Upper bound of the charge poll interval.
    #[clap(
        long = "charge-check-max-delay-secs",
        env = "CHARGE_CHECK_MAX_DELAY_SECS",
        default_value = "300"
    )]
    charge_check_max_secs: u64,

    /// Settle time after charging has stopped.
    #[clap(long = "full-charge-delay-secs", env = "FULL_CHARGE_DELAY_SECS", default_value = "10")]
    full_charge_secs: u64,
}

impl From<DelayArgs> for Delays {
    fn from(args: DelayArgs) -> Self {
        Self {
            startup: Duration::from_secs(args.startup_secs),
            device_offline: Duration::from_secs(args.device_offline_secs),
            charging_line: Duration::from_secs(args.charging_line_secs),
            ac_off: Duration::from_secs(args.ac_off_secs),
            ac_settle: Duration::from_secs(args.ac_settle_secs),
            charge_check_add: Duration::from_secs(args.charge_check_add_secs),
            charge_check_max: Duration::from_secs(args.charge_check_max_secs),
            full_charge: Duration::from_secs(args.full_charge_secs),
        }
    }
}

#[derive(Copy, Clone, Parser)]
pub struct AcOutputArgs {
    /// AC output voltage sent along with the AC-off command.
    #[clap(long = "ac-output-voltage", env = "AC_OUTPUT_VOLTAGE", default_value = "230")]
    voltage: u16,

    /// AC output frequency in hertz sent along with the AC-off command.
    #[clap(long = "ac-output-frequency", env = "AC_OUTPUT_FREQUENCY", default_value = "50")]
    frequency: u8,
}

impl From<AcOutputArgs> for AcOutput {
    fn from(args: AcOutputArgs) -> Self {
        Self { voltage: args.voltage, frequency: args.frequency }
    }
}

#[derive(Parser)]
pub struct RelayArgs {
    /// Sysfs GPIO value file of the relay. Without it, the relay is only simulated.
    #[clap(long = "relay-value-path", env = "RELAY_VALUE_PATH")]
    value_path: Option<PathBuf>,
}
