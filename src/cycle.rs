//! The charge cycle: wait for the device, switch its AC output off, charge, release the relay.

use std::time::Duration;

use bon::Builder;
use derive_more::Display;
use tracing::{Instrument, info_span};

use crate::{
    api::ecoflow,
    link::{Link, Resilient},
    prelude::*,
    relay::Relay,
    shutdown::Shutdown,
    station::PowerStation,
};

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum Stage {
    #[display("await_online")]
    AwaitOnline,

    #[display("await_charging_line")]
    AwaitChargingLine,

    #[display("disable_ac")]
    DisableAc,

    #[display("await_full_charge")]
    AwaitFullCharge,

    #[display("release_relay")]
    ReleaseRelay,
}

impl Stage {
    pub const ALL: [Self; 5] = [
        Self::AwaitOnline,
        Self::AwaitChargingLine,
        Self::DisableAc,
        Self::AwaitFullCharge,
        Self::ReleaseRelay,
    ];
}

#[derive(Copy, Clone, Debug)]
pub struct Delays {
    pub startup: Duration,
    pub device_offline: Duration,
    pub charging_line: Duration,

    /// Pause before every AC-off command.
    pub ac_off: Duration,

    /// Pause after every AC-off command, before re-checking.
    pub ac_settle: Duration,

    pub charge_check_add: Duration,
    pub charge_check_max: Duration,

    /// Settle time after charging has stopped.
    pub full_charge: Duration,
}

impl Delays {
    /// Wait for the reported remaining time plus a margin, but not longer than the cap.
    ///
    /// The device sometimes reports negative remaining time, which counts as zero.
    pub fn charge_check(&self, remaining_time_minutes: i64) -> Duration {
        let remaining_secs = u64::try_from(remaining_time_minutes.saturating_mul(60)).unwrap_or(0);
        Duration::from_secs(remaining_secs)
            .saturating_add(self.charge_check_add)
            .min(self.charge_check_max)
    }
}

#[derive(Builder)]
pub struct ChargeCycle<S, R> {
    station: S,
    relay: R,
    delays: Delays,
    shutdown: Shutdown,
}

impl<S: PowerStation, R: Relay> ChargeCycle<S, R> {
    /// Run the whole cycle once.
    ///
    /// Every stage goes through the runner on its own, so a link failure re-enters
    /// only the stage that was interrupted. Stages that have passed are never revisited.
    #[instrument(skip_all)]
    pub async fn run<L: Link>(&self, runner: &mut Resilient<L>) -> Result {
        info!(delay = ?self.delays.startup, "starting up…");
        self.shutdown.sleep(self.delays.startup).await?;

        // Fail on a misconfigured serial number before touching the relay.
        // Offline is no failure here, the first stage waits for the device anyway:
        runner.run(move || async move { unless_offline(self.station.is_online().await) }).await?;
        self.relay.enable().context("failed to enable the relay")?;

        for stage in Stage::ALL {
            self.run_stage(stage, runner).instrument(info_span!("stage", %stage)).await?;
        }
        Ok(())
    }

    async fn run_stage<L: Link>(&self, stage: Stage, runner: &mut Resilient<L>) -> Result {
        info!("entering…");
        match stage {
            Stage::AwaitOnline => runner.run(move || self.await_online()).await?,
            Stage::AwaitChargingLine => runner.run(move || self.await_charging_line()).await?,
            Stage::DisableAc => runner.run(move || self.disable_ac()).await?,
            Stage::AwaitFullCharge => runner.run(move || self.await_full_charge()).await?,
            Stage::ReleaseRelay => self.relay.disable().context("failed to disable the relay")?,
        }
        info!("passed");
        Ok(())
    }

    async fn await_online(&self) -> Result {
        while unless_offline(self.station.is_online().await)? != Some(true) {
            info!(delay = ?self.delays.device_offline, "the device is offline, waiting…");
            self.shutdown.sleep(self.delays.device_offline).await?;
        }
        Ok(())
    }

    async fn await_charging_line(&self) -> Result {
        while unless_offline(self.station.is_charging_line_plugged().await)? != Some(true) {
            info!(delay = ?self.delays.charging_line, "the charging line is unplugged, waiting…");
            self.shutdown.sleep(self.delays.charging_line).await?;
        }
        Ok(())
    }

    async fn disable_ac(&self) -> Result {
        loop {
            match unless_offline(self.station.is_ac_enabled().await)? {
                Some(false) => return Ok(()),
                Some(true) => {
                    info!(delay = ?self.delays.ac_off, "AC output is on, switching it off…");
                    self.shutdown.sleep(self.delays.ac_off).await?;
                    unless_offline(self.station.set_ac_enabled(false).await)?;
                    self.shutdown.sleep(self.delays.ac_settle).await?;
                }
                None => {
                    self.shutdown.sleep(self.delays.ac_off).await?;
                }
            }
        }
    }

    async fn await_full_charge(&self) -> Result {
        loop {
            let delay = match unless_offline(self.station.get_battery_state().await)? {
                Some(state) if !state.is_charging => break,
                Some(state) => {
                    let delay = self.delays.charge_check(state.remaining_time_minutes);
                    info!(
                        state_of_charge_percent = state.state_of_charge_percent,
                        remaining_time_minutes = state.remaining_time_minutes,
                        ?delay,
                        "charging…",
                    );
                    delay
                }
                None => self.delays.charge_check_add,
            };
            self.shutdown.sleep(delay).await?;
        }
        info!(delay = ?self.delays.full_charge, "charging has stopped, settling…");
        self.shutdown.sleep(self.delays.full_charge).await?;
        Ok(())
    }
}

/// Treat an offline device as a condition that is not met yet.
fn unless_offline<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(error) if ecoflow::Error::is_device_offline(&error) => {
            debug!("the device is offline");
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
