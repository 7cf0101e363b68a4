//! Typed view of the power station.

mod delta2;

use async_trait::async_trait;

pub use self::delta2::{AcOutput, Delta2};
use crate::prelude::*;

#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BatteryState {
    pub is_charging: bool,

    /// Estimated time till full, as reported. May be negative or nonsense.
    pub remaining_time_minutes: i64,

    pub state_of_charge_percent: i64,
}

/// Point-in-time snapshot, always fetched fresh.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DeviceStatus {
    pub is_online: bool,
    pub is_ac_enabled: bool,
    pub is_charging_line_plugged: bool,
    pub battery: BatteryState,
}

/// Device operations the charge cycle relies on.
///
/// Errors are passed through from the cloud client, so that callers can tell
/// an offline device or a link failure from anything else.
#[async_trait]
pub trait PowerStation: Sync {
    async fn is_online(&self) -> Result<bool>;

    async fn is_ac_enabled(&self) -> Result<bool>;

    async fn set_ac_enabled(&self, is_enabled: bool) -> Result;

    async fn is_charging_line_plugged(&self) -> Result<bool>;

    async fn get_battery_state(&self) -> Result<BatteryState>;

    /// Collect the full status. An offline device yields an all-default snapshot.
    async fn get_status(&self) -> Result<DeviceStatus>;
}
