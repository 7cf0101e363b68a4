use async_trait::async_trait;
use serde::Serialize;

use crate::{
    api::ecoflow::{self, ModuleType, ParameterMap},
    prelude::*,
    station::{BatteryState, DeviceStatus, PowerStation},
};

/// AC output settings sent along with every AC switch command.
#[derive(Copy, Clone)]
pub struct AcOutput {
    pub voltage: u16,
    pub frequency: u8,
}

impl Default for AcOutput {
    fn default() -> Self {
        Self { voltage: 230, frequency: 50 }
    }
}

/// [EcoFlow Delta 2](https://developer-eu.ecoflow.com/us/document/delta2) over the cloud API.
pub struct Delta2 {
    api: ecoflow::Api,
    ac_output: AcOutput,
}

impl Delta2 {
    const AC_ENABLED: &'static str = "mppt.cfgAcEnabled";
    const CHARGING_LINE_PLUGGED: &'static str = "bms_emsStatus.chgLinePlug";
    const CHARGING_STATE: &'static str = "bms_bmsStatus.chgState";
    const REMAINING_TIME: &'static str = "pd.remainTime";
    const STATE_OF_CHARGE: &'static str = "pd.soc";

    pub const fn new(api: ecoflow::Api, ac_output: AcOutput) -> Self {
        Self { api, ac_output }
    }

    async fn get_integers<const N: usize>(&self, names: [&str; N]) -> Result<[i64; N]> {
        let params = self.api.get_params(&names).await?;
        let mut values = [0; N];
        for (value, name) in values.iter_mut().zip(names) {
            *value = extract_integer(&params, name)?;
        }
        Ok(values)
    }

    async fn get_integer(&self, name: &str) -> Result<i64> {
        let [value] = self.get_integers([name]).await?;
        Ok(value)
    }
}

fn extract_integer(params: &ParameterMap, name: &str) -> Result<i64> {
    params
        .get(name)
        .with_context(|| format!("`{name}` is missing in the response"))?
        .as_i64()
        .with_context(|| format!("`{name}` is not an integer"))
}

#[async_trait]
impl PowerStation for Delta2 {
    async fn is_online(&self) -> Result<bool> {
        Ok(self.api.is_online().await?)
    }

    #[instrument(skip_all)]
    async fn is_ac_enabled(&self) -> Result<bool> {
        let is_enabled = self.get_integer(Self::AC_ENABLED).await? == 1;
        debug!(is_enabled);
        Ok(is_enabled)
    }

    #[instrument(skip_all, fields(is_enabled = is_enabled))]
    async fn set_ac_enabled(&self, is_enabled: bool) -> Result {
        #[derive(Serialize)]
        struct AcOutConfig {
            enabled: u8,
            xboost: u8,
            out_voltage: u16,
            out_freq: u8,
        }

        let config = AcOutConfig {
            enabled: u8::from(is_enabled),
            xboost: 0,
            out_voltage: self.ac_output.voltage,
            out_freq: self.ac_output.frequency,
        };
        Ok(self.api.set_params(ModuleType::Mppt, "acOutCfg", config).await?)
    }

    #[instrument(skip_all)]
    async fn is_charging_line_plugged(&self) -> Result<bool> {
        let is_plugged = self.get_integer(Self::CHARGING_LINE_PLUGGED).await? == 1;
        debug!(is_plugged);
        Ok(is_plugged)
    }

    #[instrument(skip_all)]
    async fn get_battery_state(&self) -> Result<BatteryState> {
        let [charging_state, remaining_time_minutes, state_of_charge_percent] = self
            .get_integers([Self::CHARGING_STATE, Self::REMAINING_TIME, Self::STATE_OF_CHARGE])
            .await?;
        let state = BatteryState {
            is_charging: charging_state != 0,
            remaining_time_minutes,
            state_of_charge_percent,
        };
        debug!(?state);
        Ok(state)
    }

    #[instrument(skip_all)]
    async fn get_status(&self) -> Result<DeviceStatus> {
        if !self.is_online().await? {
            return Ok(DeviceStatus::default());
        }
        let [ac_enabled, charging_line_plugged, charging_state, remaining_time, state_of_charge] =
            self.get_integers([
                Self::AC_ENABLED,
                Self::CHARGING_LINE_PLUGGED,
                Self::CHARGING_STATE,
                Self::REMAINING_TIME,
                Self::STATE_OF_CHARGE,
            ])
            .await?;
        Ok(DeviceStatus {
            is_online: true,
            is_ac_enabled: ac_enabled == 1,
            is_charging_line_plugged: charging_line_plugged == 1,
            battery: BatteryState {
                is_charging: charging_state != 0,
                remaining_time_minutes: remaining_time,
                state_of_charge_percent: state_of_charge,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use reqwest::Url;
    use serde_json::json;

    use super::*;
    use crate::{
        api::ecoflow::{Api, Credentials},
        testing::{serve, serve_once},
    };

    const SERIAL_NUMBER: &str = "R331ZEB4ZE8Q0123";

    fn delta2(base_url: Url) -> Result<Delta2> {
        let credentials = Credentials {
            access_key: "access".to_owned(),
            secret_key: "secret".to_owned(),
            serial_number: SERIAL_NUMBER.to_owned(),
        };
        let api = Api::new(base_url, credentials, Duration::from_secs(10))?;
        Ok(Delta2::new(api, AcOutput::default()))
    }

    #[test]
    fn test_extract_integer_ok() -> Result {
        let params = json!({"pd.remainTime": -5, "pd.soc": "87"});
        let params = params.as_object().context("not an object")?;
        assert_eq!(extract_integer(params, "pd.remainTime")?, -5);
        assert!(extract_integer(params, "pd.soc").is_err());
        assert!(extract_integer(params, "mppt.cfgAcEnabled").is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_set_ac_disabled_ok() -> Result {
        let (url, server) = serve_once(r#"{"code": "0", "message": "Success"}"#).await?;
        delta2(url)?.set_ac_enabled(false).await?;
        let request = server.await??;
        assert!(request.request_line.starts_with("PUT /quota "));
        assert_eq!(
            request.body,
            Some(json!({
                "sn": SERIAL_NUMBER,
                "moduleType": 5,
                "operateType": "acOutCfg",
                "params": {"enabled": 0, "xboost": 0, "out_voltage": 230, "out_freq": 50},
            }))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_battery_state_ok() -> Result {
        // language=JSON
        let (url, server) = serve_once(
            r#"{
                "code": "0",
                "message": "Success",
                "data": {"bms_bmsStatus.chgState": 2, "pd.remainTime": 42, "pd.soc": 87}
            }"#,
        )
        .await?;
        let state = delta2(url)?.get_battery_state().await?;
        assert_eq!(
            state,
            BatteryState {
                is_charging: true,
                remaining_time_minutes: 42,
                state_of_charge_percent: 87,
            }
        );
        let request = server.await??;
        assert_eq!(
            request.body.context("no body")?["params"]["quotas"],
            json!(["bms_bmsStatus.chgState", "pd.remainTime", "pd.soc"]),
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_get_battery_state_not_charging() -> Result {
        // language=JSON
        let (url, _server) = serve_once(
            r#"{
                "code": "0",
                "message": "Success",
                "data": {"bms_bmsStatus.chgState": 0, "pd.remainTime": 0, "pd.soc": 100}
            }"#,
        )
        .await?;
        assert!(!delta2(url)?.get_battery_state().await?.is_charging);
        Ok(())
    }

    #[tokio::test]
    async fn test_get_status_offline() -> Result {
        // language=JSON
        let (url, server) = serve_once(
            r#"{
                "code": "0",
                "message": "Success",
                "data": [{"sn": "R331ZEB4ZE8Q0123", "online": 0}]
            }"#,
        )
        .await?;
        assert_eq!(delta2(url)?.get_status().await?, DeviceStatus::default());
        assert!(server.await??.request_line.starts_with("GET /list "));
        Ok(())
    }

    #[tokio::test]
    async fn test_get_status_online() -> Result {
        // language=JSON
        let (url, server) = serve(vec![
            r#"{
                "code": "0",
                "message": "Success",
                "data": [{"sn": "R331ZEB4ZE8Q0123", "online": 1}]
            }"#,
            r#"{
                "code": "0",
                "message": "Success",
                "data": {
                    "mppt.cfgAcEnabled": 1,
                    "bms_emsStatus.chgLinePlug": 1,
                    "bms_bmsStatus.chgState": 0,
                    "pd.remainTime": 5939,
                    "pd.soc": 99
                }
            }"#,
        ])
        .await?;
        let status = delta2(url)?.get_status().await?;
        assert_eq!(
            status,
            DeviceStatus {
                is_online: true,
                is_ac_enabled: true,
                is_charging_line_plugged: true,
                battery: BatteryState {
                    is_charging: false,
                    remaining_time_minutes: 5939,
                    state_of_charge_percent: 99,
                },
            }
        );
        let requests = server.await??;
        assert_eq!(requests.len(), 2);
        assert!(requests[0].request_line.starts_with("GET /list "));
        assert!(requests[1].request_line.starts_with("POST /quota "));
        Ok(())
    }
}
