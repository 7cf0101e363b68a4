use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{BoolFromInt, serde_as};

/// Device parameters keyed by their flattened path, e.g. `pd.soc`.
pub type ParameterMap = Map<String, Value>;

/// Device subsystem a write command is routed to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, derive_more::Display)]
#[serde(into = "u8")]
pub enum ModuleType {
    #[display("PD")]
    Pd = 1,

    #[display("BMS")]
    Bms = 2,

    #[display("INV")]
    Inverter = 3,

    #[display("BMS_SLAVE")]
    BmsSlave = 4,

    #[display("MPPT")]
    Mppt = 5,
}

impl From<ModuleType> for u8 {
    fn from(module_type: ModuleType) -> Self {
        module_type as Self
    }
}

#[must_use]
#[serde_as]
#[derive(Clone, Debug, Deserialize)]
pub struct Device {
    #[serde(rename = "sn")]
    pub serial_number: String,

    #[serde_as(as = "BoolFromInt")]
    pub online: bool,

    #[serde(rename = "productName", default)]
    pub product_name: Option<String>,

    #[serde(rename = "deviceName", default)]
    pub device_name: Option<String>,
}

#[derive(Serialize)]
pub struct GetParamsRequest<'a> {
    #[serde(rename = "sn")]
    pub serial_number: &'a str,

    pub params: Quotas<'a>,
}

#[derive(Serialize)]
pub struct Quotas<'a> {
    pub quotas: &'a [&'a str],
}

#[derive(Serialize)]
pub struct SetParamsRequest<'a, P> {
    #[serde(rename = "sn")]
    pub serial_number: &'a str,

    #[serde(rename = "moduleType")]
    pub module_type: ModuleType,

    #[serde(rename = "operateType")]
    pub operate_type: &'a str,

    pub params: P,
}
