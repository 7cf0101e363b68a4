//! [EcoFlow IoT Open API](https://developer-eu.ecoflow.com/us/document/introduction) client.

mod error;
mod models;
mod response;
pub mod sign;

use std::time::Duration;

use chrono::Utc;
use reqwest::{Client, Method, Url};
use serde::Serialize;
use serde_json::Value;

pub use self::{
    error::Error,
    models::{Device, ModuleType, ParameterMap},
};
use self::{
    models::{GetParamsRequest, Quotas, SetParamsRequest},
    response::Response,
    sign::Signer,
};
use crate::prelude::*;

/// Immutable account credentials and the managed device.
#[must_use]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
    pub serial_number: String,
}

/// Cloud API client scoped to a single device.
pub struct Api {
    client: Client,
    base_url: Url,
    credentials: Credentials,
}

impl Api {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.ecoflow.com/iot-open/sign/device/";

    pub fn new(base_url: Url, credentials: Credentials, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("dormouse/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url, credentials })
    }

    pub fn serial_number(&self) -> &str {
        &self.credentials.serial_number
    }

    #[instrument(skip_all)]
    pub async fn list_devices(&self) -> Result<Vec<Device>, Error> {
        match self.call(Method::GET, "list", None::<()>, &[]).await? {
            Value::Object(object) if object.is_empty() => Ok(Vec::new()),
            data => serde_json::from_value(data).map_err(Error::UnexpectedPayload),
        }
    }

    /// Look the device up in the account's device list.
    #[instrument(skip_all, fields(serial_number = self.serial_number()))]
    pub async fn is_online(&self) -> Result<bool, Error> {
        let device = self
            .list_devices()
            .await?
            .into_iter()
            .find(|device| device.serial_number == self.credentials.serial_number)
            .ok_or_else(|| Error::DeviceNotLinked {
                serial_number: self.credentials.serial_number.clone(),
            })?;
        debug!(device.online, "found the device");
        Ok(device.online)
    }

    /// Fetch every parameter the device reports.
    #[instrument(skip_all, fields(serial_number = self.serial_number()))]
    pub async fn get_all_params(&self) -> Result<ParameterMap, Error> {
        let data = self
            .call(Method::GET, "quota/all", None::<()>, &[("sn", self.serial_number())])
            .await?;
        serde_json::from_value(data).map_err(Error::UnexpectedPayload)
    }

    #[instrument(skip_all, fields(serial_number = self.serial_number(), names = ?names))]
    pub async fn get_params(&self, names: &[&str]) -> Result<ParameterMap, Error> {
        let request = GetParamsRequest {
            serial_number: self.serial_number(),
            params: Quotas { quotas: names },
        };
        let data = self.call(Method::POST, "quota", Some(request), &[]).await?;
        serde_json::from_value(data).map_err(Error::UnexpectedPayload)
    }

    #[instrument(
        skip_all,
        fields(
            serial_number = self.serial_number(),
            module_type = %module_type,
            operate_type = operate_type,
        ),
    )]
    pub async fn set_params<P: Serialize>(
        &self,
        module_type: ModuleType,
        operate_type: &str,
        params: P,
    ) -> Result<(), Error> {
        info!("setting…");
        let request = SetParamsRequest {
            serial_number: self.serial_number(),
            module_type,
            operate_type,
            params,
        };
        self.call(Method::PUT, "quota", Some(request), &[]).await?;
        Ok(())
    }

    /// Sign and send a request, then classify the response.
    ///
    /// Returns the `data` field, or an empty object if there is none.
    #[instrument(skip_all, level = Level::DEBUG, fields(method = %method, function = function))]
    pub async fn call<B: Serialize>(
        &self,
        method: Method,
        function: &str,
        body: Option<B>,
        query: &[(&str, &str)],
    ) -> Result<Value, Error> {
        let body = body.map(serde_json::to_value).transpose().map_err(Error::Serialize)?;
        let nonce = fastrand::u32(100_000..=999_999);
        let timestamp = Utc::now().timestamp_millis();
        let signature = Signer {
            access_key: &self.credentials.access_key,
            secret_key: &self.credentials.secret_key,
        }
        .sign(nonce, timestamp, body.as_ref(), query.iter().copied())?;
        trace!(canonical = %signature.canonical, "signed");

        let url = format!("{}/{function}", self.base_url.as_str().trim_end_matches('/'));
        let mut request = self
            .client
            .request(method, url)
            .header("accessKey", &self.credentials.access_key)
            .header("nonce", nonce.to_string())
            .header("timestamp", timestamp.to_string())
            .header("sign", signature.sign);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        // Reading the body may fail mid-way as well, that is still the link's fault.
        let bytes = request.send().await?.bytes().await?;
        let response =
            serde_json::from_slice::<Response>(&bytes).map_err(Error::UnexpectedPayload)?;
        let data = Result::<Value, Error>::from(response)?;
        debug!(%data, "call succeeded");
        Ok(data)
    }
}
