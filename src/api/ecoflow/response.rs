use serde::Deserialize;
use serde_json::{Map, Value};

use crate::api::ecoflow::Error;

/// Generic API response.
#[derive(Deserialize)]
pub struct Response {
    code: String,

    #[serde(default)]
    message: String,

    data: Option<Value>,
}

impl Response {
    const SUCCESS_CODE: &'static str = "0";
    const SUCCESS_MESSAGE: &'static str = "Success";
    const DEVICE_OFFLINE_CODE: &'static str = "1000";
}

impl From<Response> for Result<Value, Error> {
    fn from(response: Response) -> Self {
        if response.code == Response::DEVICE_OFFLINE_CODE {
            Err(Error::DeviceOffline)
        } else if response.code == Response::SUCCESS_CODE
            && response.message == Response::SUCCESS_MESSAGE
        {
            Ok(match response.data {
                Some(Value::Null) | None => Value::Object(Map::new()),
                Some(data) => data,
            })
        } else {
            Err(Error::Protocol { code: response.code, message: response.message })
        }
    }
}
