use crate::{api::ecoflow::sign, link::ConnectivityError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("EcoFlow Cloud is unreachable")]
    Connectivity(#[from] ConnectivityError),

    /// The cloud cannot reach the device right now.
    #[error("the device is offline")]
    DeviceOffline,

    #[error("device `{serial_number}` is not linked to the account")]
    DeviceNotLinked { serial_number: String },

    #[error(r#"EcoFlow Cloud error {code} ("{message}")"#)]
    Protocol { code: String, message: String },

    #[error("unexpected response payload")]
    UnexpectedPayload(#[source] serde_json::Error),

    #[error("failed to serialize the request body")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to sign the request")]
    Signing(#[from] sign::Error),

    /// The request could not be built or followed through, for example a bad header value.
    #[error("failed to make the request")]
    Request(#[source] reqwest::Error),
}

impl Error {
    /// Check whether the error, possibly wrapped into a context, says the device is offline.
    pub fn is_device_offline(error: &anyhow::Error) -> bool {
        matches!(error.downcast_ref::<Self>(), Some(Self::DeviceOffline))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        ConnectivityError::try_from(error).map_or_else(Self::Request, Self::Connectivity)
    }
}
