//! Request signing for the EcoFlow IoT Open API.
//!
//! The server re-builds the very same canonical string from the request and
//! compares HMAC-SHA256 digests, so every byte here matters.

use std::collections::BTreeMap;

use hmac::{
    Hmac, Mac,
    digest::{InvalidLength, KeyInit},
};
use itertools::Itertools;
use serde_json::Value;
use sha2::Sha256;

/// Flattened request parameters, ordered by raw key comparison.
pub type Parameters = BTreeMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported {kind} value at `{path}`")]
    UnsupportedValue { path: String, kind: &'static str },

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("the secret key is not accepted by HMAC-SHA256")]
    InvalidKey,
}

impl From<InvalidLength> for Error {
    fn from(_: InvalidLength) -> Self {
        Self::InvalidKey
    }
}

#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// The exact string the digest is computed over.
    pub canonical: String,

    /// Lowercase hex HMAC-SHA256 digest.
    pub sign: String,
}

pub struct Signer<'a> {
    pub access_key: &'a str,
    pub secret_key: &'a str,
}

impl Signer<'_> {
    /// Sign a request.
    ///
    /// Explicit query parameters override the flattened body on key collision.
    pub fn sign<'p>(
        &self,
        nonce: u32,
        timestamp_millis: i64,
        body: Option<&Value>,
        query: impl IntoIterator<Item = (&'p str, &'p str)>,
    ) -> Result<Signature, Error> {
        let mut parameters = match body {
            Some(body) => flatten(body)?,
            None => Parameters::new(),
        };
        parameters
            .extend(query.into_iter().map(|(key, value)| (key.to_owned(), value.to_owned())));
        let canonical = self.canonicalize(&parameters, nonce, timestamp_millis);
        let sign = self.digest(&canonical)?;
        Ok(Signature { canonical, sign })
    }

    /// Sorted parameters followed by the mandatory `accessKey`, `nonce` and `timestamp`.
    fn canonicalize(&self, parameters: &Parameters, nonce: u32, timestamp_millis: i64) -> String {
        let nonce = nonce.to_string();
        let timestamp = timestamp_millis.to_string();
        parameters
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .chain([
                ("accessKey", self.access_key),
                ("nonce", nonce.as_str()),
                ("timestamp", timestamp.as_str()),
            ])
            .map(|(key, value)| format!("{key}={value}"))
            .join("&")
    }

    fn digest(&self, canonical: &str) -> Result<String, Error> {
        let mut mac = <Hmac<Sha256> as KeyInit>::new_from_slice(self.secret_key.as_bytes())?;
        mac.update(canonical.as_bytes());
        let digest = mac.finalize().into_bytes();
        Ok(format!("{digest:x}"))
    }
}

/// Flatten a JSON object into `parent.child` and `parent[index]` keys.
pub fn flatten(body: &Value) -> Result<Parameters, Error> {
    let Value::Object(object) = body else {
        return Err(Error::NotAnObject);
    };
    let mut parameters = Parameters::new();
    for (key, value) in object {
        flatten_into(value, key.clone(), &mut parameters)?;
    }
    Ok(parameters)
}

fn flatten_into(value: &Value, path: String, into: &mut Parameters) -> Result<(), Error> {
    match value {
        Value::String(string) => {
            into.insert(path, string.clone());
        }
        Value::Number(number) if number.is_i64() || number.is_u64() => {
            into.insert(path, number.to_string());
        }
        Value::Object(object) => {
            for (key, child) in object {
                flatten_into(child, format!("{path}.{key}"), into)?;
            }
        }
        Value::Array(array) => {
            for (index, child) in array.iter().enumerate() {
                flatten_into(child, format!("{path}[{index}]"), into)?;
            }
        }
        Value::Number(_) => return Err(Error::UnsupportedValue { path, kind: "float" }),
        Value::Bool(_) => return Err(Error::UnsupportedValue { path, kind: "boolean" }),
        Value::Null => return Err(Error::UnsupportedValue { path, kind: "null" }),
    }
    Ok(())
}
