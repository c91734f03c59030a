use std::str::FromStr;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::RegistryError;

type HmacSha256 = Hmac<Sha256>;

/// Service connection string of an IoT Hub shared access policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IotHubConnectionString {
    pub host_name: String,
    pub key_name: String,
    key: Vec<u8>,
}

impl IotHubConnectionString {
    /// Builds a `SharedAccessSignature` authorization value valid until `expiry`
    /// (seconds since the unix epoch).
    pub fn sas_token(&self, expiry: u64) -> Result<String, RegistryError> {
        let resource = urlencoding::encode(&self.host_name.to_lowercase()).into_owned();
        let string_to_sign = format!("{resource}\n{expiry}");

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| RegistryError::Configuration(e.to_string()))?;
        mac.update(string_to_sign.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!(
            "SharedAccessSignature sr={resource}&sig={}&se={expiry}&skn={}",
            urlencoding::encode(&signature),
            self.key_name
        ))
    }

    pub fn base_url(&self) -> String {
        format!("https://{}", self.host_name)
    }
}

impl FromStr for IotHubConnectionString {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut host_name = None;
        let mut key_name = None;
        let mut key = None;

        for part in s.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            // Keys are base64 and may end with '=' padding.
            let Some((name, value)) = part.split_once('=') else {
                return Err(RegistryError::Configuration(format!(
                    "malformed connection string segment `{part}`"
                )));
            };

            match name {
                "HostName" => host_name = Some(value.to_string()),
                "SharedAccessKeyName" => key_name = Some(value.to_string()),
                "SharedAccessKey" => key = Some(value.to_string()),
                _ => {}
            }
        }

        let missing = |field: &str| {
            RegistryError::Configuration(format!("connection string has no {field}"))
        };

        let key = STANDARD
            .decode(key.ok_or_else(|| missing("SharedAccessKey"))?)
            .map_err(|e| RegistryError::Configuration(format!("invalid SharedAccessKey: {e}")))?;

        Ok(Self {
            host_name: host_name.ok_or_else(|| missing("HostName"))?,
            key_name: key_name.ok_or_else(|| missing("SharedAccessKeyName"))?,
            key,
        })
    }
}
