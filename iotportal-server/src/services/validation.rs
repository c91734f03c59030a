use std::collections::BTreeMap;

use iotportal_api::models::{DeviceDetails, DeviceTag, LoRaDeviceDetails};

use crate::errors::DeviceError;

const MAX_DEVICE_ID_LENGTH: usize = 128;
const DEVICE_ID_SYMBOLS: &str = "-:.+%_#*?!(),=@$'";

/// IoT Hub device id charset.
pub fn is_valid_device_id(device_id: &str) -> bool {
    !device_id.is_empty()
        && device_id.len() <= MAX_DEVICE_ID_LENGTH
        && device_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || DEVICE_ID_SYMBOLS.contains(c))
}

/// 64-bit identifier written as 16 hexadecimal digits (DevEUI, station EUI).
pub fn is_eui(value: &str) -> bool {
    value.len() == 16 && value.chars().all(|c| c.is_ascii_hexdigit())
}

pub fn decode_hex(value: &str) -> Option<Vec<u8>> {
    hex::decode(value).ok()
}

pub fn check_required_tags(
    tags: &[DeviceTag],
    values: &BTreeMap<String, String>,
) -> Result<(), DeviceError> {
    for tag in tags.iter().filter(|tag| tag.required) {
        if values.get(&tag.name).is_none_or(|v| v.trim().is_empty()) {
            return Err(DeviceError::MissingRequiredTag(tag.name.clone()));
        }
    }

    Ok(())
}

/// Checks done on a device payload before it reaches the registry.
pub trait Validate {
    fn validate(&self) -> Result<(), DeviceError>;
}

impl Validate for DeviceDetails {
    fn validate(&self) -> Result<(), DeviceError> {
        if !is_valid_device_id(&self.device_id) {
            return Err(DeviceError::InvalidDeviceId(self.device_id.clone()));
        }

        if self.device_name.trim().is_empty() {
            return Err(DeviceError::InvalidRequest("device name is required".into()));
        }

        if self.model_id.trim().is_empty() {
            return Err(DeviceError::InvalidRequest("model id is required".into()));
        }

        Ok(())
    }
}

impl Validate for LoRaDeviceDetails {
    fn validate(&self) -> Result<(), DeviceError> {
        self.device.validate()?;

        if !is_eui(&self.device.device_id) {
            return Err(DeviceError::InvalidDeviceId(self.device.device_id.clone()));
        }

        let missing = |name: &str, value: &Option<String>| {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                Err(DeviceError::InvalidRequest(format!("{name} is required")))
            } else {
                Ok(())
            }
        };

        if self.use_otaa {
            missing("appEui", &self.app_eui)?;
            missing("appKey", &self.app_key)?;
        } else {
            missing("appSKey", &self.app_s_key)?;
            missing("nwkSKey", &self.nwk_s_key)?;
            missing("devAddr", &self.dev_addr)?;
        }

        if !matches!(self.preferred_window, 1 | 2) {
            return Err(DeviceError::InvalidRequest(
                "preferredWindow must be 1 or 2".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lora(device_id: &str) -> LoRaDeviceDetails {
        LoRaDeviceDetails::new(DeviceDetails {
            device_id: device_id.into(),
            device_name: "sensor".into(),
            model_id: "m1".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_device_id_charset() {
        assert!(is_valid_device_id("sensor-01:a.b+c%d_e#f*g?h!i(j)k,l=m@n$o'p"));
        assert!(!is_valid_device_id(""));
        assert!(!is_valid_device_id("with space"));
        assert!(!is_valid_device_id("slash/id"));
        assert!(!is_valid_device_id(&"a".repeat(129)));
    }

    #[test]
    fn test_hex_helpers() {
        assert!(is_eui("0011AABBccddEEFF"));
        assert!(!is_eui("0011AABBCCDDEEF"));
        assert!(!is_eui("0011AABBCCDDEEFG"));

        assert_eq!(decode_hex("01ff"), Some(vec![0x01, 0xff]));
        assert_eq!(decode_hex(""), Some(vec![]));
        assert_eq!(decode_hex("abc"), None);
        assert_eq!(decode_hex("zz"), None);
    }

    #[test]
    fn test_required_tags() {
        let tags = vec![DeviceTag {
            name: "site".into(),
            label: "Site".into(),
            required: true,
            searchable: false,
        }];

        let mut values = BTreeMap::new();
        assert!(matches!(
            check_required_tags(&tags, &values),
            Err(DeviceError::MissingRequiredTag(name)) if name == "site"
        ));

        values.insert("site".to_string(), " ".to_string());
        assert!(check_required_tags(&tags, &values).is_err());

        values.insert("site".to_string(), "paris".to_string());
        assert!(check_required_tags(&tags, &values).is_ok());
    }

    #[test]
    fn test_lora_activation_keys() {
        let mut device = lora("0011223344556677");
        assert!(device.validate().is_err());

        device.app_eui = Some("70B3D57ED0000000".into());
        device.app_key = Some("00112233445566778899AABBCCDDEEFF".into());
        assert!(device.validate().is_ok());

        device.use_otaa = false;
        assert!(device.validate().is_err());

        device.app_s_key = Some("00".into());
        device.nwk_s_key = Some("00".into());
        device.dev_addr = Some("0011AABB".into());
        assert!(device.validate().is_ok());
    }

    #[test]
    fn test_lora_device_id_is_eui() {
        let mut device = lora("not-an-eui");
        device.app_eui = Some("70B3D57ED0000000".into());
        device.app_key = Some("00".into());

        assert!(matches!(
            device.validate(),
            Err(DeviceError::InvalidDeviceId(_))
        ));
    }
}
