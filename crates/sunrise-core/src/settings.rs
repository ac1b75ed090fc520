//! Persisted device records and their JSON codec

use serde::{Deserialize, Serialize};

use crate::text::BoundedText;

/// Maximum length in bytes of the `location` and `apikey` fields
pub const SETTING_TEXT_CAPACITY: usize = 49;
/// 802.11 SSIDs are at most 32 octets
pub const SSID_CAPACITY: usize = 32;
/// WPA2 passphrases are at most 64 characters
pub const PASSWORD_CAPACITY: usize = 64;

/// Scratch space used to unescape JSON strings while decoding
const UNESCAPE_BUFFER_SIZE: usize = 128;

pub type SettingText = BoundedText<SETTING_TEXT_CAPACITY>;
pub type Ssid = BoundedText<SSID_CAPACITY>;
pub type Password = BoundedText<PASSWORD_CAPACITY>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsError {
    /// Output buffer too small for the encoded record
    Encode,
    /// Payload is not a valid record
    Decode,
}

/// User supplied settings entered through the portal.
///
/// Encoded as `{"location": "...", "apikey": "..."}`. Missing keys decode to
/// empty fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSettings {
    #[serde(default)]
    pub location: SettingText,
    #[serde(default, rename = "apikey")]
    pub api_key: SettingText,
}

impl DeviceSettings {
    pub fn new(location: &str, api_key: &str) -> Self {
        Self {
            location: SettingText::truncating(location),
            api_key: SettingText::truncating(api_key),
        }
    }
}

/// Credentials of the network to join in station mode
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiCredentials {
    #[serde(default)]
    pub ssid: Ssid,
    #[serde(default)]
    pub password: Password,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Self {
        Self {
            ssid: Ssid::truncating(ssid),
            password: Password::truncating(password),
        }
    }

    /// Credentials without an SSID cannot be used to join anything.
    pub fn is_configured(&self) -> bool {
        !self.ssid.is_empty()
    }
}

/// A record that can be stored as a JSON payload
pub trait JsonRecord: Sized {
    /// Write the record into `buffer`, returning the written length.
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, SettingsError>;

    /// Decode a record from `payload`.
    fn decode(payload: &[u8]) -> Result<Self, SettingsError>;
}

impl<T> JsonRecord for T
where
    T: Serialize + for<'de> Deserialize<'de>,
{
    fn encode(&self, buffer: &mut [u8]) -> Result<usize, SettingsError> {
        serde_json_core::to_slice(self, buffer).map_err(|_| SettingsError::Encode)
    }

    fn decode(payload: &[u8]) -> Result<Self, SettingsError> {
        let mut scratch = [0u8; UNESCAPE_BUFFER_SIZE];
        serde_json_core::from_slice_escaped(payload, &mut scratch)
            .map(|(record, _)| record)
            .map_err(|_| SettingsError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_wire_key_names() {
        let settings = DeviceSettings::new("NYC", "abc123");
        let mut buffer = [0u8; 64];
        let len = settings.encode(&mut buffer).unwrap();
        assert_eq!(&buffer[..len], br#"{"location":"NYC","apikey":"abc123"}"#);
    }

    #[test]
    fn missing_and_null_fields_decode_empty() {
        let settings = DeviceSettings::decode(br#"{"location":"Oslo"}"#).unwrap();
        assert_eq!(settings.location, "Oslo");
        assert!(settings.api_key.is_empty());

        let settings = DeviceSettings::decode(br#"{"location":null,"apikey":"k"}"#).unwrap();
        assert!(settings.location.is_empty());
        assert_eq!(settings.api_key, "k");
    }

    #[test]
    fn credentials_without_ssid_are_not_configured() {
        assert!(!WifiCredentials::default().is_configured());
        assert!(WifiCredentials::new("home", "").is_configured());
    }
}
