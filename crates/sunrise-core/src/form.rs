//! `application/x-www-form-urlencoded` decoding and HTML escaping for the
//! provisioning page.

use core::fmt;

use heapless::Vec;

use crate::net::http::HttpMethod;
use crate::settings::{DeviceSettings, Ssid, WifiCredentials};
use crate::text::BoundedText;

/// Form field names of the provisioning page
pub const FIELD_SSID: &str = "s";
pub const FIELD_PASSWORD: &str = "p";
pub const FIELD_LOCATION: &str = "location";
pub const FIELD_API_KEY: &str = "apikey";

pub const PAGE_PATH: &str = "/";
pub const SAVE_PATH: &str = "/save";

/// Upper bound on the decoded size of a single field
const MAX_DECODED_LEN: usize = 256;

/// Find `key` in an urlencoded body and decode its value.
///
/// Values are truncated to `N` bytes on a character boundary. Returns `None`
/// when the key is absent.
pub fn form_value<const N: usize>(body: &str, key: &str) -> Option<BoundedText<N>> {
    body.split('&')
        .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| decode_component(value))
}

/// Network credentials from a submitted page; `None` without an SSID.
pub fn credentials_from_form(body: &str) -> Option<WifiCredentials> {
    let ssid: Ssid = form_value(body, FIELD_SSID)?;
    if ssid.is_empty() {
        return None;
    }
    Some(WifiCredentials {
        ssid,
        password: form_value(body, FIELD_PASSWORD).unwrap_or_default(),
    })
}

/// Device settings from a submitted page, absent fields left empty.
pub fn settings_from_form(body: &str) -> DeviceSettings {
    DeviceSettings {
        location: form_value(body, FIELD_LOCATION).unwrap_or_default(),
        api_key: form_value(body, FIELD_API_KEY).unwrap_or_default(),
    }
}

/// What the provisioning server does with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalRoute {
    /// Serve the settings page
    Page,
    /// Accept a form submission
    Save,
    /// Send the client to the page; covers connectivity checks
    Redirect,
    NotFound,
    MethodNotAllowed,
}

impl PortalRoute {
    pub fn resolve(method: HttpMethod, path: &str) -> Self {
        match (method, path) {
            (HttpMethod::Get, PAGE_PATH) => Self::Page,
            (HttpMethod::Post, SAVE_PATH) => Self::Save,
            (HttpMethod::Get, _) => Self::Redirect,
            (HttpMethod::Post, _) => Self::NotFound,
            _ => Self::MethodNotAllowed,
        }
    }
}

/// Percent-decode one component, `+` meaning space.
fn decode_component<const N: usize>(raw: &str) -> BoundedText<N> {
    let mut decoded: Vec<u8, MAX_DECODED_LEN> = Vec::new();
    let bytes = raw.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        let byte = match bytes[i] {
            b'+' => b' ',
            b'%' if i + 2 < bytes.len() => {
                match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    (Some(hi), Some(lo)) => {
                        i += 2;
                        (hi << 4) | lo
                    }
                    _ => b'%',
                }
            }
            other => other,
        };
        if decoded.push(byte).is_err() {
            break;
        }
        i += 1;
    }

    let text = match core::str::from_utf8(&decoded) {
        Ok(text) => text,
        // Keep the valid prefix of a cut or malformed sequence.
        Err(err) => core::str::from_utf8(&decoded[..err.valid_up_to()]).unwrap_or_default(),
    };
    BoundedText::truncating(text)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

/// Displays text with the HTML special characters escaped.
pub struct HtmlEscaped<'a>(pub &'a str);

impl fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            let entity = match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&#39;",
            };
            f.write_str(entity)?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}
