//! Integration tests for portal form decoding and HTML escaping.

use sunrise_core::form::{HtmlEscaped, credentials_from_form, form_value, settings_from_form};
use sunrise_core::settings::SettingText;
use sunrise_core::text::BoundedText;

const BODY: &str = "ssid=Home+Net&password=p%40ss%26word&location=S%C3%A3o+Paulo&apikey=";

#[test]
fn decodes_plus_and_percent_escapes() {
    let ssid: BoundedText<32> = form_value(BODY, "ssid").unwrap();
    assert_eq!(ssid, "Home Net");

    let password: BoundedText<64> = form_value(BODY, "password").unwrap();
    assert_eq!(password, "p@ss&word");

    let location: SettingText = form_value(BODY, "location").unwrap();
    assert_eq!(location, "São Paulo");
}

#[test]
fn empty_and_missing_fields() {
    let api_key: SettingText = form_value(BODY, "apikey").unwrap();
    assert!(api_key.is_empty());
    assert!(form_value::<8>(BODY, "missing").is_none());
    assert!(form_value::<8>("flag", "flag").unwrap().is_empty());
}

#[test]
fn malformed_escapes_are_kept_literally() {
    let value: BoundedText<16> = form_value("v=100%25+%zz%4", "v").unwrap();
    assert_eq!(value, "100% %zz%4");
}

#[test]
fn decoded_values_are_truncated_to_capacity() {
    let body = format!("location={}", "a".repeat(80));
    let location: SettingText = form_value(&body, "location").unwrap();
    assert_eq!(location.len(), 49);
}

#[test]
fn html_escaping() {
    let escaped = format!("{}", HtmlEscaped(r#"<a href="x">Tom & Jerry's</a>"#));
    assert_eq!(
        escaped,
        "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
    assert_eq!(format!("{}", HtmlEscaped("plain")), "plain");
}

// -----------------------------------------------------------------------------
// Provisioning page
// -----------------------------------------------------------------------------

#[test]
fn portal_submission_fields() {
    let body = "s=Home+Net&p=secret&location=Sydney%2C+AU&apikey=abc123";

    let credentials = credentials_from_form(body).unwrap();
    assert_eq!(credentials.ssid, "Home Net");
    assert_eq!(credentials.password, "secret");

    let settings = settings_from_form(body);
    assert_eq!(settings.location, "Sydney, AU");
    assert_eq!(settings.api_key, "abc123");
}

#[test]
fn portal_submission_without_ssid_is_rejected() {
    assert!(credentials_from_form("s=&p=secret").is_none());
    assert!(credentials_from_form("p=secret").is_none());
}

#[test]
fn open_network_and_missing_settings() {
    let credentials = credentials_from_form("s=cafe").unwrap();
    assert!(credentials.password.is_empty());
    assert!(credentials.is_configured());

    let settings = settings_from_form("s=cafe");
    assert!(settings.location.is_empty());
    assert!(settings.api_key.is_empty());
}
