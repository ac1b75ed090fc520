#![no_std]

//! Sunrise Lamp core - hardware independent building blocks
//!
//! Layers:
//! - `text` - bounded, truncating strings for persisted fields
//! - `settings` - persisted records and their JSON codec
//! - `storage` - framed records on top of a [`StorageDriver`]
//! - `math8` / `color` - 8-bit colour math and the heat palette
//! - `sunrise` - the sunrise animation stepper
//! - `gate` - the clock refresh throttle and the portal idle deadline
//! - `clock` / `ntp` - wall clock and SNTP packet codec
//! - `form` - urlencoded form decoding, HTML escaping and routing for the portal
//! - `net` - DHCP, DNS and HTTP request heads for the setup access point
//! - `flash` - aligned streaming writes of uploaded images
//! - `ota` - ArduinoOTA (espota) protocol messages and session bookkeeping
//!
//! Nothing here touches hardware, so the whole crate is tested on the host.

pub mod clock;
pub mod color;
pub mod flash;
pub mod form;
pub mod gate;
pub mod math8;
pub mod net;
pub mod ntp;
pub mod ota;
pub mod settings;
pub mod storage;
pub mod sunrise;
#[cfg(feature = "test-utils")]
pub mod test_utils;
pub mod text;

pub use clock::WallClock;
pub use color::{HEAT_COLORS, Palette16, Rgb, color_from_palette, fill_solid};
pub use gate::{IdleWatch, RefreshGate};
pub use settings::{DeviceSettings, SettingText, WifiCredentials};
pub use storage::{RecordStorage, StorageDriver, StorageError};
pub use sunrise::{SunriseStepper, step_interval};
pub use text::BoundedText;
