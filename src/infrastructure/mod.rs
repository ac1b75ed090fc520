//! Infrastructure layer - Port implementations
//!
//! Concrete implementations of the domain ports on top of the ESP32 radio,
//! flash and RMT peripherals, plus the background tasks that drive them.

pub mod drivers;
pub mod services;
pub mod tasks;
