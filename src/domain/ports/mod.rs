pub mod configuration;
pub mod light;
pub mod network;
pub mod time;

pub use configuration::*;
pub use light::*;
pub use network::*;
pub use time::*;
