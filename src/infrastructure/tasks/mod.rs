pub(crate) mod network;
pub(crate) mod ota;
pub(crate) mod portal;

pub use network::{network_runner_task, wifi_keepalive_task};
pub use ota::ota_listener_task;
pub use portal::{captive_dns_task, dhcp_server_task, portal_http_task};
