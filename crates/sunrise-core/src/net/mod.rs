//! Wire formats served on the setup access point
//!
//! DHCP and DNS packets plus HTTP request heads, parsed and built over byte
//! slices so the firmware only moves buffers between sockets and these
//! functions.

pub mod dhcp;
pub mod dns;
pub mod http;

/// IPv4 address as its four octets
pub type Ipv4Octets = [u8; 4];
