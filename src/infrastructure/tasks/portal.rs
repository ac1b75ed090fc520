//! Network services of the setup access point
//!
//! DHCP hands out addresses, DNS points every name at the access point and
//! HTTP serves the setup page.

use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{Ipv4Address, Stack};
use log::{debug, info, warn};
use sunrise_core::net::dhcp::{self, DhcpRequest};
use sunrise_core::net::dns;

use crate::controllers::PortalHttpController;
use crate::core::net::http::HttpServer;

const DHCP_SERVER_PORT: u16 = 67;
const DHCP_CLIENT_PORT: u16 = 68;
const DNS_PORT: u16 = 53;
const HTTP_PORT: u16 = 80;

/// DHCP server task
///
/// Answers DISCOVER with OFFER and REQUEST with ACK. Addresses are derived
/// from the client MAC, so no lease table is kept.
#[embassy_executor::task]
pub async fn dhcp_server_task(stack: Stack<'static>, server: Ipv4Address) {
    let mut rx_meta = [PacketMetadata::EMPTY; 8];
    let mut rx_buffer = [0u8; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 8];
    let mut tx_buffer = [0u8; 1024];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(DHCP_SERVER_PORT) {
        warn!("dhcp: failed to bind port {}: {:?}", DHCP_SERVER_PORT, e);
        return;
    }
    info!("dhcp: serving on port {}", DHCP_SERVER_PORT);

    let server_octets = server.octets();
    let mut packet = [0u8; 576];
    let mut reply = [0u8; dhcp::REPLY_SIZE];

    loop {
        let len = match socket.recv_from(&mut packet).await {
            Ok((len, _)) => len,
            Err(e) => {
                warn!("dhcp: recv error: {:?}", e);
                continue;
            }
        };

        let Some(request) = DhcpRequest::parse(&packet[..len]) else {
            debug!("dhcp: ignoring invalid packet");
            continue;
        };
        let Some(reply_type) = request.message_type.reply() else {
            continue;
        };

        debug!(
            "dhcp: {:?} from {:02X?} -> {}",
            request.message_type,
            request.client_mac,
            Ipv4Address::from(dhcp::lease_address(server_octets, &request.client_mac))
        );
        let reply_len = dhcp::build_reply(server_octets, &request, reply_type, &mut reply);
        if let Err(e) = socket
            .send_to(&reply[..reply_len], (Ipv4Address::BROADCAST, DHCP_CLIENT_PORT))
            .await
        {
            warn!("dhcp: send error: {:?}", e);
        }
    }
}

/// DNS task resolving every name to the access point
#[embassy_executor::task]
pub async fn captive_dns_task(stack: Stack<'static>, address: Ipv4Address) {
    let mut rx_meta = [PacketMetadata::EMPTY; 4];
    let mut rx_buffer = [0u8; 1024];
    let mut tx_meta = [PacketMetadata::EMPTY; 4];
    let mut tx_buffer = [0u8; 1024];

    let mut socket = UdpSocket::new(
        stack,
        &mut rx_meta,
        &mut rx_buffer,
        &mut tx_meta,
        &mut tx_buffer,
    );

    if let Err(e) = socket.bind(DNS_PORT) {
        warn!("dns: failed to bind port {}: {:?}", DNS_PORT, e);
        return;
    }

    let address = address.octets();
    let mut query = [0u8; dns::MAX_PACKET_SIZE];
    let mut response = [0u8; dns::MAX_PACKET_SIZE];

    loop {
        let (len, meta) = match socket.recv_from(&mut query).await {
            Ok(received) => received,
            Err(e) => {
                debug!("dns: recv error: {:?}", e);
                continue;
            }
        };

        let Some(response_len) = dns::build_answer(&query[..len], address, &mut response) else {
            continue;
        };
        if let Err(e) = socket.send_to(&response[..response_len], meta.endpoint).await {
            debug!("dns: send error: {:?}", e);
        }
    }
}

/// HTTP task serving the setup page
#[embassy_executor::task]
pub async fn portal_http_task(stack: Stack<'static>) {
    let mut rx_buffer = [0u8; 2048];
    let mut tx_buffer = [0u8; 2048];

    info!("portal: serving on port {}", HTTP_PORT);
    HttpServer::new(&PortalHttpController)
        .listen_and_serve(stack, HTTP_PORT, &mut rx_buffer, &mut tx_buffer)
        .await;
}
