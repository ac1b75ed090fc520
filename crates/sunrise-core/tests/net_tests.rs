//! Integration tests for the setup access point's DNS, DHCP and routing.

use sunrise_core::form::PortalRoute;
use sunrise_core::net::dhcp::{
    DhcpRequest,
    MessageType,
    OPTIONS_OFFSET,
    REPLY_SIZE,
    build_reply,
    find_option,
    lease_address,
};
use sunrise_core::net::dns::{MAX_PACKET_SIZE, build_answer};
use sunrise_core::net::http::HttpMethod;

const SERVER: [u8; 4] = [192, 168, 4, 1];
const CLIENT_MAC: [u8; 6] = [0x02, 0x11, 0x22, 0x33, 0x44, 0x65];

// -----------------------------------------------------------------------------
// DNS
// -----------------------------------------------------------------------------

/// Standard query for `name` with recursion desired
fn dns_query(name: &[&str], qtype: u16) -> Vec<u8> {
    let mut query = vec![0xAB, 0xCD, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
    for label in name {
        query.push(label.len() as u8);
        query.extend_from_slice(label.as_bytes());
    }
    query.push(0);
    query.extend_from_slice(&qtype.to_be_bytes());
    query.extend_from_slice(&1u16.to_be_bytes());
    query
}

#[test]
fn a_query_is_answered_with_the_access_point() {
    let query = dns_query(&["connectivitycheck", "gstatic", "com"], 1);
    let mut response = [0u8; MAX_PACKET_SIZE];
    let len = build_answer(&query, SERVER, &mut response).unwrap();

    assert_eq!(len, query.len() + 16);
    // id, QR|RD|RA, one question, one answer
    assert_eq!(&response[..8], &[0xAB, 0xCD, 0x81, 0x80, 0, 1, 0, 1]);
    assert_eq!(&response[8..12], &[0, 0, 0, 0]);
    assert_eq!(&response[12..query.len()], &query[12..]);

    let answer = &response[query.len()..len];
    assert_eq!(&answer[..2], &[0xC0, 0x0C]);
    assert_eq!(&answer[2..6], &[0, 1, 0, 1]);
    assert_eq!(&answer[6..10], &60u32.to_be_bytes());
    assert_eq!(&answer[10..12], &[0, 4]);
    assert_eq!(&answer[12..16], &SERVER);
}

#[test]
fn other_query_types_get_no_answer() {
    let query = dns_query(&["example", "com"], 28);
    let mut response = [0u8; MAX_PACKET_SIZE];
    let len = build_answer(&query, SERVER, &mut response).unwrap();

    assert_eq!(len, query.len());
    assert_eq!(&response[6..8], &[0, 0]);
}

#[test]
fn responses_and_truncated_queries_are_ignored() {
    let mut response = [0u8; MAX_PACKET_SIZE];

    let mut reply = dns_query(&["example", "com"], 1);
    reply[2] |= 0x80;
    assert!(build_answer(&reply, SERVER, &mut response).is_none());

    let query = dns_query(&["example", "com"], 1);
    assert!(build_answer(&query[..query.len() - 2], SERVER, &mut response).is_none());
    assert!(build_answer(&query[..8], SERVER, &mut response).is_none());
}

// -----------------------------------------------------------------------------
// DHCP
// -----------------------------------------------------------------------------

fn dhcp_packet(message_type: u8) -> Vec<u8> {
    let mut packet = vec![0u8; OPTIONS_OFFSET];
    packet[0] = 1;
    packet[1] = 1;
    packet[2] = 6;
    packet[4..8].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
    packet[28..34].copy_from_slice(&CLIENT_MAC);
    packet[236..240].copy_from_slice(&[99, 130, 83, 99]);
    packet.extend_from_slice(&[53, 1, message_type, 0, 55, 2, 1, 3, 255]);
    packet
}

fn reply_to(message_type: u8) -> ([u8; REPLY_SIZE], usize, MessageType) {
    let request = DhcpRequest::parse(&dhcp_packet(message_type)).unwrap();
    let reply_type = request.message_type.reply().unwrap();
    let mut reply = [0u8; REPLY_SIZE];
    let len = build_reply(SERVER, &request, reply_type, &mut reply);
    (reply, len, reply_type)
}

#[test]
fn discover_gets_an_offer() {
    let (reply, len, reply_type) = reply_to(1);
    assert_eq!(reply_type, MessageType::Offer);

    assert_eq!(reply[0], 2);
    assert_eq!(&reply[4..8], &[0xDE, 0xAD, 0xBE, 0xEF]);
    assert_eq!(reply[10], 0x80);
    assert_eq!(&reply[16..20], &[192, 168, 4, 2 + 0x65 % 48]);
    assert_eq!(&reply[20..24], &SERVER);
    assert_eq!(&reply[28..34], &CLIENT_MAC);
    assert_eq!(reply[len - 1], 255);

    let options = &reply[OPTIONS_OFFSET..len];
    assert_eq!(find_option(options, 53), Some(&[2u8][..]));
    assert_eq!(find_option(options, 54), Some(&SERVER[..]));
    assert_eq!(find_option(options, 51), Some(&7200u32.to_be_bytes()[..]));
    assert_eq!(find_option(options, 1), Some(&[255u8, 255, 255, 0][..]));
    assert_eq!(find_option(options, 3), Some(&SERVER[..]));
    assert_eq!(find_option(options, 6), Some(&SERVER[..]));
}

#[test]
fn request_gets_an_ack_for_the_same_address() {
    let (offer, _, _) = reply_to(1);
    let (ack, len, reply_type) = reply_to(3);

    assert_eq!(reply_type, MessageType::Ack);
    assert_eq!(find_option(&ack[OPTIONS_OFFSET..len], 53), Some(&[5u8][..]));
    assert_eq!(&ack[16..20], &offer[16..20]);
}

#[test]
fn leases_stay_inside_the_pool() {
    for last in [0u8, 47, 48, 255] {
        let mut mac = CLIENT_MAC;
        mac[5] = last;
        let [a, b, c, host] = lease_address(SERVER, &mac);
        assert_eq!([a, b, c], [192, 168, 4]);
        assert!((2..50).contains(&host));
    }
}

#[test]
fn invalid_packets_are_ignored() {
    let mut no_cookie = dhcp_packet(1);
    no_cookie[236] = 0;
    assert!(DhcpRequest::parse(&no_cookie).is_none());

    let mut reply = dhcp_packet(1);
    reply[0] = 2;
    assert!(DhcpRequest::parse(&reply).is_none());

    assert!(DhcpRequest::parse(&dhcp_packet(7)).is_none());
    assert!(DhcpRequest::parse(&[1u8; 100]).is_none());
}

#[test]
fn truncated_option_is_not_found() {
    assert_eq!(find_option(&[0, 0, 53, 4, 1], 53), None);
    assert_eq!(find_option(&[12, 1, b'x', 255, 53, 1, 1], 53), None);
}

// -----------------------------------------------------------------------------
// Routing
// -----------------------------------------------------------------------------

#[test]
fn portal_routes() {
    assert_eq!(PortalRoute::resolve(HttpMethod::Get, "/"), PortalRoute::Page);
    assert_eq!(PortalRoute::resolve(HttpMethod::Post, "/save"), PortalRoute::Save);
    assert_eq!(
        PortalRoute::resolve(HttpMethod::Get, "/generate_204"),
        PortalRoute::Redirect
    );
    assert_eq!(
        PortalRoute::resolve(HttpMethod::Get, "/hotspot-detect.html"),
        PortalRoute::Redirect
    );
    assert_eq!(PortalRoute::resolve(HttpMethod::Post, "/"), PortalRoute::NotFound);
    assert_eq!(
        PortalRoute::resolve(HttpMethod::Put, "/save"),
        PortalRoute::MethodNotAllowed
    );
}
