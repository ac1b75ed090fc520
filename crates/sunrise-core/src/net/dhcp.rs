//! DHCP for the setup access point
//!
//! Stateless: a client always receives the same address, derived from its
//! MAC inside the access point's /24. Every DISCOVER gets an OFFER and every
//! REQUEST an ACK; the router and DNS options point at the access point so
//! connectivity checks land on the portal.

use super::Ipv4Octets;

const BOOTREQUEST: u8 = 1;
const BOOTREPLY: u8 = 2;
const HTYPE_ETHERNET: u8 = 1;
const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

/// BOOTP header plus the magic cookie
pub const OPTIONS_OFFSET: usize = 240;

const OPTION_PAD: u8 = 0;
const OPTION_SUBNET_MASK: u8 = 1;
const OPTION_ROUTER: u8 = 3;
const OPTION_DNS: u8 = 6;
const OPTION_LEASE_TIME: u8 = 51;
const OPTION_MESSAGE_TYPE: u8 = 53;
const OPTION_SERVER_ID: u8 = 54;
const OPTION_END: u8 = 255;

const LEASE_TIME_SECS: u32 = 2 * 60 * 60;
const SUBNET_MASK: Ipv4Octets = [255, 255, 255, 0];

/// First and count of host numbers handed out
const POOL_START: u8 = 2;
const POOL_SIZE: u8 = 48;

/// Large enough for the header and the options written by [`build_reply`]
pub const REPLY_SIZE: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Discover,
    Offer,
    Request,
    Ack,
}

impl MessageType {
    fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            5 => Some(Self::Ack),
            _ => None,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Discover => 1,
            Self::Offer => 2,
            Self::Request => 3,
            Self::Ack => 5,
        }
    }

    /// Reply to send for a client message, if any
    pub fn reply(self) -> Option<Self> {
        match self {
            Self::Discover => Some(Self::Offer),
            Self::Request => Some(Self::Ack),
            Self::Offer | Self::Ack => None,
        }
    }
}

/// Client message fields the server needs
#[derive(Debug)]
pub struct DhcpRequest {
    pub xid: [u8; 4],
    pub client_mac: [u8; 6],
    pub message_type: MessageType,
}

impl DhcpRequest {
    /// Parse a client BOOTREQUEST
    pub fn parse(packet: &[u8]) -> Option<Self> {
        if packet.len() < OPTIONS_OFFSET
            || packet[0] != BOOTREQUEST
            || packet[236..OPTIONS_OFFSET] != MAGIC_COOKIE
        {
            return None;
        }

        let mut xid = [0u8; 4];
        xid.copy_from_slice(&packet[4..8]);
        let mut client_mac = [0u8; 6];
        client_mac.copy_from_slice(&packet[28..34]);

        let message_type = find_option(&packet[OPTIONS_OFFSET..], OPTION_MESSAGE_TYPE)
            .and_then(|data| data.first().copied())
            .and_then(MessageType::from_u8)?;

        Some(Self {
            xid,
            client_mac,
            message_type,
        })
    }
}

/// Address for a client inside the server's /24
pub fn lease_address(server: Ipv4Octets, mac: &[u8; 6]) -> Ipv4Octets {
    let [a, b, c, _] = server;
    [a, b, c, POOL_START + mac[5] % POOL_SIZE]
}

/// Build an OFFER or ACK into `buffer`, returning its length.
pub fn build_reply(
    server: Ipv4Octets,
    request: &DhcpRequest,
    reply_type: MessageType,
    buffer: &mut [u8; REPLY_SIZE],
) -> usize {
    buffer.fill(0);

    buffer[0] = BOOTREPLY;
    buffer[1] = HTYPE_ETHERNET;
    buffer[2] = 6; // MAC length
    buffer[4..8].copy_from_slice(&request.xid);
    // Clients have no address yet, so replies are broadcast.
    buffer[10] = 0x80;
    buffer[16..20].copy_from_slice(&lease_address(server, &request.client_mac));
    buffer[20..24].copy_from_slice(&server);
    buffer[28..34].copy_from_slice(&request.client_mac);
    buffer[236..OPTIONS_OFFSET].copy_from_slice(&MAGIC_COOKIE);

    let mut options = OptionWriter {
        buffer,
        position: OPTIONS_OFFSET,
    };
    options.put(OPTION_MESSAGE_TYPE, &[reply_type.as_u8()]);
    options.put(OPTION_SERVER_ID, &server);
    options.put(OPTION_LEASE_TIME, &LEASE_TIME_SECS.to_be_bytes());
    options.put(OPTION_SUBNET_MASK, &SUBNET_MASK);
    options.put(OPTION_ROUTER, &server);
    options.put(OPTION_DNS, &server);
    options.end()
}

struct OptionWriter<'a> {
    buffer: &'a mut [u8; REPLY_SIZE],
    position: usize,
}

impl OptionWriter<'_> {
    #[allow(clippy::cast_possible_truncation)]
    fn put(&mut self, code: u8, value: &[u8]) {
        let start = self.position;
        self.buffer[start] = code;
        self.buffer[start + 1] = value.len() as u8;
        self.buffer[start + 2..start + 2 + value.len()].copy_from_slice(value);
        self.position = start + 2 + value.len();
    }

    fn end(self) -> usize {
        self.buffer[self.position] = OPTION_END;
        self.position + 1
    }
}

/// Value of option `code` in a DHCP options field
pub fn find_option(mut options: &[u8], code: u8) -> Option<&[u8]> {
    loop {
        match options {
            [] | [OPTION_END, ..] => return None,
            [OPTION_PAD, rest @ ..] => options = rest,
            [current, len, rest @ ..] => {
                let len = usize::from(*len);
                let value = rest.get(..len)?;
                if *current == code {
                    return Some(value);
                }
                options = &rest[len..];
            }
            [_] => return None,
        }
    }
}
