//! Minimal SNTP client packets (RFC 4330)
//!
//! Only the transmit timestamp of the reply is used; no round-trip delay
//! compensation or clock discipline.

use embassy_time::{Duration, with_timeout};

pub const NTP_PORT: u16 = 123;
pub const NTP_PACKET_SIZE: usize = 48;

/// Seconds between 1900-01-01 (NTP era 0) and 1970-01-01
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// LI = 0, VN = 3, Mode = 3 (client)
const CLIENT_REQUEST_HEADER: u8 = 0x1B;
const MODE_MASK: u8 = 0x07;
const MODE_SERVER: u8 = 4;
const TRANSMIT_TIMESTAMP_OFFSET: usize = 40;
/// Room for replies carrying extension fields
pub const REPLY_BUFFER_SIZE: usize = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NtpError {
    /// Reply shorter than a full NTP header
    TooShort(usize),
    /// Reply is not in server mode
    UnexpectedMode(u8),
    /// Stratum 0, the server refuses service
    KissOfDeath,
    /// Server did not fill in its transmit timestamp
    MissingTimestamp,
    /// Timestamp predates the Unix epoch
    BeforeUnixEpoch,
}

/// Build a client request packet
pub fn request() -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = CLIENT_REQUEST_HEADER;
    packet
}

/// Validated server reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpReply {
    pub stratum: u8,
    /// Seconds since the Unix epoch, UTC
    pub unix_secs: u64,
    /// Fraction of a second in units of 2^-32 s
    pub fraction: u32,
}

/// Validate a server reply and extract its transmit timestamp.
pub fn parse_reply(packet: &[u8]) -> Result<NtpReply, NtpError> {
    if packet.len() < NTP_PACKET_SIZE {
        return Err(NtpError::TooShort(packet.len()));
    }

    let mode = packet[0] & MODE_MASK;
    if mode != MODE_SERVER {
        return Err(NtpError::UnexpectedMode(mode));
    }

    let stratum = packet[1];
    if stratum == 0 {
        return Err(NtpError::KissOfDeath);
    }

    let ts = &packet[TRANSMIT_TIMESTAMP_OFFSET..NTP_PACKET_SIZE];
    let seconds = u32::from_be_bytes([ts[0], ts[1], ts[2], ts[3]]);
    let fraction = u32::from_be_bytes([ts[4], ts[5], ts[6], ts[7]]);
    if seconds == 0 && fraction == 0 {
        return Err(NtpError::MissingTimestamp);
    }

    let unix_secs = u64::from(seconds)
        .checked_sub(NTP_UNIX_OFFSET)
        .ok_or(NtpError::BeforeUnixEpoch)?;

    Ok(NtpReply {
        stratum,
        unix_secs,
        fraction,
    })
}

/// Network side of an SNTP query
#[allow(async_fn_in_trait)]
pub trait NtpTransport {
    type Server: Copy;
    type Error;

    async fn resolve(&mut self, host: &str) -> Result<Self::Server, Self::Error>;

    /// Send `request` to `server` and receive one datagram into `reply`
    async fn exchange(
        &mut self,
        server: Self::Server,
        request: &[u8],
        reply: &mut [u8],
    ) -> Result<usize, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryError<E> {
    /// The lookup and the exchange together took longer than allowed
    Timeout,
    Transport(E),
    Reply(NtpError),
}

/// Ask `host` for the time. `timeout` bounds the whole query, name lookup
/// included.
pub async fn query<T: NtpTransport>(
    transport: &mut T,
    host: &str,
    timeout: Duration,
) -> Result<NtpReply, QueryError<T::Error>> {
    let exchange = async {
        let server = transport.resolve(host).await.map_err(QueryError::Transport)?;
        let mut packet = [0u8; REPLY_BUFFER_SIZE];
        let len = transport
            .exchange(server, &request(), &mut packet)
            .await
            .map_err(QueryError::Transport)?;
        parse_reply(&packet[..len.min(REPLY_BUFFER_SIZE)]).map_err(QueryError::Reply)
    };
    with_timeout(timeout, exchange)
        .await
        .map_err(|_| QueryError::Timeout)?
}
