//! Integration tests for SNTP packets and the wall clock.

use embassy_futures::block_on;
use embassy_time::{Duration, Instant};
use sunrise_core::WallClock;
use sunrise_core::ntp::{
    self,
    NTP_PACKET_SIZE,
    NTP_UNIX_OFFSET,
    NtpError,
    NtpTransport,
    QueryError,
};

/// 2024-01-01T00:00:00Z
const NEW_YEAR_2024: u64 = 1_704_067_200;

fn server_reply(ntp_secs: u32, fraction: u32) -> [u8; NTP_PACKET_SIZE] {
    let mut packet = [0u8; NTP_PACKET_SIZE];
    packet[0] = 0x24; // LI = 0, VN = 4, Mode = 4
    packet[1] = 2;
    packet[40..44].copy_from_slice(&ntp_secs.to_be_bytes());
    packet[44..48].copy_from_slice(&fraction.to_be_bytes());
    packet
}

fn ntp_seconds(unix: u64) -> u32 {
    u32::try_from(unix + NTP_UNIX_OFFSET).unwrap()
}

// -----------------------------------------------------------------------------
// SNTP packets
// -----------------------------------------------------------------------------

#[test]
fn request_is_a_client_packet() {
    let packet = ntp::request();
    assert_eq!(packet.len(), 48);
    assert_eq!(packet[0], 0x1B);
    assert!(packet[1..].iter().all(|b| *b == 0));
}

#[test]
fn reply_is_converted_to_unix_time() {
    let reply = ntp::parse_reply(&server_reply(ntp_seconds(NEW_YEAR_2024), 0x8000_0000)).unwrap();
    assert_eq!(reply.unix_secs, NEW_YEAR_2024);
    assert_eq!(reply.fraction, 0x8000_0000);
    assert_eq!(reply.stratum, 2);
}

#[test]
fn short_reply_is_rejected() {
    let packet = server_reply(ntp_seconds(NEW_YEAR_2024), 0);
    assert_eq!(ntp::parse_reply(&packet[..47]), Err(NtpError::TooShort(47)));
}

#[test]
fn client_mode_reply_is_rejected() {
    let mut packet = server_reply(ntp_seconds(NEW_YEAR_2024), 0);
    packet[0] = 0x1B;
    assert_eq!(ntp::parse_reply(&packet), Err(NtpError::UnexpectedMode(3)));
}

#[test]
fn kiss_of_death_is_rejected() {
    let mut packet = server_reply(ntp_seconds(NEW_YEAR_2024), 0);
    packet[1] = 0;
    assert_eq!(ntp::parse_reply(&packet), Err(NtpError::KissOfDeath));
}

#[test]
fn zero_transmit_timestamp_is_rejected() {
    assert_eq!(
        ntp::parse_reply(&server_reply(0, 0)),
        Err(NtpError::MissingTimestamp)
    );
}

#[test]
fn timestamp_before_unix_epoch_is_rejected() {
    assert_eq!(
        ntp::parse_reply(&server_reply(1_000, 0)),
        Err(NtpError::BeforeUnixEpoch)
    );
}

#[test]
fn longer_reply_with_extension_is_accepted() {
    let mut packet = [0u8; 68];
    packet[..NTP_PACKET_SIZE].copy_from_slice(&server_reply(ntp_seconds(NEW_YEAR_2024), 0));
    assert_eq!(ntp::parse_reply(&packet).unwrap().unix_secs, NEW_YEAR_2024);
}

// -----------------------------------------------------------------------------
// Queries
// -----------------------------------------------------------------------------

const QUERY_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stall {
    None,
    Lookup,
    Exchange,
}

/// Transport answering with a canned reply, optionally never finishing one step
struct ScriptedTransport {
    reply: [u8; NTP_PACKET_SIZE],
    stall: Stall,
    resolves: bool,
    exchanged: bool,
}

impl ScriptedTransport {
    fn new(stall: Stall) -> Self {
        Self {
            reply: server_reply(ntp_seconds(NEW_YEAR_2024), 0),
            stall,
            resolves: true,
            exchanged: false,
        }
    }
}

impl NtpTransport for ScriptedTransport {
    type Server = [u8; 4];
    type Error = &'static str;

    async fn resolve(&mut self, host: &str) -> Result<Self::Server, Self::Error> {
        assert_eq!(host, "pool.ntp.org");
        if self.stall == Stall::Lookup {
            core::future::pending::<()>().await;
        }
        if self.resolves { Ok([192, 0, 2, 1]) } else { Err("no such host") }
    }

    async fn exchange(
        &mut self,
        server: Self::Server,
        request: &[u8],
        reply: &mut [u8],
    ) -> Result<usize, Self::Error> {
        assert_eq!(server, [192, 0, 2, 1]);
        assert_eq!(request, &ntp::request()[..]);
        self.exchanged = true;
        if self.stall == Stall::Exchange {
            core::future::pending::<()>().await;
        }
        reply[..NTP_PACKET_SIZE].copy_from_slice(&self.reply);
        Ok(NTP_PACKET_SIZE)
    }
}

#[test]
fn query_returns_server_time() {
    let mut transport = ScriptedTransport::new(Stall::None);
    let reply = block_on(ntp::query(&mut transport, "pool.ntp.org", QUERY_TIMEOUT)).unwrap();
    assert_eq!(reply.unix_secs, NEW_YEAR_2024);
    assert_eq!(reply.stratum, 2);
}

#[test]
fn stalled_lookup_counts_against_the_timeout() {
    let mut transport = ScriptedTransport::new(Stall::Lookup);
    let started = std::time::Instant::now();

    let result = block_on(ntp::query(&mut transport, "pool.ntp.org", QUERY_TIMEOUT));

    assert_eq!(result, Err(QueryError::Timeout));
    assert!(!transport.exchanged);
    assert!(started.elapsed() < std::time::Duration::from_secs(5));
}

#[test]
fn stalled_exchange_times_out() {
    let mut transport = ScriptedTransport::new(Stall::Exchange);
    let result = block_on(ntp::query(&mut transport, "pool.ntp.org", QUERY_TIMEOUT));
    assert_eq!(result, Err(QueryError::Timeout));
    assert!(transport.exchanged);
}

#[test]
fn lookup_and_reply_errors_are_reported() {
    let mut transport = ScriptedTransport::new(Stall::None);
    transport.resolves = false;
    let result = block_on(ntp::query(&mut transport, "pool.ntp.org", QUERY_TIMEOUT));
    assert_eq!(result, Err(QueryError::Transport("no such host")));

    let mut transport = ScriptedTransport::new(Stall::None);
    transport.reply[1] = 0;
    let result = block_on(ntp::query(&mut transport, "pool.ntp.org", QUERY_TIMEOUT));
    assert_eq!(result, Err(QueryError::Reply(NtpError::KissOfDeath)));
}

// -----------------------------------------------------------------------------
// Wall clock
// -----------------------------------------------------------------------------

#[test]
fn clock_is_unknown_until_synchronized() {
    let clock = WallClock::new(10 * 3600);
    assert!(!clock.is_synchronized());
    assert_eq!(clock.unix_time(Instant::from_secs(5)), None);
    assert_eq!(clock.local_time(Instant::from_secs(5)), None);
}

#[test]
fn clock_extrapolates_between_syncs() {
    let mut clock = WallClock::new(0);
    clock.synchronize(NEW_YEAR_2024, Instant::from_secs(100));
    assert_eq!(clock.unix_time(Instant::from_secs(100)), Some(NEW_YEAR_2024));
    assert_eq!(clock.unix_time(Instant::from_millis(130_900)), Some(NEW_YEAR_2024 + 30));
}

#[test]
fn local_time_applies_utc_offset() {
    let mut clock = WallClock::new(10 * 3600);
    clock.synchronize(NEW_YEAR_2024, Instant::from_secs(0));
    assert_eq!(clock.local_time(Instant::from_secs(0)), Some(NEW_YEAR_2024 + 36_000));

    let mut west = WallClock::new(-5 * 3600);
    west.synchronize(NEW_YEAR_2024, Instant::from_secs(0));
    assert_eq!(west.local_time(Instant::from_secs(0)), Some(NEW_YEAR_2024 - 18_000));
}

#[test]
fn resync_replaces_previous_sample() {
    let mut clock = WallClock::new(0);
    clock.synchronize(NEW_YEAR_2024, Instant::from_secs(0));
    clock.synchronize(NEW_YEAR_2024 + 1_000, Instant::from_secs(30));
    assert_eq!(clock.unix_time(Instant::from_secs(40)), Some(NEW_YEAR_2024 + 1_010));
}
