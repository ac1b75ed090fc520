use embassy_net::udp::{PacketMetadata, UdpSocket};
use embassy_net::{IpAddress, Stack};
use embassy_time::Duration;
use log::debug;
use sunrise_core::ntp::{
    self,
    NTP_PACKET_SIZE,
    NTP_PORT,
    NtpTransport,
    QueryError,
    REPLY_BUFFER_SIZE,
};

use crate::domain::ports::{TimeError, TimeSource};
use crate::infrastructure::drivers::resolve_host;

/// SNTP client querying one server per request
pub struct SntpTimeSource {
    stack: Stack<'static>,
    host: &'static str,
    response_timeout: Duration,
}

impl SntpTimeSource {
    pub fn new(stack: Stack<'static>, host: &'static str, response_timeout: Duration) -> Self {
        Self {
            stack,
            host,
            response_timeout,
        }
    }
}

impl TimeSource for SntpTimeSource {
    async fn fetch_unix_time(&mut self) -> Result<u64, TimeError> {
        let host = self.host;
        let timeout = self.response_timeout;
        let reply = ntp::query(self, host, timeout).await.map_err(|e| match e {
            QueryError::Timeout => TimeError::Timeout,
            QueryError::Transport(e) => e,
            QueryError::Reply(e) => TimeError::Reply(e),
        })?;
        debug!("time: stratum {} reply from {}", reply.stratum, host);
        Ok(reply.unix_secs)
    }
}

impl NtpTransport for SntpTimeSource {
    type Server = IpAddress;
    type Error = TimeError;

    async fn resolve(&mut self, host: &str) -> Result<IpAddress, TimeError> {
        resolve_host(self.stack, host).await.ok_or(TimeError::Dns)
    }

    async fn exchange(
        &mut self,
        server: IpAddress,
        request: &[u8],
        reply: &mut [u8],
    ) -> Result<usize, TimeError> {
        let mut rx_meta = [PacketMetadata::EMPTY; 2];
        let mut rx_buffer = [0u8; REPLY_BUFFER_SIZE];
        let mut tx_meta = [PacketMetadata::EMPTY; 2];
        let mut tx_buffer = [0u8; NTP_PACKET_SIZE];
        let mut socket = UdpSocket::new(
            self.stack,
            &mut rx_meta,
            &mut rx_buffer,
            &mut tx_meta,
            &mut tx_buffer,
        );
        socket.bind(0).map_err(|_| TimeError::Socket)?;

        socket
            .send_to(request, (server, NTP_PORT))
            .await
            .map_err(|_| TimeError::Socket)?;
        let (len, _) = socket
            .recv_from(reply)
            .await
            .map_err(|_| TimeError::Socket)?;
        Ok(len)
    }
}
