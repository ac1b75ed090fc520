use sunrise_core::ntp::NtpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeError {
    /// The server name did not resolve
    Dns,
    Socket,
    /// No reply within the response timeout
    Timeout,
    Reply(NtpError),
}

/// Source of network time
#[allow(async_fn_in_trait)]
pub trait TimeSource {
    /// Fetch the current UNIX time in seconds
    async fn fetch_unix_time(&mut self) -> Result<u64, TimeError>;
}
