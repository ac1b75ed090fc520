//! ArduinoOTA (espota) protocol
//!
//! The uploader sends a UDP invitation `"<cmd> <port> <size> <md5>\n"` to
//! [`OTA_PORT`]. With a password set the device answers `AUTH <nonce>` and
//! expects `200 <cnonce> <response>` back. The device then connects to the
//! uploader on `<port>` over TCP and receives the raw image, acknowledging
//! every chunk with its length in decimal. `OK` closes a successful session.

use core::fmt::Write;

use heapless::String;
use md5::{Digest, Md5};

/// Standard espota listener port
pub const OTA_PORT: u16 = 3232;

/// Length of an MD5 digest in lowercase hex
pub const DIGEST_HEX_LEN: usize = 32;

/// MD5 digest rendered as lowercase hex
pub type HexDigest = String<DIGEST_HEX_LEN>;

const CMD_FIRMWARE: u32 = 0;
const CMD_FILESYSTEM: u32 = 100;
const CMD_AUTH: u32 = 200;

/// Progress step for logging (every 10%)
pub const PROGRESS_LOG_STEP: u8 = 10;

/// What an upload replaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaCommand {
    /// Application image, written to the next OTA slot
    Firmware,
    /// Data image, written to the filesystem partition
    Filesystem,
}

impl OtaCommand {
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            CMD_FIRMWARE => Some(Self::Firmware),
            CMD_FILESYSTEM => Some(Self::Filesystem),
            _ => None,
        }
    }

    pub fn code(self) -> u32 {
        match self {
            Self::Firmware => CMD_FIRMWARE,
            Self::Filesystem => CMD_FILESYSTEM,
        }
    }

    /// Name reported when an update starts
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Firmware => "sketch",
            Self::Filesystem => "filesystem",
        }
    }
}

/// Error categories reported to the uploader and the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaError {
    Auth,
    Begin,
    Connect,
    Receive,
    End,
}

impl OtaError {
    /// Numeric code as reported by ArduinoOTA uploaders
    pub fn code(self) -> u8 {
        match self {
            Self::Auth => 0,
            Self::Begin => 1,
            Self::Connect => 2,
            Self::Receive => 3,
            Self::End => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "Auth Failed",
            Self::Begin => "Begin Failed",
            Self::Connect => "Connect Failed",
            Self::Receive => "Receive Failed",
            Self::End => "End Failed",
        }
    }
}

/// Phases of an update session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtaEvent {
    Start(OtaCommand),
    Progress { received: u32, total: u32 },
    End,
    Error(OtaError),
}

/// Parsed upload invitation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtaInvitation {
    pub command: OtaCommand,
    /// TCP port the uploader serves the image on
    pub port: u16,
    /// Image size in bytes
    pub size: u32,
    /// Expected MD5 of the image
    pub md5: HexDigest,
}

impl OtaInvitation {
    /// Parse an invitation datagram
    ///
    /// Returns `None` for unknown commands, malformed numbers or a digest
    /// that is not 32 hex characters.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let text = core::str::from_utf8(data).ok()?;
        let line = text.lines().next()?.trim();
        let mut fields = line.split_ascii_whitespace();

        let command = OtaCommand::from_code(fields.next()?.parse().ok()?)?;
        let port = fields.next()?.parse().ok()?;
        let size = fields.next()?.parse().ok()?;
        let md5 = parse_hex_digest(fields.next()?)?;

        Some(Self {
            command,
            port,
            size,
            md5,
        })
    }
}

/// Uploader answer to an `AUTH` challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthReply {
    pub cnonce: HexDigest,
    pub response: HexDigest,
}

impl AuthReply {
    /// Parse `"200 <cnonce> <response>"`
    pub fn parse(data: &[u8]) -> Option<Self> {
        let text = core::str::from_utf8(data).ok()?;
        let mut fields = text.lines().next()?.split_ascii_whitespace();

        let code: u32 = fields.next()?.parse().ok()?;
        if code != CMD_AUTH {
            return None;
        }
        let cnonce = parse_hex_digest(fields.next()?)?;
        let response = parse_hex_digest(fields.next()?)?;

        Some(Self { cnonce, response })
    }
}

fn parse_hex_digest(value: &str) -> Option<HexDigest> {
    if value.len() != DIGEST_HEX_LEN || !value.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut digest = HexDigest::new();
    for c in value.chars() {
        digest.push(c.to_ascii_lowercase()).ok()?;
    }
    Some(digest)
}

/// MD5 over the concatenation of `parts`, as lowercase hex
pub fn md5_hex(parts: &[&[u8]]) -> HexDigest {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    digest_to_hex(&hasher.finalize())
}

fn digest_to_hex(digest: &[u8]) -> HexDigest {
    let mut hex = HexDigest::new();
    for byte in digest {
        // 16 bytes render to exactly DIGEST_HEX_LEN characters.
        write!(hex, "{byte:02x}").ok();
    }
    hex
}

/// Challenge-response check for the shared OTA password
pub struct OtaAuth {
    password_hash: HexDigest,
}

impl OtaAuth {
    pub fn new(password: &str) -> Self {
        Self {
            password_hash: md5_hex(&[password.as_bytes()]),
        }
    }

    /// Derive a challenge nonce from device entropy
    pub fn nonce(seed: &[u8]) -> HexDigest {
        md5_hex(&[seed])
    }

    /// `md5(md5(password) ":" nonce ":" cnonce)`
    pub fn expected_response(&self, nonce: &str, cnonce: &str) -> HexDigest {
        md5_hex(&[
            self.password_hash.as_bytes(),
            b":",
            nonce.as_bytes(),
            b":",
            cnonce.as_bytes(),
        ])
    }

    pub fn verify(&self, nonce: &str, reply: &AuthReply) -> bool {
        self.expected_response(nonce, &reply.cnonce) == reply.response
    }
}

/// Size and checksum bookkeeping for a received image
pub struct ImageTracker {
    total: u32,
    received: u32,
    hasher: Md5,
    last_logged_progress: u8,
}

impl ImageTracker {
    pub fn new(total: u32) -> Self {
        Self {
            total,
            received: 0,
            hasher: Md5::new(),
            last_logged_progress: 0,
        }
    }

    /// Account for a chunk; data past the announced size is refused.
    pub fn update(&mut self, chunk: &[u8]) -> Result<(), OtaError> {
        let len = u32::try_from(chunk.len()).map_err(|_| OtaError::Receive)?;
        let received = self
            .received
            .checked_add(len)
            .filter(|received| *received <= self.total)
            .ok_or(OtaError::Receive)?;

        self.hasher.update(chunk);
        self.received = received;
        Ok(())
    }

    pub fn received(&self) -> u32 {
        self.received
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.received == self.total
    }

    /// Get the current progress percentage (0-100)
    pub fn progress_percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        #[allow(clippy::cast_possible_truncation)]
        {
            ((u64::from(self.received) * 100) / u64::from(self.total)) as u8
        }
    }

    /// Returns the percentage once every [`PROGRESS_LOG_STEP`] percent.
    pub fn progress_milestone(&mut self) -> Option<u8> {
        let progress = self.progress_percent();
        if progress >= self.last_logged_progress + PROGRESS_LOG_STEP {
            self.last_logged_progress = progress - progress % PROGRESS_LOG_STEP;
            return Some(progress);
        }
        None
    }

    /// Check the image against the announced size and digest.
    pub fn verify(self, expected_md5: &str) -> Result<(), OtaError> {
        if !self.is_complete() {
            log::warn!(
                "ota: image incomplete, {} of {} bytes",
                self.received,
                self.total
            );
            return Err(OtaError::End);
        }
        let digest = digest_to_hex(&self.hasher.finalize());
        if !digest.eq_ignore_ascii_case(expected_md5) {
            log::warn!("ota: md5 mismatch, expected {expected_md5}, got {digest}");
            return Err(OtaError::End);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md5_of_empty_input() {
        assert_eq!(md5_hex(&[]), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn milestones_are_reported_once_per_step() {
        let mut tracker = ImageTracker::new(100);
        tracker.update(&[0; 5]).unwrap();
        assert_eq!(tracker.progress_milestone(), None);
        tracker.update(&[0; 7]).unwrap();
        assert_eq!(tracker.progress_milestone(), Some(12));
        tracker.update(&[0; 7]).unwrap();
        assert_eq!(tracker.progress_milestone(), None);
        tracker.update(&[0; 1]).unwrap();
        assert_eq!(tracker.progress_milestone(), Some(20));
    }
}
