//! HTTP/1.1 request heads
//!
//! A head is the request line plus header lines, closed by an empty line.
//! Heads that do not fit the receive buffer are refused rather than cut.

/// Receive buffer for a request head; browsers send 600-800 bytes.
pub const MAX_HEAD_SIZE: usize = 2048;

const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";
const CONTENT_LENGTH: &str = "content-length:";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "GET" => HttpMethod::Get,
            "POST" => HttpMethod::Post,
            "PUT" => HttpMethod::Put,
            "DELETE" => HttpMethod::Delete,
            "PATCH" => HttpMethod::Patch,
            "OPTIONS" => HttpMethod::Options,
            "HEAD" => HttpMethod::Head,
            _ => return None,
        })
    }
}

/// Progress of reading a head into a buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadStatus {
    /// The head ends before this offset; anything after it is body.
    Complete(usize),
    /// More bytes are needed.
    Incomplete,
    /// The buffer is full and still holds no complete head.
    TooLarge,
}

/// Check `received` bytes of a buffer holding `capacity` bytes.
pub fn head_status(received: &[u8], capacity: usize) -> HeadStatus {
    if let Some(pos) = received
        .windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
    {
        return HeadStatus::Complete(pos + HEAD_TERMINATOR.len());
    }
    if received.len() >= capacity {
        HeadStatus::TooLarge
    } else {
        HeadStatus::Incomplete
    }
}

/// Fields of a request head the server routes on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead<'a> {
    pub method: HttpMethod,
    /// Path without the query string
    pub path: &'a str,
    pub content_length: u32,
}

impl<'a> RequestHead<'a> {
    /// Parse a complete head as delimited by [`head_status`].
    pub fn parse(head: &'a [u8]) -> Option<Self> {
        let text = core::str::from_utf8(head).ok()?;
        let (method, target, headers) = parse_request_line(text)?;
        let path = target.split('?').next().unwrap_or(target);

        Some(Self {
            method,
            path,
            content_length: find_content_length(headers).unwrap_or(0),
        })
    }
}

/// Split the request line off a head.
///
/// Returns the method, the request target and the remaining header lines.
pub fn parse_request_line(head: &str) -> Option<(HttpMethod, &str, &str)> {
    let line_end = head.find("\r\n").unwrap_or(head.len());
    let mut parts = head[..line_end].split_whitespace();
    let method = parts.next().and_then(HttpMethod::parse)?;
    let target = parts.next()?;

    Some((method, target, head.get(line_end + 2..).unwrap_or_default()))
}

/// Value of the `Content-Length` header, if present and valid.
pub fn find_content_length(headers: &str) -> Option<u32> {
    headers.lines().find_map(|line| {
        let name = line.get(..CONTENT_LENGTH.len())?;
        if !name.eq_ignore_ascii_case(CONTENT_LENGTH) {
            return None;
        }
        line[CONTENT_LENGTH.len()..].trim().parse().ok()
    })
}
