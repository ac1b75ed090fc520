use core::fmt::Write;

use embassy_net::tcp::TcpSocket;
use sunrise_core::net::http::{HeadStatus, head_status};

use super::Error;

pub(crate) type StatusCode = u16;

fn reason_phrase(code: StatusCode) -> &'static str {
    match code {
        200 => "OK",
        204 => "No Content",
        302 => "Found",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        413 => "Request Entity Too Large",
        431 => "Request Header Fields Too Large",
        _ => "Unknown",
    }
}

/// HTTP Content Type.
#[derive(Debug)]
pub(crate) enum ContentType {
    TextHtml,
    TextPlain,
}

/// Text Encoding.
#[derive(Debug)]
pub(crate) enum TextEncoding {
    Utf8,
}

impl TextEncoding {
    /// Convert the text encoding to a string.
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
        }
    }
}

impl ContentType {
    /// Convert the content type to a string.
    pub(super) fn as_str(&self) -> &'static str {
        match self {
            ContentType::TextHtml => "text/html",
            ContentType::TextPlain => "text/plain",
        }
    }
}

/// HTTP socket connection policy.
#[derive(Debug)]
pub(super) enum ConnectionPolicy {
    Close,
}

impl ConnectionPolicy {
    /// Convert the connection type to a string.
    pub(super) fn as_str(&self) -> &'static str {
        match self {
            ConnectionPolicy::Close => "close",
        }
    }
}

pub(super) trait TargetWriter {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error>;
}

/// HTTP Content Headers.
pub(crate) struct ContentHeaders {
    content_type: ContentType,
    content_length: Option<usize>,
    text_encoding: Option<TextEncoding>,
}

impl ContentHeaders {
    /// Create a new content headers with a content type.
    pub(crate) const fn new(content_type: ContentType) -> Self {
        Self {
            content_type,
            content_length: None,
            text_encoding: None,
        }
    }

    /// Set the content length.
    #[must_use]
    pub(crate) const fn with_length(mut self, length: usize) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Set the text encoding.
    #[must_use]
    pub(crate) const fn with_text_encoding(
        mut self,
        text_encoding: TextEncoding,
    ) -> Self {
        self.text_encoding = Some(text_encoding);
        self
    }
}

impl TargetWriter for ContentHeaders {
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        write!(writer, "Content-Type: {}", self.content_type.as_str())?;
        if let Some(text_encoding) = &self.text_encoding {
            write!(writer, "; charset={}", text_encoding.as_str())?;
        }
        write!(writer, "\r\n")?;
        if let Some(content_length) = self.content_length {
            write!(writer, "Content-Length: {}\r\n", content_length)?;
        }
        Ok(())
    }
}

/// Response Headers.
pub(crate) struct ResponseHeaders {
    status: StatusCode,
    connection: ConnectionPolicy,
    location: Option<&'static str>,
    no_cache: bool,
    content: Option<ContentHeaders>,
}

impl ResponseHeaders {
    /// Create empty response headers.
    pub(crate) const fn empty() -> Self {
        Self {
            status: 0,
            content: None,
            location: None,
            no_cache: false,
            connection: ConnectionPolicy::Close,
        }
    }

    /// Create empty response headers with a status code.
    pub(crate) const fn from_code(code: StatusCode) -> Self {
        Self::empty().with_code(code)
    }

    /// Set the success status code.
    pub(crate) const fn success() -> Self {
        Self::from_code(200)
    }

    /// Redirect to another location.
    pub(crate) const fn redirect(location: &'static str) -> Self {
        let mut headers = Self::from_code(302).without_cache();
        headers.location = Some(location);
        headers
    }

    /// Set the not found status code.
    pub(crate) const fn not_found() -> Self {
        Self::from_code(404)
    }

    /// Set the method not allowed status code.
    pub(crate) const fn method_not_allowed() -> Self {
        Self::from_code(405)
    }

    /// Set the payload too large status code.
    pub(crate) const fn payload_too_large() -> Self {
        Self::from_code(413)
    }

    /// Set the header fields too large status code.
    pub(crate) const fn header_too_large() -> Self {
        Self::from_code(431)
    }

    /// Set the bad request status code.
    pub(crate) const fn bad_request() -> Self {
        Self::from_code(400)
    }

    /// Set the content headers.
    #[must_use]
    pub(crate) const fn with_content(mut self, content: ContentHeaders) -> Self {
        self.content = Some(content);
        self
    }

    /// Forbid clients from caching the response.
    #[must_use]
    pub(crate) const fn without_cache(mut self) -> Self {
        self.no_cache = true;
        self
    }

    /// Set the status code.
    #[must_use]
    pub(crate) const fn with_code(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }
}

impl TargetWriter for ResponseHeaders {
    /// Write the response headers to a writer.
    fn write_to(&self, writer: &mut impl Write) -> Result<(), core::fmt::Error> {
        let reason = reason_phrase(self.status);
        write!(writer, "HTTP/1.1 {} {}\r\n", self.status, reason)?;
        if let Some(location) = self.location {
            write!(writer, "Location: {}\r\n", location)?;
        }
        if self.no_cache {
            write!(writer, "Cache-Control: no-cache, no-store, must-revalidate\r\n")?;
        }
        if let Some(content) = &self.content {
            content.write_to(writer)?;
        }

        write!(writer, "Connection: {}\r\n", self.connection.as_str())?;
        write!(writer, "\r\n")?;
        Ok(())
    }
}

/// Read the start line and headers from the socket.
///
/// Returns the length of the head and the number of bytes received; bytes
/// past the head belong to the body.
pub(super) async fn read_heading(
    buf: &mut [u8],
    socket: &mut TcpSocket<'_>,
) -> Result<(usize, usize), Error> {
    let mut received = 0;
    loop {
        let n = socket.read(&mut buf[received..]).await?;
        if n == 0 {
            return Err(Error::NoData);
        }
        received += n;
        match head_status(&buf[..received], buf.len()) {
            HeadStatus::Complete(head_len) => return Ok((head_len, received)),
            HeadStatus::Incomplete => {}
            HeadStatus::TooLarge => return Err(Error::TooLarge),
        }
    }
}
