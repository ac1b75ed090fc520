use embassy_net::tcp::TcpSocket;
use embedded_io_async::Write as _;
use heapless::{String, Vec};
use log::{debug, warn};
use sunrise_core::net::http::{HttpMethod, MAX_HEAD_SIZE, RequestHead};

use super::{
    Error,
    HttpResult,
    headers::{
        ContentHeaders,
        ContentType,
        ResponseHeaders,
        TargetWriter as _,
        TextEncoding,
        read_heading,
    },
};

const HEADER_BUFFER_SIZE: usize = MAX_HEAD_SIZE;
/// Largest response head written by the server
const RESPONSE_HEAD_SIZE: usize = 512;
const BODY_BUFFER_SIZE: usize = 512;
const BODY_RX_CHUNK_SIZE: usize = 128;
const STREAM_CHUNK_SIZE: usize = 512;
const PATH_CAPACITY: usize = 64;

/// HTTP connection context
pub(crate) struct HttpConnection<'a> {
    pub method: HttpMethod,
    pub path: String<PATH_CAPACITY>,

    socket: TcpSocket<'a>,
    content_length: u32,
    header_end: usize,
    header_buf: Vec<u8, HEADER_BUFFER_SIZE>,
    body_buf: Vec<u8, BODY_BUFFER_SIZE>,
}

impl<'a> HttpConnection<'a> {
    /// Read the request head from a freshly accepted socket.
    pub(crate) async fn from_socket(mut socket: TcpSocket<'a>) -> Result<Self, Error> {
        let mut header_buf = Vec::<u8, HEADER_BUFFER_SIZE>::new();
        header_buf
            .resize(HEADER_BUFFER_SIZE, 0)
            .map_err(|()| Error::TooLarge)?;
        let (header_end, header_len) =
            match read_heading(header_buf.as_mut_slice(), &mut socket).await {
                Ok(heading) => heading,
                Err(Error::TooLarge) => {
                    warn!("http: request head exceeds {} bytes", HEADER_BUFFER_SIZE);
                    reject_head(&mut socket).await;
                    return Err(Error::TooLarge);
                }
                Err(e) => return Err(e),
            };
        header_buf.truncate(header_len);

        let head = RequestHead::parse(&header_buf[..header_end]).ok_or(Error::Parse)?;
        let (method, content_length) = (head.method, head.content_length);
        let raw_path = head.path;
        let mut path = String::new();
        let _ = path.push_str(raw_path);
        debug!("http: {:?} {}", method, path);

        Ok(Self {
            method,
            path,
            socket,
            header_buf,
            body_buf: Vec::new(),
            content_length,
            header_end,
        })
    }

    /// Get request method and path
    pub(crate) fn route(&self) -> (HttpMethod, &'_ str) {
        (self.method, self.path.as_str())
    }

    /// Write the headers to the connection
    pub(crate) async fn write_headers(&mut self, headers: &ResponseHeaders) -> HttpResult {
        let mut head = String::<RESPONSE_HEAD_SIZE>::new();
        headers.write_to(&mut head)?;
        self.socket.write_all(head.as_bytes()).await?;
        Ok(())
    }

    /// Write the body to the connection
    pub(crate) async fn write_body(&mut self, body: &[u8]) -> HttpResult {
        for chunk in body.chunks(STREAM_CHUNK_SIZE) {
            self.socket.write_all(chunk).await?;
        }
        Ok(())
    }

    /// Write a complete HTML response and close the connection.
    pub(crate) async fn write_html(&mut self, headers: ResponseHeaders, page: &str) -> HttpResult {
        let headers = headers.with_content(
            ContentHeaders::new(ContentType::TextHtml)
                .with_text_encoding(TextEncoding::Utf8)
                .with_length(page.len()),
        );
        self.write_headers(&headers).await?;
        self.write_body(page.as_bytes()).await?;
        self.finish().await
    }

    /// Write a body-less response and close the connection.
    pub(crate) async fn write_empty(&mut self, headers: ResponseHeaders) -> HttpResult {
        let headers = headers.with_content(ContentHeaders::new(ContentType::TextPlain).with_length(0));
        self.write_headers(&headers).await?;
        self.finish().await
    }

    /// Read an urlencoded request body as text
    pub(crate) async fn read_form(&mut self) -> Result<&str, Error> {
        let body = self.read_body().await?;
        core::str::from_utf8(body).map_err(|_| Error::Parse)
    }

    /// Flush pending data and close the write half.
    async fn finish(&mut self) -> HttpResult {
        self.socket.flush().await?;
        self.socket.close();
        self.socket.flush().await?;
        Ok(())
    }

    /// Read the request body
    async fn read_body(&mut self) -> Result<&[u8], Error> {
        if self.content_length == 0 {
            return Err(Error::NoData);
        }
        let content_length = self.content_length as usize;
        if content_length > BODY_BUFFER_SIZE {
            return Err(Error::TooLarge);
        }

        self.body_buf.clear();
        if self.header_buf.len() > self.header_end {
            self.body_buf
                .extend_from_slice(&self.header_buf[self.header_end..])
                .map_err(|()| Error::TooLarge)?;
        }

        while self.body_buf.len() < content_length {
            let mut buf = [0u8; BODY_RX_CHUNK_SIZE];
            let n = self.socket.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            self.body_buf
                .extend_from_slice(&buf[..n])
                .map_err(|()| Error::TooLarge)?;
        }
        self.body_buf.truncate(content_length);

        Ok(self.body_buf.as_slice())
    }
}

/// Answer an oversized head with 431 and close.
async fn reject_head(socket: &mut TcpSocket<'_>) {
    let mut head = String::<RESPONSE_HEAD_SIZE>::new();
    let headers = ResponseHeaders::header_too_large()
        .with_content(ContentHeaders::new(ContentType::TextPlain).with_length(0));
    if headers.write_to(&mut head).is_err() {
        return;
    }
    if socket.write_all(head.as_bytes()).await.is_ok() {
        let _ = socket.flush().await;
    }
    socket.close();
}
