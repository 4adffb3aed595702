//! Request parsing on top of [`TimedReader`].

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::http::error::ParseError;
use crate::http::reader::TimedReader;
use crate::http::request::{Method, Request, Version};
use crate::http::response::{Response, StatusCode};
use crate::http::uri::{MAX_URI_LENGTH, Uri, UriError};
use crate::http::writer;

/// Largest request body accepted, whether framed by content-length or chunked.
pub const MAX_CONTENT_LENGTH: usize = 65_536;

/// Largest single chunk accepted in a chunked request body.
pub const MAX_CHUNK_SIZE: usize = 4_096;

/// Longest header, trailer or chunk-size line accepted.
pub const MAX_HEADER_LINE: usize = 8_192;

/// Most header fields accepted in one header section.
pub const MAX_HEADERS: usize = 100;

// Method, version and two spaces on top of the longest target.
const MAX_REQUEST_LINE: usize = MAX_URI_LENGTH + 32;

/// Reads one complete request from `reader`.
///
/// Parsing is a single forward pass: request line, headers, then body. The
/// first error ends it. The only write is an interim `100 Continue` sent to
/// `writer` when the client asked for one and a body is about to be read.
pub async fn parse_request<R, W>(
    reader: &mut TimedReader<R>,
    writer: &mut W,
    remote_addr: SocketAddr,
) -> Result<Request, ParseError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let (method, uri, version) = parse_request_line(reader).await?;

    let headers = parse_headers(reader).await?;
    if !headers.contains_key("host") {
        return Err(ParseError::MissingHostHeader);
    }

    let body = parse_body(reader, writer, &headers).await?;

    Ok(Request {
        method,
        uri,
        version,
        headers,
        body,
        remote_addr,
    })
}

async fn parse_request_line<R>(
    reader: &mut TimedReader<R>,
) -> Result<(Method, Uri, Version), ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let line = reader
        .read_line(MAX_REQUEST_LINE)
        .await
        .map_err(|e| match e {
            ParseError::HeadersTooLarge => ParseError::InvalidRequestTarget(UriError::TooLong),
            e => e,
        })?;

    let parts: Vec<&str> = line.split(' ').collect();
    let [method, target, version] = parts.as_slice() else {
        return Err(ParseError::MalformedRequestLine);
    };

    let method =
        Method::from_str(method).ok_or_else(|| ParseError::UnsupportedMethod(method.to_string()))?;
    let uri = Uri::parse(method, target)?;
    let version = Version::from_str(version)
        .ok_or_else(|| ParseError::UnsupportedVersion(version.to_string()))?;

    Ok((method, uri, version))
}

/// Reads header lines up to and including the empty line that ends the
/// section. Also used for chunked trailers.
async fn parse_headers<R>(reader: &mut TimedReader<R>) -> Result<HashMap<String, String>, ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = HashMap::new();

    loop {
        let line = reader
            .read_line(MAX_HEADER_LINE)
            .await
            .map_err(mid_message)?;
        if line.is_empty() {
            return Ok(headers);
        }

        if headers.len() >= MAX_HEADERS {
            return Err(ParseError::HeadersTooLarge);
        }

        let (name, value) = parse_header_line(&line)?;
        if headers.contains_key(&name) {
            return Err(ParseError::DuplicateHeader(name));
        }
        headers.insert(name, value);
    }
}

/// Splits `name: value`, lower-casing the name and trimming the value.
pub fn parse_header_line(line: &str) -> Result<(String, String), ParseError> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

    let name = name.to_ascii_lowercase();
    let value = value.trim_matches([' ', '\t']);

    if name.is_empty() || !name.bytes().all(is_visible) || !value.bytes().all(is_value_byte) {
        return Err(ParseError::InvalidHeader(line.to_string()));
    }

    Ok((name, value.to_string()))
}

fn is_visible(b: u8) -> bool {
    (0x21..=0x7E).contains(&b)
}

fn is_value_byte(b: u8) -> bool {
    is_visible(b) || b == b' ' || b == b'\t'
}

async fn parse_body<R, W>(
    reader: &mut TimedReader<R>,
    writer: &mut W,
    headers: &HashMap<String, String>,
) -> Result<Vec<u8>, ParseError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    if let Some(encoding) = headers.get("transfer-encoding") {
        if !encoding.eq_ignore_ascii_case("chunked") {
            return Err(ParseError::UnsupportedTransferEncoding(encoding.clone()));
        }

        send_continue(writer, headers).await;
        let (body, trailer) = read_chunked(reader).await?;

        // Trailers are validated and then dropped, never merged.
        if let Some(name) = trailer.keys().find(|name| headers.contains_key(*name)) {
            return Err(ParseError::DuplicateTrailerHeader(name.clone()));
        }
        return Ok(body);
    }

    if let Some(length) = headers.get("content-length") {
        let length = parse_content_length(length)?;
        send_continue(writer, headers).await;
        return reader.read_exact(length).await;
    }

    Ok(Vec::new())
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidContentLength(value.to_string()));
    }

    // All digits, so the only way parsing fails is overflow.
    let length: usize = value
        .parse()
        .map_err(|_| ParseError::ContentLengthExceeded)?;
    if length > MAX_CONTENT_LENGTH {
        return Err(ParseError::ContentLengthExceeded);
    }
    Ok(length)
}

async fn read_chunked<R>(
    reader: &mut TimedReader<R>,
) -> Result<(Vec<u8>, HashMap<String, String>), ParseError>
where
    R: AsyncBufRead + Unpin,
{
    let mut body = Vec::new();

    loop {
        let chunk_header = reader
            .read_line(MAX_HEADER_LINE)
            .await
            .map_err(mid_message)?;
        let size = parse_chunk_size(&chunk_header)?;
        if size == 0 {
            break;
        }

        if body.len() + size > MAX_CONTENT_LENGTH {
            return Err(ParseError::ContentLengthExceeded);
        }

        let chunk = reader.read_exact(size).await?;
        let terminator = reader
            .read_line(MAX_HEADER_LINE)
            .await
            .map_err(|e| match mid_message(e) {
                ParseError::HeadersTooLarge => ParseError::InvalidChunk,
                e => e,
            })?;
        if !terminator.is_empty() {
            return Err(ParseError::InvalidChunk);
        }

        body.extend_from_slice(&chunk);
    }

    let trailer = parse_headers(reader).await?;
    Ok((body, trailer))
}

/// Parses `hex-size[;extensions]`. Extensions are ignored.
pub fn parse_chunk_size(line: &str) -> Result<usize, ParseError> {
    let invalid = || ParseError::InvalidChunkSize(line.to_string());

    let size = line.split(';').next().unwrap_or_default();
    let size = size.trim_end_matches([' ', '\t']);
    if size.is_empty() || size.len() > 8 || !size.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let size = usize::from_str_radix(size, 16).map_err(|_| invalid())?;
    if size > MAX_CHUNK_SIZE {
        return Err(invalid());
    }
    Ok(size)
}

async fn send_continue<W>(writer: &mut W, headers: &HashMap<String, String>)
where
    W: AsyncWrite + Unpin,
{
    let expects_continue = headers
        .get("expect")
        .is_some_and(|v| v.eq_ignore_ascii_case("100-continue"));

    if expects_continue {
        tracing::debug!("Sending 100 Continue");
        writer::send(&Response::new(StatusCode::Continue).build(), writer).await;
    }
}

/// Once the request line is in, running out of input is no longer a clean
/// close.
fn mid_message(e: ParseError) -> ParseError {
    match e {
        ParseError::ConnectionClosed => ParseError::Transport(io::ErrorKind::UnexpectedEof.into()),
        e => e,
    }
}
