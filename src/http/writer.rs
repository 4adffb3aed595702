//! Response serialization.
//!
//! Bodies at or under the unchunked threshold go out in one write with a
//! content-length. Larger bodies are split into [`CHUNK_SIZE`] chunks and the
//! sink is flushed after each one.

use std::io;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::{CHUNK_SIZE, Response, ResponseBuilder};

const LAST_CHUNK: &[u8] = b"0\r\n\r\n";

fn serialize_head(resp: &Response) -> BytesMut {
    let mut buf = BytesMut::with_capacity(256);

    // Status line
    buf.put_slice(
        format!(
            "{} {} {}\r\n",
            resp.version,
            resp.status.as_u16(),
            resp.status.reason_phrase()
        )
        .as_bytes(),
    );

    // Headers
    for (k, v) in &resp.headers {
        buf.put_slice(k.as_bytes());
        buf.put_slice(b": ");
        buf.put_slice(v.as_bytes());
        buf.put_slice(b"\r\n");
    }

    // Header/body separator
    buf.put_slice(b"\r\n");

    buf
}

fn put_chunk(buf: &mut BytesMut, chunk: &[u8]) {
    buf.put_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
    buf.put_slice(chunk);
    buf.put_slice(b"\r\n");
}

/// Splits a chunked body into the full-size chunks and the remainder that
/// goes out together with the last-chunk marker.
fn split_chunks(body: &[u8]) -> (&[u8], &[u8]) {
    body.split_at(body.len() / CHUNK_SIZE * CHUNK_SIZE)
}

fn serialize_tail(rest: &[u8]) -> BytesMut {
    let mut buf = BytesMut::with_capacity(rest.len() + 16);
    if !rest.is_empty() {
        put_chunk(&mut buf, rest);
    }
    buf.put_slice(LAST_CHUNK);
    buf
}

/// Complete wire form of `resp`, exactly as [`send`] would write it.
pub fn encode(resp: &Response) -> Bytes {
    let mut buf = serialize_head(resp);

    if resp.chunked {
        let (whole, rest) = split_chunks(&resp.body);
        for chunk in whole.chunks(CHUNK_SIZE) {
            put_chunk(&mut buf, chunk);
        }
        buf.put_slice(&serialize_tail(rest));
    } else {
        buf.put_slice(&resp.body);
    }

    buf.freeze()
}

/// Writes one response to a sink, flushing after every chunk.
pub struct ResponseWriter<'a> {
    response: &'a Response,
    written: usize,
}

impl<'a> ResponseWriter<'a> {
    pub fn new(response: &'a Response) -> Self {
        Self {
            response,
            written: 0,
        }
    }

    /// Bytes handed to the sink so far.
    pub fn bytes_written(&self) -> usize {
        self.written
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let response = self.response;

        if !response.chunked {
            let mut buf = serialize_head(response);
            buf.put_slice(&response.body);
            self.write_fully(stream, &buf).await?;
            return stream.flush().await;
        }

        let head = serialize_head(response);
        self.write_fully(stream, &head).await?;

        let (whole, rest) = split_chunks(&response.body);
        for chunk in whole.chunks(CHUNK_SIZE) {
            let mut buf = BytesMut::with_capacity(chunk.len() + 16);
            put_chunk(&mut buf, chunk);
            self.write_fully(stream, &buf).await?;
            stream.flush().await?;
        }

        let tail = serialize_tail(rest);
        self.write_fully(stream, &tail).await?;
        stream.flush().await
    }

    async fn write_fully<W>(&mut self, stream: &mut W, bytes: &[u8]) -> io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let mut offset = 0;
        while offset < bytes.len() {
            let n = stream.write(&bytes[offset..]).await?;

            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "connection closed while writing",
                ));
            }

            offset += n;
            self.written += n;
        }

        Ok(())
    }
}

/// Sends `response` to `sink`.
///
/// A failed write or flush is logged and dropped: by the time it happens
/// the response is already half on the wire and the connection is going
/// away regardless.
pub async fn send<W>(response: &Response, sink: &mut W)
where
    W: AsyncWrite + Unpin,
{
    let mut writer = ResponseWriter::new(response);
    if let Err(e) = writer.write_to_stream(sink).await {
        tracing::warn!(
            status = response.status.as_u16(),
            written = writer.bytes_written(),
            error = %e,
            "An issue occurred while responding to a request"
        );
    }
}

impl ResponseBuilder {
    /// Builds the response and sends it to `sink`.
    pub async fn respond<W>(self, sink: &mut W)
    where
        W: AsyncWrite + Unpin,
    {
        send(&self.build(), sink).await;
    }
}
