//! Deadline-bounded reads.
//!
//! Every logical read (one line, or an exact number of bytes) gets its own
//! deadline that starts when that read starts. A slow client can therefore
//! hold a connection for at most one deadline per line, never indefinitely.
//!
//! The deadline is enforced with [`tokio::time::timeout`] around the read
//! future itself. When it fires the read future is dropped, so nothing is
//! left running in the background.

use std::io;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tokio::time::timeout;

use crate::http::error::ParseError;

/// Default per-read deadline.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Wraps a buffered byte source and bounds each read by a deadline.
pub struct TimedReader<R> {
    inner: R,
    timeout: Duration,
}

impl<R: AsyncBufRead + Unpin> TimedReader<R> {
    pub fn new(inner: R, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// Reads one line and returns it without its terminator (`\r\n` or a bare
    /// `\n`).
    ///
    /// The underlying buffer may hand the line over in several fragments; each
    /// fragment read is bounded by the deadline. Lines longer than `limit`
    /// bytes fail with [`ParseError::HeadersTooLarge`].
    ///
    /// A clean end of stream before the first byte yields
    /// [`ParseError::ConnectionClosed`]; one in the middle of a line is a
    /// transport error.
    pub async fn read_line(&mut self, limit: usize) -> Result<String, ParseError> {
        let mut line = Vec::new();

        loop {
            let (complete, used) = {
                let available = self.fill().await?;
                if available.is_empty() {
                    return Err(if line.is_empty() {
                        ParseError::ConnectionClosed
                    } else {
                        ParseError::Transport(io::ErrorKind::UnexpectedEof.into())
                    });
                }

                match available.iter().position(|&b| b == b'\n') {
                    Some(end) => {
                        line.extend_from_slice(&available[..end]);
                        (true, end + 1)
                    }
                    None => {
                        line.extend_from_slice(available);
                        (false, available.len())
                    }
                }
            };
            self.inner.consume(used);

            if line.len() > limit {
                return Err(ParseError::HeadersTooLarge);
            }
            if complete {
                break;
            }
        }

        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }

    /// Reads exactly `len` bytes. Running out of input first is an error;
    /// a short body is never returned.
    pub async fn read_exact(&mut self, len: usize) -> Result<Vec<u8>, ParseError> {
        let mut buf = vec![0u8; len];
        match timeout(self.timeout, self.inner.read_exact(&mut buf)).await {
            Ok(Ok(_)) => Ok(buf),
            Ok(Err(e)) => Err(ParseError::Transport(e)),
            Err(_) => Err(ParseError::TimeoutReached),
        }
    }

    async fn fill(&mut self) -> Result<&[u8], ParseError> {
        match timeout(self.timeout, self.inner.fill_buf()).await {
            Ok(Ok(buf)) => Ok(buf),
            Ok(Err(e)) => Err(ParseError::Transport(e)),
            Err(_) => Err(ParseError::TimeoutReached),
        }
    }
}
