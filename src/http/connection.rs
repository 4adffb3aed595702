//! Per-connection lifecycle.
//!
//! A [`Connection`] owns one transport and loops: parse a request, hand it to
//! the [`Handler`], write the response, then either wait for the next request
//! or close. Any parse error ends the loop after a best-effort error response.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, ReadHalf, WriteHalf};
use tracing::{debug, info};

use crate::http::error::ParseError;
use crate::http::mime::MediaType;
use crate::http::parser::parse_request;
use crate::http::reader::{DEFAULT_READ_TIMEOUT, TimedReader};
use crate::http::request::{Method, Request, Version};
use crate::http::response::{Response, StatusCode};
use crate::http::writer;

/// Buffer size for the write half of a connection.
pub const WRITE_BUFFER_SIZE: usize = 4_096;

/// Every method the parser accepts.
pub const ALL_METHODS: &[Method] = &[
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::CONNECT,
    Method::OPTIONS,
    Method::TRACE,
];

/// Produces responses for parsed requests.
///
/// The connection only calls [`Handler::handle`] for methods listed in
/// [`Handler::allowed_methods`]; everything else is answered with 405.
pub trait Handler: Send + Sync + 'static {
    fn allowed_methods(&self) -> &[Method] {
        ALL_METHODS
    }

    fn handle(&self, request: &Request) -> impl Future<Output = Response> + Send;

    /// Response for a request that could not be served. `server` is the
    /// identity string of the running server.
    fn error_response(
        &self,
        status: StatusCode,
        server: &str,
    ) -> impl Future<Output = Response> + Send {
        let body = format!("{} - {}", status.as_u16(), server);
        async move { Response::new(status).with_body(body, MediaType::Text).build() }
    }
}

/// Read-only settings shared by every connection.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub read_timeout: Duration,
    pub server_identity: Arc<str>,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            server_identity: format!("Segaline/{}", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

/// What the access log records about a response.
#[derive(Debug, Clone)]
struct AccessEntry {
    method: Option<Method>,
    target: String,
}

enum ConnectionState {
    AwaitingRequest,
    Dispatching(Request),
    Responding {
        response: Response,
        close: bool,
        access: Option<AccessEntry>,
    },
    Closed,
}

pub struct Connection<S, H> {
    reader: TimedReader<BufReader<ReadHalf<S>>>,
    writer: BufWriter<WriteHalf<S>>,
    peer: SocketAddr,
    handler: Arc<H>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

impl<S, H> Connection<S, H>
where
    S: AsyncRead + AsyncWrite,
    H: Handler,
{
    pub fn new(stream: S, peer: SocketAddr, handler: Arc<H>, settings: ConnectionSettings) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);

        Self {
            reader: TimedReader::new(BufReader::new(read_half), settings.read_timeout),
            writer: BufWriter::with_capacity(WRITE_BUFFER_SIZE, write_half),
            peer,
            handler,
            settings,
            state: ConnectionState::AwaitingRequest,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            let state = std::mem::replace(&mut self.state, ConnectionState::Closed);

            self.state = match state {
                ConnectionState::AwaitingRequest => self.read_request().await,

                ConnectionState::Dispatching(request) => self.dispatch(request).await,

                ConnectionState::Responding {
                    response,
                    close,
                    access,
                } => {
                    writer::send(&response, &mut self.writer).await;

                    if let Some(entry) = access {
                        info!(
                            status = response.status.as_u16(),
                            method = entry.method.map(|m| m.as_str()).unwrap_or("-"),
                            target = %entry.target,
                            peer = %self.peer,
                            "Request served"
                        );
                    }

                    if close {
                        ConnectionState::Closed
                    } else {
                        // Keep-alive: go back for the next request
                        ConnectionState::AwaitingRequest
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            };
        }

        self.writer
            .shutdown()
            .await
            .with_context(|| format!("failed to shut down connection to {}", self.peer))
    }

    async fn read_request(&mut self) -> ConnectionState {
        match parse_request(&mut self.reader, &mut self.writer, self.peer).await {
            Ok(request) => {
                debug!(
                    method = %request.method,
                    target = %request.uri,
                    version = %request.version,
                    peer = %self.peer,
                    "Request parsed"
                );
                ConnectionState::Dispatching(request)
            }

            Err(ParseError::ConnectionClosed) => {
                debug!(peer = %self.peer, "Client closed connection");
                ConnectionState::Closed
            }

            Err(e) => {
                let status = e.status();
                debug!(peer = %self.peer, error = %e, status = status.as_u16(), "Rejecting request");

                let response = self
                    .handler
                    .error_response(status, &self.settings.server_identity)
                    .await;

                ConnectionState::Responding {
                    response: self.finalize(response, true, Version::Http11),
                    close: true,
                    access: e.is_access_logged().then(|| AccessEntry {
                        method: None,
                        target: "-".to_string(),
                    }),
                }
            }
        }
    }

    async fn dispatch(&mut self, request: Request) -> ConnectionState {
        let access = Some(AccessEntry {
            method: Some(request.method),
            target: request.uri.to_string(),
        });

        let allowed = self.handler.allowed_methods();
        if !allowed.contains(&request.method) {
            let allow = allowed
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ");

            let mut response = self
                .handler
                .error_response(StatusCode::MethodNotAllowed, &self.settings.server_identity)
                .await;
            response.headers.insert("allow".to_string(), allow);

            return ConnectionState::Responding {
                response: self.finalize(response, true, request.version),
                close: true,
                access,
            };
        }

        let response = self.handler.handle(&request).await;
        let close = request.will_close_connection();

        ConnectionState::Responding {
            response: self.finalize(response, close, request.version),
            close,
            access,
        }
    }

    /// Stamps the server identity and the connection decision onto a response.
    fn finalize(&self, mut response: Response, close: bool, version: Version) -> Response {
        response
            .headers
            .entry("server".to_string())
            .or_insert_with(|| self.settings.server_identity.to_string());

        if close {
            response
                .headers
                .insert("connection".to_string(), "close".to_string());
        } else if version == Version::Http10 {
            response
                .headers
                .insert("connection".to_string(), "keep-alive".to_string());
        }

        response
    }
}
