//! HTTP/1.x protocol engine.
//!
//! This module turns raw connection bytes into [`Request`](request::Request)s
//! and [`Response`](response::Response)s back into bytes. It handles
//! HTTP/0.9 through HTTP/1.1 with keep-alive, chunked transfer coding in both
//! directions, and the `100-continue` handshake.
//!
//! # Architecture
//!
//! - **`uri`**: Request-target parsing and percent-encoding
//! - **`reader`**: Per-read deadlines over a buffered byte source
//! - **`parser`**: Request line, headers and body (content-length or chunked)
//! - **`request`**: HTTP request representation
//! - **`response`**: Status codes and the response builder
//! - **`writer`**: Serializes and writes responses, chunking large bodies
//! - **`connection`**: The per-connection state machine and the [`Handler`](connection::Handler) seam
//! - **`error`**: The closed set of parse errors and their status codes
//! - **`mime`**: Media types by file extension
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌──────────────────┐
//!        │ AwaitingRequest  │ ← Parse the next request (per-read deadlines)
//!        └──────┬───────────┘
//!               │ Request parsed        (parse error → error response, close)
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← Handler produces a response (405 if not allowed)
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Responding    │ ← Send response to client
//!        └──────┬───────────┘
//!               │ Response sent
//!               ├─ Keep-Alive → AwaitingRequest (same connection)
//!               └─ Close → Closed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use segaline::http::connection::{Connection, ConnectionSettings, Handler};
//! use segaline::http::request::Request;
//! use segaline::http::response::Response;
//! use tokio::net::TcpListener;
//!
//! struct Hello;
//!
//! impl Handler for Hello {
//!     async fn handle(&self, _request: &Request) -> Response {
//!         Response::ok("Hello from Segaline\n")
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let listener = TcpListener::bind("127.0.0.1:8080").await?;
//!     let handler = Arc::new(Hello);
//!
//!     loop {
//!         let (socket, peer) = listener.accept().await?;
//!         let handler = handler.clone();
//!         tokio::spawn(async move {
//!             let mut conn = Connection::new(socket, peer, handler, ConnectionSettings::default());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod connection;
pub mod error;
pub mod mime;
pub mod parser;
pub mod reader;
pub mod request;
pub mod response;
pub mod uri;
pub mod writer;
