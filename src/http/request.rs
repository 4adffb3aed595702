//! Requests as handed to a [`Handler`](crate::http::connection::Handler).
//!
//! Headers arrive lower-cased and the target is already a parsed [`Uri`], so
//! handlers never see raw wire text.

use std::collections::HashMap;
use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

use crate::http::uri::{Uri, UriError};

/// HTTP request methods.
///
/// The parser accepts exactly these eight verbs; anything else is rejected
/// with a 501 before the request target is even looked at. Whether a
/// handler actually serves a given method is a separate question answered
/// by [`Handler::allowed_methods`](crate::http::connection::Handler::allowed_methods).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// GET - Retrieve a resource
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// CONNECT - Establish a tunnel to the target authority
    CONNECT,
    /// OPTIONS - Describe communication options
    OPTIONS,
    /// TRACE - Echo the received request back
    TRACE,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Method names are case-sensitive, so `get` is not `GET`.
    ///
    /// # Example
    ///
    /// ```
    /// # use segaline::http::request::Method;
    /// assert_eq!(Method::from_str("TRACE"), Some(Method::TRACE));
    /// assert_eq!(Method::from_str("get"), None);
    /// assert_eq!(Method::from_str("PATCH"), None);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "GET" => Some(Method::GET),
            "HEAD" => Some(Method::HEAD),
            "POST" => Some(Method::POST),
            "PUT" => Some(Method::PUT),
            "DELETE" => Some(Method::DELETE),
            "CONNECT" => Some(Method::CONNECT),
            "OPTIONS" => Some(Method::OPTIONS),
            "TRACE" => Some(Method::TRACE),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::CONNECT => "CONNECT",
            Method::OPTIONS => "OPTIONS",
            Method::TRACE => "TRACE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Protocol version from the request line. Ordered oldest to newest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Version {
    Http09,
    Http10,
    Http11,
}

impl Version {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "HTTP/0.9" => Some(Version::Http09),
            "HTTP/1.0" => Some(Version::Http10),
            "HTTP/1.1" => Some(Version::Http11),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Version::Http09 => "HTTP/0.9",
            Version::Http10 => "HTTP/1.0",
            Version::Http11 => "HTTP/1.1",
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Represents a parsed HTTP request from a client.
///
/// Header names are lower-cased by the parser and values are trimmed, so
/// lookups through [`Request::header`] are effectively case-insensitive.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.)
    pub method: Method,
    /// The parsed request target
    pub uri: Uri,
    /// Protocol version from the request line
    pub version: Version,
    /// Request headers keyed by lower-cased name
    pub headers: HashMap<String, String>,
    /// Request body, already de-chunked
    pub body: Vec<u8>,
    /// Peer address reported by the transport
    pub remote_addr: SocketAddr,
}

/// Builder for constructing Request objects outside the parser.
pub struct RequestBuilder {
    method: Option<Method>,
    target: Option<String>,
    version: Version,
    headers: HashMap<String, String>,
    body: Vec<u8>,
    remote_addr: SocketAddr,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self {
            method: None,
            target: None,
            version: Version::Http11,
            headers: HashMap::new(),
            body: Vec::new(),
            remote_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.headers.insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    pub fn remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    /// Builds the request, parsing the target the same way the wire parser
    /// would. The target defaults to `/`.
    pub fn build(self) -> Result<Request, UriError> {
        let method = self.method.unwrap_or(Method::GET);
        let uri = Uri::parse(method, self.target.as_deref().unwrap_or("/"))?;

        Ok(Request {
            method,
            uri,
            version: self.version,
            headers: self.headers,
            body: self.body,
            remote_addr: self.remote_addr,
        })
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Request {
    /// Retrieves a header value by name.
    ///
    /// # Arguments
    ///
    /// * `key` - Header name to look up, in any case
    ///
    /// # Returns
    ///
    /// `Some(&str)` with the header value if present, `None` otherwise.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }

    /// Determines whether the connection must be closed after responding.
    ///
    /// HTTP/1.1 stays open unless the client sent `Connection: close`.
    /// HTTP/1.0 closes unless the client sent `Connection: keep-alive`.
    /// HTTP/0.9 always closes.
    pub fn will_close_connection(&self) -> bool {
        let connection = self.header("connection");
        let has_close = connection.is_some_and(|v| v.eq_ignore_ascii_case("close"));
        let is_keep_alive = self.version == Version::Http10
            && connection.is_some_and(|v| v.eq_ignore_ascii_case("keep-alive"));

        has_close || (self.version < Version::Http11 && !is_keep_alive)
    }

    /// Inverse of [`Request::will_close_connection`].
    pub fn keep_alive(&self) -> bool {
        !self.will_close_connection()
    }

    /// Serializes the request back into wire form. Used to echo TRACE
    /// requests; headers are emitted in name order.
    pub fn as_bytes(&self) -> Vec<u8> {
        let mut names: Vec<&String> = self.headers.keys().collect();
        names.sort();

        let mut buf = format!("{} {} {}\r\n", self.method, self.uri, self.version).into_bytes();
        for name in names {
            buf.extend_from_slice(name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(self.headers[name].as_bytes());
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);
        buf
    }
}
