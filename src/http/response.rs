//! Status codes and the response builder.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::http::mime::MediaType;
use crate::http::request::Version;

/// Size of each chunk when a body is sent with chunked framing.
pub const CHUNK_SIZE: usize = 4_096;

/// Bodies larger than this are sent chunked instead of with a content-length.
pub const MAX_UNCHUNKED_BODY: usize = 8 * CHUNK_SIZE;

macro_rules! status_codes {
    ($($name:ident = $code:literal, $phrase:literal;)+) => {
        /// HTTP status codes the server can emit.
        ///
        /// The discriminant is the wire code. Codes outside this table cannot
        /// be constructed: [`StatusCode::try_from`] rejects them.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum StatusCode {
            $($name = $code,)+
        }

        impl StatusCode {
            /// Returns the standard HTTP reason phrase for this status code.
            pub fn reason_phrase(&self) -> &'static str {
                match self {
                    $(StatusCode::$name => $phrase,)+
                }
            }
        }

        impl TryFrom<u16> for StatusCode {
            type Error = u16;

            fn try_from(code: u16) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(StatusCode::$name),)+
                    other => Err(other),
                }
            }
        }
    };
}

status_codes! {
    Continue = 100, "Continue";
    SwitchingProtocols = 101, "Switching Protocols";
    Processing = 102, "Processing";

    Ok = 200, "OK";
    Created = 201, "Created";
    Accepted = 202, "Accepted";
    NonAuthoritativeInformation = 203, "Non-Authoritative Information";
    NoContent = 204, "No Content";
    ResetContent = 205, "Reset Content";
    PartialContent = 206, "Partial Content";
    MultiStatus = 207, "Multi-Status";
    AlreadyReported = 208, "Already Reported";
    ImUsed = 226, "IM Used";

    MultipleChoices = 300, "Multiple Choices";
    MovedPermanently = 301, "Moved Permanently";
    Found = 302, "Found";
    SeeOther = 303, "See Other";
    NotModified = 304, "Not Modified";
    UseProxy = 305, "Use Proxy";
    TemporaryRedirect = 307, "Temporary Redirect";
    PermanentRedirect = 308, "Permanent Redirect";

    BadRequest = 400, "Bad Request";
    Unauthorized = 401, "Unauthorized";
    PaymentRequired = 402, "Payment Required";
    Forbidden = 403, "Forbidden";
    NotFound = 404, "Not Found";
    MethodNotAllowed = 405, "Method Not Allowed";
    NotAcceptable = 406, "Not Acceptable";
    ProxyAuthenticationRequired = 407, "Proxy Authentication Required";
    RequestTimeout = 408, "Request Timeout";
    Conflict = 409, "Conflict";
    Gone = 410, "Gone";
    LengthRequired = 411, "Length Required";
    PreconditionFailed = 412, "Precondition Failed";
    PayloadTooLarge = 413, "Payload Too Large";
    UriTooLong = 414, "URI Too Long";
    UnsupportedMediaType = 415, "Unsupported Media Type";
    RangeNotSatisfiable = 416, "Range Not Satisfiable";
    ExpectationFailed = 417, "Expectation Failed";
    ImATeapot = 418, "I'm a teapot";
    MisdirectedRequest = 421, "Misdirected Request";
    UnprocessableEntity = 422, "Unprocessable Entity";
    Locked = 423, "Locked";
    FailedDependency = 424, "Failed Dependency";
    UpgradeRequired = 426, "Upgrade Required";
    PreconditionRequired = 428, "Precondition Required";
    TooManyRequests = 429, "Too Many Requests";
    RequestHeaderFieldsTooLarge = 431, "Request Header Fields Too Large";
    ConnectionClosedWithoutResponse = 444, "Connection Closed Without Response";
    UnavailableForLegalReasons = 451, "Unavailable For Legal Reasons";
    ClientClosedRequest = 499, "Client Closed Request";

    InternalServerError = 500, "Internal Server Error";
    NotImplemented = 501, "Not Implemented";
    BadGateway = 502, "Bad Gateway";
    ServiceUnavailable = 503, "Service Unavailable";
    GatewayTimeout = 504, "Gateway Timeout";
    HttpVersionNotSupported = 505, "HTTP Version Not Supported";
    VariantAlsoNegotiates = 506, "Variant Also Negotiates";
    InsufficientStorage = 507, "Insufficient Storage";
    LoopDetected = 508, "Loop Detected";
    NotExtended = 510, "Not Extended";
    NetworkAuthenticationRequired = 511, "Network Authentication Required";
    NetworkConnectTimeoutError = 599, "Network Connect Timeout Error";
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use segaline::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::UriTooLong.as_u16(), 414);
    /// assert!(StatusCode::try_from(299).is_err());
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Informational and 204 responses never declare a body length.
    pub fn allows_content_length(&self) -> bool {
        let code = self.as_u16();
        code >= 200 && code != 204
    }
}

/// Formats a timestamp as an IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn format_http_date(time: DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Represents a complete HTTP response ready to be sent to a client.
///
/// Header names are stored lower-cased. The body is fully materialized;
/// `chunked` decides how the writer frames it.
#[derive(Debug, Clone)]
pub struct Response {
    pub version: Version,
    pub status: StatusCode,
    pub headers: HashMap<String, String>,
    pub body: Bytes,
    pub chunked: bool,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use segaline::http::mime::MediaType;
/// # use segaline::http::response::{Response, StatusCode};
/// let response = Response::new(StatusCode::Ok)
///     .with_header("Cache-Control", "no-cache")
///     .with_body("{}", MediaType::Json)
///     .build();
///
/// assert_eq!(response.header("content-length"), Some("2"));
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// ```
#[derive(Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    /// Starts a response with an empty body, `content-length: 0` where the
    /// status allows one, and the current `date`.
    pub fn new(status: StatusCode) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-length".to_string(), "0".to_string());
        headers.insert("date".to_string(), format_http_date(Utc::now()));

        Self {
            response: Response {
                version: Version::Http11,
                status,
                headers,
                body: Bytes::new(),
                chunked: false,
            },
        }
        .with_status(status)
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.response.status = status;
        if !status.allows_content_length() {
            self.response.headers.remove("content-length");
        }
        self
    }

    /// Adds or replaces a header. Names are case-insensitive.
    pub fn with_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.response
            .headers
            .insert(key.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        for (key, value) in headers {
            self = self.with_header(&key, value);
        }
        self
    }

    pub fn without_header(mut self, key: &str) -> Self {
        self.response.headers.remove(&key.to_ascii_lowercase());
        self
    }

    /// Sets the body and its content-type, and picks the framing: bodies
    /// above [`MAX_UNCHUNKED_BODY`] go out chunked, everything else gets an
    /// exact content-length.
    pub fn with_body(mut self, body: impl Into<Bytes>, media_type: MediaType) -> Self {
        let body = body.into();
        let len = body.len();
        self.response.body = body;
        self = self.with_header("content-type", media_type.as_str());

        if len > MAX_UNCHUNKED_BODY {
            self.response.chunked = true;
            self.without_header("content-length")
                .with_header("transfer-encoding", "chunked")
        } else {
            self.response.chunked = false;
            self.without_header("transfer-encoding")
                .with_header("content-length", len.to_string())
        }
    }

    /// Builds the final Response.
    pub fn build(mut self) -> Response {
        if !self.response.status.allows_content_length() {
            self.response.headers.remove("content-length");
        }
        self.response
    }
}

impl Response {
    /// Starts building a response with the given status.
    pub fn new(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
    }

    /// Creates a simple 200 OK plain-text response.
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Response::new(StatusCode::Ok)
            .with_body(body, MediaType::Text)
            .build()
    }

    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers
            .get(&key.to_ascii_lowercase())
            .map(|v| v.as_str())
    }
}
