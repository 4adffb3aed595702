//! Request-target parsing.
//!
//! A request target comes in one of four shapes and which shapes are legal
//! depends on the method:
//!
//! - **origin**: `/path?query` (the usual case)
//! - **absolute**: `http://user@host:port/path?query`
//! - **authority**: `host:port` (CONNECT only)
//! - **asterisk**: `*` (OPTIONS only)
//!
//! Path segments and query pairs are percent-decoded once here; nothing
//! downstream ever sees the raw encoded form.

use std::collections::BTreeMap;
use std::fmt;

use crate::http::request::Method;

/// Longest request target accepted, in bytes.
pub const MAX_URI_LENGTH: usize = 32_768;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    #[error("request uri length maximum exceeded")]
    TooLong,
    #[error("unrecognized request target")]
    UnrecognizedForm,
    #[error("authority with user info in connect request")]
    UserInfoInConnect,
    #[error("invalid user info")]
    InvalidUserInfo,
    #[error("invalid host")]
    InvalidHost,
    #[error("invalid port")]
    InvalidPort,
    #[error("empty intermediate path segment")]
    EmptySegment,
    #[error("invalid path segment: {0}")]
    InvalidSegment(String),
    #[error("path traversal attempt")]
    Traversal,
    #[error("invalid query parameter: {0}")]
    InvalidQuery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UriForm {
    Origin,
    Absolute,
    Authority,
    Asterisk,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

/// A parsed request target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri {
    form: UriForm,
    scheme: Scheme,
    user_info: Option<String>,
    host: String,
    port: Option<u16>,
    path: Vec<String>,
    query: BTreeMap<String, String>,
}

impl Uri {
    fn empty(form: UriForm, scheme: Scheme) -> Self {
        Self {
            form,
            scheme,
            user_info: None,
            host: String::new(),
            port: None,
            path: Vec::new(),
            query: BTreeMap::new(),
        }
    }

    /// Parses `raw` as the request target of a `method` request.
    ///
    /// # Example
    ///
    /// ```
    /// # use segaline::http::request::Method;
    /// # use segaline::http::uri::{Uri, UriForm};
    /// let uri = Uri::parse(Method::GET, "/docs/a%20b.txt?lang=en").unwrap();
    /// assert_eq!(uri.form(), UriForm::Origin);
    /// assert_eq!(uri.segments(), ["docs", "a b.txt"]);
    /// assert_eq!(uri.query_param("lang"), Some("en"));
    /// ```
    pub fn parse(method: Method, raw: &str) -> Result<Self, UriError> {
        if raw.len() > MAX_URI_LENGTH {
            return Err(UriError::TooLong);
        }

        if raw == "*" && method == Method::OPTIONS {
            return Ok(Uri::empty(UriForm::Asterisk, Scheme::Http));
        }

        if method == Method::CONNECT {
            let (user_info, host, port) = parse_authority(raw)?;
            if user_info.is_some() {
                return Err(UriError::UserInfoInConnect);
            }
            let mut uri = Uri::empty(UriForm::Authority, Scheme::Http);
            uri.host = host;
            uri.port = port;
            return Ok(uri);
        }

        if raw.starts_with("http:") || raw.starts_with("https:") {
            return parse_absolute(raw);
        }

        if raw.starts_with('/') {
            let mut uri = Uri::empty(UriForm::Origin, Scheme::Http);
            (uri.path, uri.query) = parse_path_and_query(raw)?;
            return Ok(uri);
        }

        Err(UriError::UnrecognizedForm)
    }

    pub fn form(&self) -> UriForm {
        self.form
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn user_info(&self) -> Option<&str> {
        self.user_info.as_deref()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Decoded path segments; `/` has none.
    pub fn segments(&self) -> &[String] {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(|v| v.as_str())
    }

    /// The decoded path joined back together, always starting with `/`.
    pub fn path_string(&self) -> String {
        format!("/{}", self.path.join("/"))
    }

    fn write_authority(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(user) = &self.user_info {
            write!(f, "{}@", percent_encode(user.as_bytes()))?;
        }
        f.write_str(&percent_encode(self.host.as_bytes()))?;
        if let Some(port) = self.port {
            write!(f, ":{}", port)?;
        }
        Ok(())
    }

    fn write_path_and_query(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("/")?;
        for (i, segment) in self.path.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&percent_encode(segment.as_bytes()))?;
        }

        for (i, (key, value)) in self.query.iter().enumerate() {
            f.write_str(if i == 0 { "?" } else { "&" })?;
            write!(
                f,
                "{}={}",
                percent_encode(key.as_bytes()),
                percent_encode(value.as_bytes())
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for Uri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            UriForm::Asterisk => f.write_str("*"),
            UriForm::Authority => self.write_authority(f),
            UriForm::Absolute => {
                write!(f, "{}://", self.scheme.as_str())?;
                self.write_authority(f)?;
                self.write_path_and_query(f)
            }
            UriForm::Origin => self.write_path_and_query(f),
        }
    }
}

fn parse_absolute(raw: &str) -> Result<Uri, UriError> {
    let (scheme, rest) = if let Some(rest) = raw.strip_prefix("https:") {
        (Scheme::Https, rest)
    } else if let Some(rest) = raw.strip_prefix("http:") {
        (Scheme::Http, rest)
    } else {
        return Err(UriError::UnrecognizedForm);
    };

    let mut uri = Uri::empty(UriForm::Absolute, scheme);

    let path_part = match rest.strip_prefix("//") {
        Some(after) => {
            let end = after.find(['/', '?']).unwrap_or(after.len());
            let (authority, remainder) = after.split_at(end);
            (uri.user_info, uri.host, uri.port) = parse_authority(authority)?;
            remainder
        }
        None => rest,
    };

    (uri.path, uri.query) = if path_part.starts_with('/') {
        parse_path_and_query(path_part)?
    } else {
        parse_path_and_query(&format!("/{}", path_part))?
    };

    Ok(uri)
}

type Authority = (Option<String>, String, Option<u16>);

fn parse_authority(raw: &str) -> Result<Authority, UriError> {
    let (user_info, rest) = match raw.split_once('@') {
        Some((user, rest)) => {
            if !user.bytes().all(is_user_info_char) {
                return Err(UriError::InvalidUserInfo);
            }
            (Some(percent_decode_str(user).ok_or(UriError::InvalidUserInfo)?), rest)
        }
        None => (None, raw),
    };

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => (host, Some(parse_port(port)?)),
        None => (rest, None),
    };

    if !is_host(host) {
        return Err(UriError::InvalidHost);
    }

    let host = percent_decode_str(host).ok_or(UriError::InvalidHost)?;
    Ok((user_info, host, port))
}

fn parse_port(raw: &str) -> Result<u16, UriError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UriError::InvalidPort);
    }
    raw.parse().map_err(|_| UriError::InvalidPort)
}

fn parse_path_and_query(raw: &str) -> Result<(Vec<String>, BTreeMap<String, String>), UriError> {
    let (path, query) = match raw.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (raw, None),
    };

    if path.contains("//") {
        return Err(UriError::EmptySegment);
    }

    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let mut segments = Vec::new();
    if !trimmed.is_empty() {
        for segment in trimmed.split('/') {
            segments.push(parse_segment(segment)?);
        }
    }

    let mut params = BTreeMap::new();
    if let Some(query) = query.filter(|q| !q.is_empty()) {
        for param in query.split('&') {
            if !param.bytes().all(is_query_char) {
                return Err(UriError::InvalidQuery(param.to_string()));
            }
            let (key, value) = param
                .split_once('=')
                .filter(|(_, value)| !value.contains('='))
                .ok_or_else(|| UriError::InvalidQuery(param.to_string()))?;
            let invalid = || UriError::InvalidQuery(param.to_string());
            let key = percent_decode_str(key).ok_or_else(invalid)?;
            let value = percent_decode_str(value).ok_or_else(invalid)?;
            params.insert(key, value);
        }
    }

    Ok((segments, params))
}

fn parse_segment(segment: &str) -> Result<String, UriError> {
    if segment.is_empty() {
        return Err(UriError::EmptySegment);
    }
    if !segment.bytes().all(is_path_char) {
        return Err(UriError::InvalidSegment(segment.to_string()));
    }

    let decoded = percent_decode(segment.as_bytes());
    if decoded == b".." {
        return Err(UriError::Traversal);
    }
    // An encoded separator would let a segment smuggle `..` past the check above.
    if decoded.iter().any(|&b| b == b'/' || b == 0) {
        return Err(UriError::InvalidSegment(segment.to_string()));
    }

    String::from_utf8(decoded).map_err(|_| UriError::InvalidSegment(segment.to_string()))
}

fn is_unreserved(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
}

fn is_sub_delim(b: u8) -> bool {
    matches!(
        b,
        b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'='
    )
}

fn is_host_char(b: u8) -> bool {
    is_unreserved(b) || is_sub_delim(b) || b == b'%'
}

fn is_user_info_char(b: u8) -> bool {
    is_host_char(b) || b == b':'
}

fn is_path_char(b: u8) -> bool {
    is_user_info_char(b) || b == b'@'
}

fn is_query_char(b: u8) -> bool {
    is_path_char(b) || b == b'/' || b == b'?'
}

fn is_host(host: &str) -> bool {
    if host.is_empty() {
        return false;
    }
    // Anything that looks like a dotted quad has to be a real one.
    if host.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return is_ipv4(host);
    }
    host.bytes().all(is_host_char)
}

fn is_ipv4(host: &str) -> bool {
    let octets: Vec<&str> = host.split('.').collect();
    octets.len() == 4 && octets.iter().all(|octet| is_octet(octet))
}

fn is_octet(octet: &str) -> bool {
    if octet.is_empty() || octet.len() > 3 || !octet.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    matches!(octet.parse::<u16>(), Ok(0..=255))
}

/// Encodes every byte outside the visible ASCII range as `%XX`.
pub fn percent_encode(input: &[u8]) -> String {
    let mut encoded = String::with_capacity(input.len());
    for &b in input {
        if (0x21..=0x7E).contains(&b) {
            encoded.push(b as char);
        } else {
            encoded.push_str(&format!("%{:02X}", b));
        }
    }
    encoded
}

/// Decodes `%XX` sequences. Incomplete or non-hex sequences are copied
/// through unchanged.
pub fn percent_decode(input: &[u8]) -> Vec<u8> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'%' && i + 2 < input.len() {
            if let (Some(high), Some(low)) = (hex_value(input[i + 1]), hex_value(input[i + 2])) {
                decoded.push(high << 4 | low);
                i += 3;
                continue;
            }
        }
        decoded.push(input[i]);
        i += 1;
    }
    decoded
}

/// Decoded text, or `None` when the decoded bytes are not UTF-8.
fn percent_decode_str(input: &str) -> Option<String> {
    String::from_utf8(percent_decode(input.as_bytes())).ok()
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
