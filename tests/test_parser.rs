use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use segaline::http::error::ParseError;
use segaline::http::parser::parse_request;
use segaline::http::reader::{DEFAULT_READ_TIMEOUT, TimedReader};
use segaline::http::request::{Method, Request, Version};
use segaline::http::uri::UriError;
use tokio::io::{AsyncWriteExt, BufReader};

fn peer() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::new(10, 0, 0, 7), 51000))
}

async fn parse(raw: &[u8]) -> Result<Request, ParseError> {
    parse_with_sink(raw).await.0
}

async fn parse_with_sink(raw: &[u8]) -> (Result<Request, ParseError>, Vec<u8>) {
    let mut reader = TimedReader::new(raw, DEFAULT_READ_TIMEOUT);
    let mut sink = Vec::new();
    let result = parse_request(&mut reader, &mut sink, peer()).await;
    (result, sink)
}

#[tokio::test]
async fn test_parse_simple_get_request() {
    let parsed = parse(b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n").await.unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.uri.path_string(), "/");
    assert_eq!(parsed.version, Version::Http11);
    assert_eq!(parsed.headers.get("host").unwrap(), "example.com");
    assert_eq!(parsed.remote_addr, peer());
}

#[tokio::test]
async fn test_parse_post_request_with_body() {
    let parsed = parse(b"POST /api HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello")
        .await
        .unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(parsed.uri.segments(), ["api"]);
    assert_eq!(parsed.body, b"hello".to_vec());
}

#[tokio::test]
async fn test_parse_every_method_and_version() {
    let methods = vec![
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::OPTIONS),
        ("TRACE", Method::TRACE),
    ];
    let versions = vec![
        ("HTTP/0.9", Version::Http09),
        ("HTTP/1.0", Version::Http10),
        ("HTTP/1.1", Version::Http11),
    ];

    for (method_str, expected_method) in &methods {
        for (version_str, expected_version) in &versions {
            let req = format!("{} /index.html {}\r\nHost: a\r\n\r\n", method_str, version_str);
            let parsed = parse(req.as_bytes()).await.unwrap();
            assert_eq!(parsed.method, *expected_method);
            assert_eq!(parsed.version, *expected_version);
        }
    }

    let parsed = parse(b"CONNECT example.com:443 HTTP/1.1\r\nHost: example.com\r\n\r\n")
        .await
        .unwrap();
    assert_eq!(parsed.method, Method::CONNECT);
    assert_eq!(parsed.uri.port(), Some(443));
}

#[tokio::test]
async fn test_parse_header_names_are_lowercased_and_values_trimmed() {
    let parsed = parse(b"GET / HTTP/1.1\r\nHOST:   example.com \t\r\nX-Custom-Header:Value With Spaces\r\n\r\n")
        .await
        .unwrap();

    assert_eq!(parsed.headers.get("host").unwrap(), "example.com");
    assert_eq!(parsed.headers.get("x-custom-header").unwrap(), "Value With Spaces");
    assert!(!parsed.headers.contains_key("HOST"));
    assert_eq!(parsed.header("X-CUSTOM-HEADER"), Some("Value With Spaces"));
}

#[tokio::test]
async fn test_parse_request_line_needs_three_tokens() {
    for line in [
        "GET /\r\n",
        "GET / HTTP/1.1 extra\r\n",
        "GET  / HTTP/1.1\r\n",
        "\r\n",
    ] {
        let req = format!("{}Host: a\r\n\r\n", line);
        let result = parse(req.as_bytes()).await;
        assert!(
            matches!(result, Err(ParseError::MalformedRequestLine)),
            "{:?} -> {:?}",
            line,
            result
        );
    }
}

#[tokio::test]
async fn test_parse_unknown_method() {
    let result = parse(b"PATCH / HTTP/1.1\r\nHost: a\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::UnsupportedMethod(m)) if m == "PATCH"));

    let result = parse(b"get / HTTP/1.1\r\nHost: a\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::UnsupportedMethod(_))));
}

#[tokio::test]
async fn test_parse_unknown_version() {
    let result = parse(b"GET / HTTP/2.0\r\nHost: a\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::UnsupportedVersion(v)) if v == "HTTP/2.0"));
}

#[tokio::test]
async fn test_parse_rejects_bad_targets() {
    for target in ["/a//b", "/a/../b", "/a/%2e%2E/b", "relative", "/a<b", "/%FF", "/?k=%FE"] {
        let req = format!("GET {} HTTP/1.1\r\nHost: a\r\n\r\n", target);
        let result = parse(req.as_bytes()).await;
        assert!(
            matches!(result, Err(ParseError::InvalidRequestTarget(_))),
            "{:?} -> {:?}",
            target,
            result
        );
    }
}

#[tokio::test]
async fn test_parse_oversized_target() {
    let req = format!("GET /{} HTTP/1.1\r\nHost: a\r\n\r\n", "a".repeat(40_000));
    let result = parse(req.as_bytes()).await;

    let err = result.unwrap_err();
    assert!(matches!(err, ParseError::InvalidRequestTarget(UriError::TooLong)));
    assert_eq!(err.status().as_u16(), 414);
}

#[tokio::test]
async fn test_parse_malformed_header() {
    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\nBrokenHeader\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));

    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\nBad Name: x\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));

    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\nX-Ctl: a\x01b\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidHeader(_))));
}

#[tokio::test]
async fn test_parse_duplicate_headers_ignore_case_and_value() {
    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\nAccept: */*\r\naccept: */*\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::DuplicateHeader(name)) if name == "accept"));

    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\nHOST: b\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::DuplicateHeader(_))));
}

#[tokio::test]
async fn test_parse_missing_host() {
    let result = parse(b"GET / HTTP/1.1\r\nAccept: */*\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::MissingHostHeader)));
}

#[tokio::test]
async fn test_parse_too_many_headers() {
    let mut req = String::from("GET / HTTP/1.1\r\nHost: a\r\n");
    for i in 0..120 {
        req.push_str(&format!("X-{}: v\r\n", i));
    }
    req.push_str("\r\n");

    let err = parse(req.as_bytes()).await.unwrap_err();
    assert!(matches!(err, ParseError::HeadersTooLarge));
    assert_eq!(err.status().as_u16(), 431);
}

#[tokio::test]
async fn test_parse_request_with_empty_body() {
    let parsed = parse(b"POST /api HTTP/1.1\r\nHost: a\r\nContent-Length: 0\r\n\r\n")
        .await
        .unwrap();

    assert_eq!(parsed.body.len(), 0);
}

#[tokio::test]
async fn test_parse_request_with_binary_body() {
    let parsed = parse(b"POST /upload HTTP/1.1\r\nHost: a\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03")
        .await
        .unwrap();

    assert_eq!(parsed.body, vec![0, 1, 2, 3]);
}

#[tokio::test]
async fn test_parse_short_body_fails() {
    let mut req = b"POST /upload HTTP/1.1\r\nHost: a\r\nContent-Length: 100\r\n\r\n".to_vec();
    req.extend_from_slice(&[b'z'; 50]);

    let result = parse(&req).await;
    assert!(matches!(result, Err(ParseError::Transport(_))));
}

#[tokio::test]
async fn test_parse_content_length_limits() {
    let result = parse(b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 65537\r\n\r\n").await;
    let err = result.unwrap_err();
    assert!(matches!(err, ParseError::ContentLengthExceeded));
    assert_eq!(err.status().as_u16(), 413);

    let result = parse(b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: ten\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidContentLength(_))));
}

#[tokio::test]
async fn test_parse_chunked_body() {
    let parsed = parse(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntest\r\n0\r\n\r\n")
        .await
        .unwrap();

    assert_eq!(parsed.body, b"test".to_vec());
}

#[tokio::test]
async fn test_parse_chunked_body_multiple_chunks_with_extensions() {
    let parsed = parse(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n\
          5;ext=1\r\nhello\r\n1\r\n \r\nA\r\n0123456789\r\n0\r\n\r\n",
    )
    .await
    .unwrap();

    assert_eq!(parsed.body, b"hello 0123456789".to_vec());
}

#[tokio::test]
async fn test_parse_chunked_trailers_are_validated_but_dropped() {
    let parsed = parse(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n\
          4\r\ntest\r\n0\r\nX-Checksum: abc\r\n\r\n",
    )
    .await
    .unwrap();

    assert_eq!(parsed.body, b"test".to_vec());
    assert!(parsed.header("x-checksum").is_none());
}

#[tokio::test]
async fn test_parse_trailer_cannot_override_header() {
    let result = parse(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n\
          4\r\ntest\r\n0\r\nHost: evil\r\n\r\n",
    )
    .await;

    assert!(matches!(result, Err(ParseError::DuplicateTrailerHeader(name)) if name == "host"));
}

#[tokio::test]
async fn test_parse_trailer_internal_duplicate() {
    let result = parse(
        b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n\
          0\r\nX-A: 1\r\nx-a: 2\r\n\r\n",
    )
    .await;

    assert!(matches!(result, Err(ParseError::DuplicateHeader(_))));
}

#[tokio::test]
async fn test_parse_chunk_errors() {
    let result = parse(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\nzz\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidChunkSize(_))));

    let result = parse(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n2000\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidChunkSize(_))));

    let result = parse(b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntestX\r\n0\r\n\r\n").await;
    assert!(matches!(result, Err(ParseError::InvalidChunk)));
}

#[tokio::test]
async fn test_parse_chunked_total_is_bounded() {
    let mut req = b"POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    for _ in 0..17 {
        req.extend_from_slice(b"1000\r\n");
        req.extend_from_slice(&[b'q'; 4096]);
        req.extend_from_slice(b"\r\n");
    }
    req.extend_from_slice(b"0\r\n\r\n");

    let result = parse(&req).await;
    assert!(matches!(result, Err(ParseError::ContentLengthExceeded)));
}

#[tokio::test]
async fn test_parse_unsupported_transfer_encoding() {
    for encoding in ["gzip", "gzip, chunked", "identity"] {
        let req = format!("POST / HTTP/1.1\r\nHost: a\r\nTransfer-Encoding: {}\r\n\r\n", encoding);
        let err = parse(req.as_bytes()).await.unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedTransferEncoding(_)));
        assert_eq!(err.status().as_u16(), 501);
    }
}

#[tokio::test]
async fn test_parse_sends_100_continue_before_body() {
    let (result, sink) = parse_with_sink(
        b"PUT /f HTTP/1.1\r\nHost: a\r\nExpect: 100-continue\r\nContent-Length: 2\r\n\r\nok",
    )
    .await;

    assert_eq!(result.unwrap().body, b"ok".to_vec());
    let interim = String::from_utf8(sink).unwrap();
    assert!(interim.starts_with("HTTP/1.1 100 Continue\r\n"));
    assert!(interim.ends_with("\r\n\r\n"));
    assert!(!interim.contains("content-length"));
}

#[tokio::test]
async fn test_parse_no_100_continue_without_body_or_expect() {
    let (_, sink) = parse_with_sink(b"GET / HTTP/1.1\r\nHost: a\r\nExpect: 100-continue\r\n\r\n").await;
    assert!(sink.is_empty());

    let (_, sink) = parse_with_sink(b"POST / HTTP/1.1\r\nHost: a\r\nContent-Length: 1\r\n\r\nx").await;
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_parse_clean_close_before_request() {
    let result = parse(b"").await;
    assert!(matches!(result, Err(ParseError::ConnectionClosed)));

    let result = parse(b"GET / HTTP/1.1\r\nHost: a\r\n").await;
    assert!(matches!(result, Err(ParseError::Transport(_))));
}

#[tokio::test]
async fn test_parse_times_out_on_stalled_headers() {
    let (mut client, server) = tokio::io::duplex(1024);
    client.write_all(b"GET / HTTP/1.1\r\nHost: a\r\n").await.unwrap();

    let mut reader = TimedReader::new(BufReader::new(server), Duration::from_millis(50));
    let mut sink = Vec::new();
    let err = parse_request(&mut reader, &mut sink, peer()).await.unwrap_err();

    assert!(matches!(err, ParseError::TimeoutReached));
    assert_eq!(err.status().as_u16(), 408);
    drop(client);
}

#[tokio::test]
async fn test_parse_consecutive_requests_on_one_stream() {
    let raw = b"GET /one HTTP/1.1\r\nHost: a\r\n\r\nPOST /two HTTP/1.1\r\nHost: a\r\nContent-Length: 3\r\n\r\nabcGET /three HTTP/1.1\r\nHost: a\r\n\r\n";
    let mut reader = TimedReader::new(&raw[..], DEFAULT_READ_TIMEOUT);
    let mut sink = Vec::new();

    let first = parse_request(&mut reader, &mut sink, peer()).await.unwrap();
    let second = parse_request(&mut reader, &mut sink, peer()).await.unwrap();
    let third = parse_request(&mut reader, &mut sink, peer()).await.unwrap();

    assert_eq!(first.uri.path_string(), "/one");
    assert_eq!(second.body, b"abc".to_vec());
    assert_eq!(third.uri.path_string(), "/three");
    assert!(matches!(
        parse_request(&mut reader, &mut sink, peer()).await,
        Err(ParseError::ConnectionClosed)
    ));
}
