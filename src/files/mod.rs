//! Static file serving
//!
//! This module implements the [`Handler`](crate::http::connection::Handler)
//! that maps request paths onto a directory, renders error pages from a
//! template, and echoes TRACE requests.

pub mod server;

pub use server::FileServer;
