//! Segaline - HTTP/1.x static file server
//!
//! Core library: the HTTP protocol engine, the listener, and the static file
//! handler that sits on top of it.

pub mod config;
pub mod files;
pub mod http;
pub mod server;
