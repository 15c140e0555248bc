//! Transport layer for the HTTP API.

pub mod cors;
pub mod http;

pub use http::{router, HttpTransport, RouterOptions};
