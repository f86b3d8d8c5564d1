//! Transport module
//!
//! Serves the router over HTTP.

pub mod http;

pub use http::{DEFAULT_HTTP_PORT, HttpConfig, RunningServer, run_http, run_http_blocking};
