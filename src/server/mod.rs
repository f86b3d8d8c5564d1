//! HTTP surface
//!
//! A thin axum router over the authorization kernel. The kernel decides;
//! this layer only maps decisions onto status codes and JSON bodies.

pub mod handler;

pub use handler::{AppState, DecisionBody, router};
