//! HTTP JSON API.
//!
//! Thin transport over `CoreState`: every route is nested under `/api/`,
//! passes through the access-log middleware, and reports failures as
//! `{"error": {"code", "message"}}` bodies.
//!
//! The router is composable: `api_router()` returns a `Router` that can be
//! mounted on any axum server instance.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_http_server, HttpServer, HttpServerSession};
pub use types::ApiContext;
