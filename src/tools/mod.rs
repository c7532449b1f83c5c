//! Tool-invocation front end.
//!
//! Newline-delimited JSON-RPC 2.0 over stdin/stdout. Clients discover the
//! tools with `tools/list` and invoke them with `tools/call`; every call
//! answers with a text block holding a `{"status": "success"|"error", ...}`
//! envelope, so tool failures never surface as transport errors.
//! Logs go to stderr because stdout carries the protocol.

pub mod handlers;
pub mod protocol;
pub mod server;

pub use handlers::{call_tool, tool_definitions, ToolError};
pub use server::{serve, serve_stdio, ToolServer};
