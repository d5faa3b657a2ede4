//! MCP host: newline-delimited JSON-RPC 2.0 over stdio.
//!
//! `router` maps requests onto the tool registry and the health check;
//! `server` owns the read/dispatch/write loop. Logs never touch stdout.

pub mod router;
pub mod server;

pub use router::McpRouter;
pub use server::McpServer;

/// Protocol revision announced in `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
