//! Wolfram|Alpha MCP Library
//!
//! Exposes Wolfram|Alpha queries as MCP tools: a general query, plus math,
//! science and fact variants that differ in parameter presets and framing.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use wolfram_mcp::WolframMcpServer;
//!
//! let server = WolframMcpServer::new(client);
//! let result = server.call_tool("wolfram_fact", serde_json::json!({"question": "capital of Japan"})).await?;
//! ```
//!
//! # Configuration
//! Set `WOLFRAM_APPID` and `WOLFRAM_SIG_SALT`, or configure in `~/.wolfram/wolfram.toml`

pub mod server;

// Re-export main server type
pub use server::{ToolCallError, WolframMcpServer};

// Re-export parameter types for direct API usage
pub use server::{FactParams, MathParams, ScienceParams, WolframQueryParams};
