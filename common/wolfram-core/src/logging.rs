//! Tracing setup shared by the MCP server and the HTTP facade
//!
//! Logs always go to stderr: the MCP server speaks JSON-RPC on stdout, and
//! the HTTP facade's CLI prints results there.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing for a binary
///
/// - `RUST_LOG` filtering, defaulting to `info` for `crate_name` and the core
/// - `LOG_FORMAT=json` for structured JSON lines, plain text otherwise
pub fn init_tracing(crate_name: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("{}=info", crate_name).parse()?)
        .add_directive("wolfram_core=info".parse()?);

    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init();
    }

    Ok(())
}
