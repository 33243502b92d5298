//! Wolfram|Alpha core
//!
//! Signed queries against the Wolfram|Alpha mobile endpoint and normalization
//! of the Pod/Subpod response into stable text shapes.
//!
//! # Usage as Library
//!
//! ```rust,ignore
//! use wolfram_core::{Config, WolframClient};
//!
//! let config = Config::load()?;
//! let client = WolframClient::from_config(&config)?;
//! let answer = client.get_primary_text("2+2").await?;
//! ```
//!
//! # Configuration
//! Set `WOLFRAM_APPID` and `WOLFRAM_SIG_SALT`, or configure them in
//! `~/.wolfram/wolfram.toml`

pub mod client;
pub mod config;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod params;
pub mod presets;
pub mod signer;
pub mod transport;
pub mod types;

pub use client::{FetchedQuery, WolframClient, NO_RESULT};
pub use config::{Config, ProviderConfig, QueryDefaults};
pub use error::{WolframError, WolframResult};
pub use logging::init_tracing;
pub use normalize::{all_pods_as_map, first_pod_text, pod_text, render_sections, Lookup, PodMap};
pub use params::{ParamValue, Query, QueryParams};
pub use signer::{Endpoint, RequestSigner, SignedRequest};
pub use transport::{HttpTransport, Transport};
pub use types::{parse_response, ParsedResponse, Pod, QueryResult, Subpod};
