//! Shared application state

use chrono::{DateTime, Utc};
use wolfram_core::WolframClient;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Signed query client, shared by every handler
    pub client: WolframClient,
    /// When the server was started
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(client: WolframClient) -> Self {
        Self {
            client,
            started_at: Utc::now(),
        }
    }
}
