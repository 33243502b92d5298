//! Wolfram|Alpha HTTP facade
//!
//! JSON endpoints over [`wolfram_core::WolframClient`]. Every handler answers
//! with a `{success, ...}` envelope; nothing escapes as a bare 500.

pub mod web;

pub use web::{create_router, serve, state::AppState, ServeConfig};
