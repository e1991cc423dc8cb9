//! OpenAI-compatible backend.
//!
//! Talks to any `chat/completions` endpoint (GitHub Models, OpenAI, local
//! gateways) with bearer-token authentication.

mod api;
mod client;
mod config;

pub use client::OpenAiClient;
pub use config::OpenAiConfig;
