//! Google Gemini backend.
//!
//! Implements [`LlmBackend`](crate::LlmBackend) over the Generative
//! Language API `generateContent` method.

mod api;
mod client;
mod config;

pub use client::GeminiClient;
pub use config::GeminiConfig;
