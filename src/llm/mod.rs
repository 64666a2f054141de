//! Client for the locally hosted language model server.
//!
//! The model runs behind a llama.cpp-style HTTP server speaking the
//! OpenAI-compatible chat-completions protocol; everything here is plain
//! HTTP against that endpoint.

pub mod client;
pub mod config;
pub mod types;

pub use client::LlmClient;
pub use config::ModelConfig;
pub use types::{ChatMessage, SqlAnswer, parse_sql_answer};
