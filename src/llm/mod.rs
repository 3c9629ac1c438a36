//! LLM provider abstraction.

mod client;

pub use client::{CompletionRequest, HttpLlmClient, LLMClient};
