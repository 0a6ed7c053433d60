//! OpenAI-compatible chat-completions engine
//!
//! Works with any provider exposing `POST {base_url}/chat/completions`
//! (Groq, OpenAI, local gateways).

mod client;

pub use client::OpenAiCompatibleEngine;
