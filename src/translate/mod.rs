//! Translation between the caller's chat schema and the `OpenAI` Chat Completions format.
//!
//! Inbound `{system, messages}` bodies become Chat Completions requests, and
//! completion replies become Anthropic-style `{content, role}` messages. All
//! translation functions are pure (no I/O).

pub mod anthropic_types;
pub mod openai_types;
pub mod request;
pub mod response;
