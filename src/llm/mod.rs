//! Hosted language-model access.

pub mod client;

pub use client::{ChatClient, LlmError};
