//! ClickUp API access.
//!
//! Thin typed wrapper over the read-only REST endpoints the dashboard needs.

pub mod client;

pub use client::{ClickUpClient, ClientError, TaskQuery};
