//! # Connector Layer
//!
//! External integrations implementing application interfaces:
//! - Completion clients (OpenAI-compatible HTTP, offline mock)
//! - Web server (page load, chat API)
//! - CLI API (container, router, controllers)

pub mod adapter;
pub mod api;

pub use adapter::*;
