//! # Domain Layer
//!
//! Conversation state, the session that owns it, and the request/turn models.
//! This layer is independent of external frameworks and infrastructure.

pub mod error;
pub mod models;

pub use error::*;
pub use models::*;
