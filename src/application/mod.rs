//! # Application Layer
//!
//! Use cases driving a chat session through the completion client interface.

pub mod interfaces;
pub mod use_cases;

pub use interfaces::*;
pub use use_cases::*;
