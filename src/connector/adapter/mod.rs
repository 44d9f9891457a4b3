mod mock_completion_client;
mod openai_completion_client;
pub mod web;

pub use mock_completion_client::*;
pub use openai_completion_client::*;
