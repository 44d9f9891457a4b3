mod render_transcript;
mod submit_message;

pub use render_transcript::*;
pub use submit_message::*;
