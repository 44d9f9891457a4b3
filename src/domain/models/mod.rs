mod completion;
mod conversation;
mod credential;
mod session;
mod turn;

pub use completion::*;
pub use conversation::*;
pub use credential::*;
pub use session::*;
pub use turn::*;
