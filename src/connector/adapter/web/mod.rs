//! HTTP surface: the chat page and its JSON API.

mod cookies;
mod page;
mod server;
mod sessions;

pub use cookies::{cookie_value, API_KEY_COOKIE, SESSION_COOKIE};
pub use page::{is_wechat, render_page, PageProps};
pub use server::{router, serve, ApiError, ChatBody, ChatReply, WebState};
pub use sessions::{SessionRegistry, DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_SESSIONS};
