use axum::http::{header, HeaderMap};
use serde::Serialize;

use super::cookies::{cookie_value, API_KEY_COOKIE};
use crate::application::{EntryKind, TranscriptEntry};
use crate::domain::{Credential, Side};

const PAGE_TITLE: &str = "ChatGPT";

/// Initial render parameters derived from the page request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageProps {
    pub logged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(rename = "isWeChat")]
    pub is_wechat: bool,
}

impl PageProps {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let logged = cookie_value(headers, API_KEY_COOKIE)
            .and_then(Credential::new)
            .is_some();
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let is_wechat = user_agent.as_deref().is_some_and(is_wechat);

        Self {
            logged,
            user_agent,
            is_wechat,
        }
    }
}

/// WeChat's in-app browser draws its own title bar.
pub fn is_wechat(user_agent: &str) -> bool {
    user_agent.to_lowercase().contains("micromessenger")
}

pub fn render_page(props: &PageProps, entries: &[TranscriptEntry]) -> String {
    let props_json = serde_json::to_string(props)
        .unwrap_or_else(|_| "{}".to_string())
        .replace("</", "<\\/");

    let header = if props.is_wechat {
        String::new()
    } else {
        format!("<h1 class=\"title\">{PAGE_TITLE}</h1>\n")
    };

    let mut messages = String::new();
    for entry in entries {
        messages.push_str(&render_entry(entry));
        messages.push('\n');
    }

    let composer = if props.logged {
        "<form id=\"composer\"><textarea name=\"text\"></textarea><button type=\"submit\">Send</button></form>"
    } else {
        "<p class=\"login-hint\">Set your API key to start chatting.</p>"
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1, viewport-fit=cover\">\n\
<meta name=\"description\" content=\"A Personal ChatGPT Client\">\n\
<title>{PAGE_TITLE}</title>\n</head>\n<body>\n\
<script id=\"page-props\" type=\"application/json\">{props_json}</script>\n\
<main>\n{header}<div id=\"messages\">\n{messages}</div>\n{composer}\n</main>\n</body>\n</html>\n"
    )
}

fn render_entry(entry: &TranscriptEntry) -> String {
    let class = match entry.kind {
        EntryKind::Notice => "notice",
        EntryKind::Welcome | EntryKind::Message => match entry.side {
            Side::User => "message user",
            Side::Assistant => "message assistant",
            Side::System => "message system",
        },
        EntryKind::Loading => "message assistant loading",
    };

    let body = match &entry.error {
        Some(error) => format!("<span class=\"error\">{}</span>", escape_html(&error.message)),
        None => escape_html(&entry.text),
    };

    format!("<div class=\"{class}\">{body}</div>")
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\n' => out.push_str("<br>"),
            _ => out.push(c),
        }
    }
    out
}
