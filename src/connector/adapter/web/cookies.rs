use axum::http::{header, HeaderMap};

/// Cookie holding the provider API key, written by the settings UI.
pub const API_KEY_COOKIE: &str = "apiKey";
/// Cookie naming the server-side chat session of this browser tab.
pub const SESSION_COOKIE: &str = "chatSession";

/// Value of cookie `name` across all `Cookie` headers, quotes stripped.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|line| line.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim().trim_matches('"'))
}

pub fn session_cookie(session_id: &str) -> String {
    format!("{SESSION_COOKIE}={session_id}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for cookie in cookies {
            headers.append(header::COOKIE, HeaderValue::from_str(cookie).unwrap());
        }
        headers
    }

    #[test]
    fn test_finds_cookie_among_several() {
        let headers = headers(&["theme=dark; apiKey=sk-123 ; chatSession=abc"]);
        assert_eq!(cookie_value(&headers, API_KEY_COOKIE), Some("sk-123"));
        assert_eq!(cookie_value(&headers, SESSION_COOKIE), Some("abc"));
    }

    #[test]
    fn test_searches_every_cookie_header() {
        let headers = headers(&["theme=dark", "apiKey=\"sk-quoted\""]);
        assert_eq!(cookie_value(&headers, API_KEY_COOKIE), Some("sk-quoted"));
    }

    #[test]
    fn test_missing_and_prefix_names_do_not_match() {
        let headers = headers(&["apiKeyOld=nope"]);
        assert_eq!(cookie_value(&headers, API_KEY_COOKIE), None);
        assert_eq!(cookie_value(&HeaderMap::new(), API_KEY_COOKIE), None);
    }
}
