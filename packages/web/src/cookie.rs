//! The `sessionToken` cookie: building it on login, clearing it on logout and
//! reading it back from request headers.

use api::auth::SESSION_COOKIE;
use axum::http::{header, HeaderMap, HeaderValue};
use tower_sessions::cookie::{time::Duration, Cookie, SameSite};

/// Attributes shared by the session cookie and its removal.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    /// Adds `Secure`; turn on when served over HTTPS.
    pub secure: bool,
    /// `Max-Age` of a fresh session cookie, equal to the session TTL.
    pub max_age_secs: i64,
}

impl CookieConfig {
    fn base<'a>(&self, value: String) -> Cookie<'a> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .build()
    }

    pub fn session(&self, token: &str) -> Cookie<'static> {
        let mut cookie = self.base(token.to_owned());
        cookie.set_max_age(Duration::seconds(self.max_age_secs));
        cookie
    }

    /// Empty value, `Max-Age=0` and an expiry in the past.
    pub fn removal(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new());
        cookie.make_removal();
        cookie
    }
}

/// `Set-Cookie` header value for `cookie`.
pub fn header_value(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Session token from the request's `Cookie` headers, if any.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned())
}
