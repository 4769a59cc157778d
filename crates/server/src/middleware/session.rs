//! Session cookie plumbing.
//!
//! The session token rides in an `HttpOnly` cookie so browser scripts can
//! never read it. Headers are built by hand; reading goes through
//! `axum-extra`'s `CookieJar`.

use crate::services::session::SESSION_TTL_SECONDS;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "thimble_token";

/// `Set-Cookie` value that installs a session token.
#[must_use]
pub fn session_cookie_header(token: &str) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={SESSION_TTL_SECONDS}"
    )
}

/// `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn clear_session_cookie_header() -> String {
    format!("{SESSION_COOKIE_NAME}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_is_http_only() {
        let header = session_cookie_header("abc.def.ghi");
        assert!(header.starts_with("thimble_token=abc.def.ghi;"));
        assert!(header.contains("HttpOnly"));
        assert!(header.contains("SameSite=Lax"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let header = clear_session_cookie_header();
        assert!(header.contains("Max-Age=0"));
    }
}
