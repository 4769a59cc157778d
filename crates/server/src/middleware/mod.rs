//! Request middleware: session cookies and caller resolution.

pub mod auth;
pub mod session;

pub use auth::{CurrentUser, RequireAuth};
pub use session::{SESSION_COOKIE_NAME, clear_session_cookie_header, session_cookie_header};
