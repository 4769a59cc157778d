//! Session token issuer.
//!
//! Issues and verifies the signed bearer token that carries the caller's
//! identity. Tokens are HMAC-signed JWTs holding only the user ID - they
//! grant nothing beyond identity lookup, which is what makes the stateless
//! design acceptable: there is no server-side revocation list, so a
//! signed-out token stays cryptographically valid until its natural expiry.

use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use thimble_core::UserId;

/// How long an issued token (and its cookie) lives: one year.
pub const SESSION_TTL_SECONDS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// User ID.
    sub: i32,
    iat: i64,
    exp: i64,
}

/// Signs and verifies session tokens with the server-held secret.
pub struct SessionTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionTokens {
    /// Build the keypair from the app secret.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Issue a signed token encoding the user's identity.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.as_i32(),
            iat: now,
            exp: now + SESSION_TTL_SECONDS,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
    }

    /// Recover the user ID from a token.
    ///
    /// Fails silently: a bad signature, an expired token, or garbage input
    /// all yield `None`. Downstream code treats a missing identity as an
    /// anonymous caller, never as an error.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<UserId> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &Validation::default())
            .ok()
            .map(|data| UserId::new(data.claims.sub))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn tokens() -> SessionTokens {
        SessionTokens::new(&SecretString::from("0123456789abcdef0123456789abcdef"))
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let tokens = tokens();
        let token = tokens.issue(UserId::new(42)).unwrap();
        assert_eq!(tokens.verify(&token), Some(UserId::new(42)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert_eq!(tokens().verify("not-a-token"), None);
        assert_eq!(tokens().verify(""), None);
    }

    #[test]
    fn test_verify_rejects_foreign_secret() {
        let other = SessionTokens::new(&SecretString::from("ffffffffffffffffffffffffffffffff"));
        let token = other.issue(UserId::new(1)).unwrap();
        assert_eq!(tokens().verify(&token), None);
    }
}
