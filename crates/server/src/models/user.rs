//! User domain type.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use thimble_core::{Email, Permission, UserId};

/// A storefront account.
///
/// The password hash and any pending reset token live only in the store;
/// this type is safe to serialize in API responses.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Email address, lowercased.
    pub email: Email,
    /// Permission set. Never empty after creation.
    pub permissions: BTreeSet<Permission>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether this user holds at least one of the given permissions.
    #[must_use]
    pub fn has_any(&self, required: &[Permission]) -> bool {
        required.iter().any(|p| self.permissions.contains(p))
    }
}
