//! Permission enum for access control.
//!
//! A user holds a set of these; guards check the intersection of the
//! caller's set against a required set.

use core::fmt;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A named capability drawn from a closed set.
///
/// Wire and database representation is the uppercase name (`"ITEMDELETE"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Baseline permission every account holds after signup.
    #[serde(rename = "USER")]
    User,
    /// Full administrative access.
    #[serde(rename = "ADMIN")]
    Admin,
    /// May create catalog items.
    #[serde(rename = "ITEMCREATE")]
    ItemCreate,
    /// May update catalog items they do not own.
    #[serde(rename = "ITEMUPDATE")]
    ItemUpdate,
    /// May delete catalog items they do not own.
    #[serde(rename = "ITEMDELETE")]
    ItemDelete,
    /// May replace other users' permission sets.
    #[serde(rename = "PERMISSIONUPDATE")]
    PermissionUpdate,
}

/// Error returned when parsing an unknown permission name.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown permission: {0}")]
pub struct PermissionParseError(pub String);

impl Permission {
    /// All permissions, in a stable order.
    pub const ALL: [Self; 6] = [
        Self::User,
        Self::Admin,
        Self::ItemCreate,
        Self::ItemUpdate,
        Self::ItemDelete,
        Self::PermissionUpdate,
    ];

    /// The uppercase wire/database name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Admin => "ADMIN",
            Self::ItemCreate => "ITEMCREATE",
            Self::ItemUpdate => "ITEMUPDATE",
            Self::ItemDelete => "ITEMDELETE",
            Self::PermissionUpdate => "PERMISSIONUPDATE",
        }
    }

    /// The permission set every new account starts with.
    #[must_use]
    pub fn default_set() -> BTreeSet<Self> {
        BTreeSet::from([Self::User])
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Permission {
    type Err = PermissionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            "ITEMCREATE" => Ok(Self::ItemCreate),
            "ITEMUPDATE" => Ok(Self::ItemUpdate),
            "ITEMDELETE" => Ok(Self::ItemDelete),
            "PERMISSIONUPDATE" => Ok(Self::PermissionUpdate),
            other => Err(PermissionParseError(other.to_owned())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_roundtrip() {
        for perm in Permission::ALL {
            let parsed: Permission = perm.as_str().parse().unwrap();
            assert_eq!(parsed, perm);
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert!("GODMODE".parse::<Permission>().is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&Permission::ItemDelete).unwrap();
        assert_eq!(json, "\"ITEMDELETE\"");
        let back: Permission = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Permission::ItemDelete);
    }

    #[test]
    fn test_default_set() {
        let set = Permission::default_set();
        assert_eq!(set.len(), 1);
        assert!(set.contains(&Permission::User));
    }
}
