//! Authorization guard.
//!
//! Two checks cover every mutating operation: a plain permission-set
//! intersection, and the ownership-or-permission pattern used by operations
//! on owned resources.

use std::collections::BTreeSet;

use thimble_core::{Permission, UserId};

use crate::context::RequestContext;
use crate::error::AppError;
use crate::models::User;

/// Require the user to hold at least one of `required`.
///
/// # Errors
///
/// Returns `AppError::Forbidden` naming the missing permissions otherwise.
pub fn has_permission(user: &User, required: &[Permission]) -> Result<(), AppError> {
    if user.has_any(required) {
        return Ok(());
    }

    let needed: Vec<&str> = required.iter().map(Permission::as_str).collect();
    Err(AppError::Forbidden(format!(
        "you need one of the following permissions: {}",
        needed.join(", ")
    )))
}

/// Ownership-or-permission: the operation is allowed if the caller owns the
/// resource, or holds one of the override permissions.
///
/// # Errors
///
/// Returns `AppError::Forbidden` when neither condition holds.
pub fn ensure_owner_or(
    user: &User,
    owner: UserId,
    override_permissions: &[Permission],
) -> Result<(), AppError> {
    if user.id == owner {
        return Ok(());
    }
    has_permission(user, override_permissions)
        .map_err(|_| AppError::Forbidden("you don't own that resource".to_owned()))
}

/// Replace a user's entire permission set.
///
/// Full replace, not a merge: the target ends up with exactly `permissions`.
///
/// # Errors
///
/// `Unauthorized` for anonymous callers, `Forbidden` without `ADMIN` or
/// `PERMISSIONUPDATE`, `Validation` for an empty set, `NotFound` if the
/// target doesn't exist.
pub async fn update_permissions(
    ctx: &RequestContext,
    target: UserId,
    permissions: BTreeSet<Permission>,
) -> Result<User, AppError> {
    let caller = ctx.caller()?;
    has_permission(caller, &[Permission::Admin, Permission::PermissionUpdate])?;

    // A user's permission set is never empty after creation.
    if permissions.is_empty() {
        return Err(AppError::Validation(
            "permission set cannot be empty".to_owned(),
        ));
    }

    let updated = ctx
        .store
        .replace_permissions(target, &permissions)
        .await
        .map_err(|e| match e {
            crate::store::StoreError::NotFound => {
                AppError::NotFound(format!("no user with id {target}"))
            }
            other => AppError::Store(other),
        })?;

    tracing::info!(
        target = %target,
        by = %caller.id,
        "permission set replaced"
    );
    Ok(updated)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use thimble_core::Email;

    fn user_with(permissions: &[Permission]) -> User {
        User {
            id: UserId::new(1),
            email: Email::parse("a@x.com").unwrap(),
            permissions: permissions.iter().copied().collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_has_permission_intersection() {
        let user = user_with(&[Permission::User, Permission::ItemDelete]);
        assert!(has_permission(&user, &[Permission::ItemDelete]).is_ok());
        assert!(has_permission(&user, &[Permission::Admin, Permission::ItemDelete]).is_ok());
        assert!(matches!(
            has_permission(&user, &[Permission::Admin]),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_owner_passes_without_permission() {
        let user = user_with(&[Permission::User]);
        assert!(ensure_owner_or(&user, UserId::new(1), &[Permission::Admin]).is_ok());
    }

    #[test]
    fn test_non_owner_needs_override() {
        let user = user_with(&[Permission::User]);
        assert!(matches!(
            ensure_owner_or(&user, UserId::new(2), &[Permission::Admin]),
            Err(AppError::Forbidden(_))
        ));

        let admin = user_with(&[Permission::Admin]);
        assert!(ensure_owner_or(&admin, UserId::new(2), &[Permission::Admin]).is_ok());
    }
}
