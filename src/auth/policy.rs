//! Authorization policy.
//!
//! Every role decision in the crate goes through this module, so UI gating
//! and endpoint enforcement cannot drift apart. Handlers call these
//! functions; nothing else inspects `AuthUser::role` directly.

use crate::{auth::AuthUser, errors::ServiceError};
use uuid::Uuid;

/// Admin-only operations: catalog and gym mutations.
pub fn require_admin(user: &AuthUser) -> Result<(), ServiceError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "administrator role required".to_string(),
        ))
    }
}

/// Per-user data access: a caller may only act on their own resources,
/// unless they are an admin.
pub fn require_self_or_admin(user: &AuthUser, owner_id: Uuid) -> Result<(), ServiceError> {
    if user.id == owner_id || user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "cannot access another user's data".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;

    fn user_with_role(role: UserRole) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: None,
            name: None,
            avatar_url: None,
            role,
        }
    }

    #[test]
    fn standard_user_is_not_admin() {
        let user = user_with_role(UserRole::Standard);
        assert!(require_admin(&user).is_err());
    }

    #[test]
    fn admin_passes_admin_check() {
        let user = user_with_role(UserRole::Admin);
        assert!(require_admin(&user).is_ok());
    }

    #[test]
    fn self_access_allowed_others_denied() {
        let user = user_with_role(UserRole::Standard);
        assert!(require_self_or_admin(&user, user.id).is_ok());
        assert!(require_self_or_admin(&user, Uuid::new_v4()).is_err());
    }

    #[test]
    fn admin_may_access_other_users() {
        let admin = user_with_role(UserRole::Admin);
        assert!(require_self_or_admin(&admin, Uuid::new_v4()).is_ok());
    }
}
