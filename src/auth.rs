use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::Role;

/// The authenticated caller, as resolved by the external identity source.
/// Operations take this explicitly; there is no ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: i32,
    pub role: Role,
}

/// Single authorization chokepoint for every write path.
///
/// Checks run in order: the principal must be present, must carry
/// `required_role` if one is given, and must match `owner_id` if one is
/// given. Admins get no ownership bypass. No side effects.
pub fn authorize<'p>(
    principal: Option<&'p Principal>,
    required_role: Option<Role>,
    owner_id: Option<i32>,
) -> Result<&'p Principal> {
    let principal = principal.ok_or(Error::Unauthorized("authentication required"))?;

    if let Some(role) = required_role {
        if principal.role != role {
            return Err(Error::Unauthorized("caller role does not permit this operation"));
        }
    }

    if let Some(owner) = owner_id {
        if principal.id != owner {
            return Err(Error::Unauthorized("caller does not own the target entity"));
        }
    }

    Ok(principal)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT: Principal = Principal { id: 1, role: Role::Client };
    const FREELANCER: Principal = Principal { id: 2, role: Role::Freelancer };
    const ADMIN: Principal = Principal { id: 3, role: Role::Admin };

    #[test]
    fn missing_principal_is_unauthorized() {
        assert!(matches!(
            authorize(None, None, None),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn role_mismatch_is_unauthorized() {
        assert!(matches!(
            authorize(Some(&FREELANCER), Some(Role::Client), None),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn ownership_mismatch_is_unauthorized() {
        assert!(matches!(
            authorize(Some(&CLIENT), Some(Role::Client), Some(99)),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn admin_gets_no_ownership_bypass() {
        assert!(matches!(
            authorize(Some(&ADMIN), None, Some(1)),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn passing_all_checks_returns_the_principal() {
        let granted = authorize(Some(&CLIENT), Some(Role::Client), Some(1)).unwrap();
        assert_eq!(granted.id, 1);

        // Presence-only check.
        assert!(authorize(Some(&FREELANCER), None, None).is_ok());
    }
}
