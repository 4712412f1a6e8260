/// Role-Based Access Control
///
/// One generic guard consulting a data-driven policy table mapping each
/// operation to its accepted roles. The role model is flat: an admin is not
/// implicitly granted instructor- or student-gated operations; every
/// operation enumerates the roles it accepts.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::auth::claims::Claims;
use crate::error::{AppError, AuthError, ValidationError};

/// User role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Instructor,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Instructor => "instructor",
            Role::Student => "student",
        }
    }

    /// Parse a stored or submitted role string
    ///
    /// # Errors
    /// Returns a field-level validation error for unknown roles
    pub fn parse(s: &str) -> Result<Role, ValidationError> {
        match s {
            "admin" => Ok(Role::Admin),
            "instructor" => Ok(Role::Instructor),
            "student" => Ok(Role::Student),
            _ => Err(ValidationError::InvalidFormat("role".to_string())),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Role-gated operations exposed by the HTTP surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    CreateCategory,
    ListCategories,
    CreateCourse,
    ListCourses,
    CreateEnrollment,
    ViewDashboard,
    ViewProfile,
    UpdateProfile,
}

/// Operation -> accepted roles. An empty slice means any authenticated
/// identity is accepted.
const ACCESS_POLICY: &[(Operation, &[Role])] = &[
    (Operation::CreateCategory, &[Role::Admin]),
    (Operation::ListCategories, &[]),
    (Operation::CreateCourse, &[Role::Instructor]),
    (Operation::ListCourses, &[]),
    (Operation::CreateEnrollment, &[Role::Student]),
    (Operation::ViewDashboard, &[]),
    (Operation::ViewProfile, &[]),
    (Operation::UpdateProfile, &[]),
];

/// Roles accepted for an operation
pub fn required_roles(operation: Operation) -> &'static [Role] {
    ACCESS_POLICY
        .iter()
        .find(|(op, _)| *op == operation)
        .map(|(_, roles)| *roles)
        .unwrap_or(&[])
}

/// Evaluate an authenticated identity against an operation's policy
///
/// Token signature/expiry verification is a precondition performed by the
/// JWT middleware; this is a pure predicate over already-validated claims.
///
/// # Errors
/// - `MissingToken` when no identity is present
/// - `PermissionDenied` when the identity's role is not accepted
pub fn authorize(identity: Option<&Claims>, operation: Operation) -> Result<(), AppError> {
    let claims = identity.ok_or(AppError::Auth(AuthError::MissingToken))?;

    let required = required_roles(operation);
    if required.is_empty() {
        return Ok(());
    }

    let role = claims.role()?;
    if required.contains(&role) {
        Ok(())
    } else {
        Err(AppError::Auth(AuthError::PermissionDenied))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::TOKEN_USE_ACCESS;
    use uuid::Uuid;

    fn claims_for(role: Role) -> Claims {
        Claims::new(Uuid::new_v4(), role, TOKEN_USE_ACCESS, 3600, "test".to_string())
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            assert_eq!(Role::parse(role.as_str()).unwrap(), role);
        }
        assert!(Role::parse("superuser").is_err());
        assert!(Role::parse("").is_err());
    }

    #[test]
    fn test_unauthenticated_is_always_denied() {
        for (operation, _) in ACCESS_POLICY {
            assert!(authorize(None, *operation).is_err());
        }
    }

    #[test]
    fn test_matching_role_is_allowed() {
        let claims = claims_for(Role::Admin);
        assert!(authorize(Some(&claims), Operation::CreateCategory).is_ok());

        let claims = claims_for(Role::Instructor);
        assert!(authorize(Some(&claims), Operation::CreateCourse).is_ok());

        let claims = claims_for(Role::Student);
        assert!(authorize(Some(&claims), Operation::CreateEnrollment).is_ok());
    }

    #[test]
    fn test_mismatched_role_is_denied() {
        let claims = claims_for(Role::Instructor);
        assert!(authorize(Some(&claims), Operation::CreateEnrollment).is_err());

        let claims = claims_for(Role::Student);
        assert!(authorize(Some(&claims), Operation::CreateCourse).is_err());
    }

    #[test]
    fn test_admin_has_no_implicit_grants() {
        // Flat model: admin is denied instructor- and student-gated
        // operations because admin is not in their accepted sets
        let claims = claims_for(Role::Admin);
        assert!(authorize(Some(&claims), Operation::CreateCourse).is_err());
        assert!(authorize(Some(&claims), Operation::CreateEnrollment).is_err());
    }

    #[test]
    fn test_empty_required_set_accepts_any_authenticated_role() {
        for role in [Role::Admin, Role::Instructor, Role::Student] {
            let claims = claims_for(role);
            assert!(authorize(Some(&claims), Operation::ListCourses).is_ok());
            assert!(authorize(Some(&claims), Operation::ViewDashboard).is_ok());
        }
    }

    #[test]
    fn test_unknown_claim_role_is_rejected() {
        let mut claims = claims_for(Role::Student);
        claims.role = "superuser".to_string();
        assert!(authorize(Some(&claims), Operation::CreateEnrollment).is_err());
    }
}
