use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;

use crate::{
    common::{ApiError, ApiResult},
    entity::user::{self, Role},
};

/// Who is making the request, recovered from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i32,
    pub role: Role,
    pub email: String,
    pub name: String,
}

/// Outcome of reading the bearer credential, stored in request extensions by the auth layer.
#[derive(Debug, Clone)]
pub enum Authentication {
    Anonymous,
    Authenticated(Identity),
    Rejected(String),
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_vendor(&self) -> bool {
        self.role == Role::Vendor
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user = self.id, role = self.role.as_str(), "admin route refused");
            Err(ApiError::forbidden())
        }
    }

    pub fn require_vendor_or_admin(&self) -> ApiResult<()> {
        if self.is_admin() || self.is_vendor() {
            Ok(())
        } else {
            tracing::warn!(user = self.id, role = self.role.as_str(), "vendor route refused");
            Err(ApiError::forbidden())
        }
    }

    /// Owners act on their own records; administrators act on anyone's.
    pub fn require_owner_or_admin(&self, owner_id: i32) -> ApiResult<()> {
        if self.is_admin() || self.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

impl From<&user::Model> for Identity {
    fn from(user: &user::Model) -> Self {
        Identity {
            id: user.id,
            role: user.role,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

fn authentication(parts: &Parts) -> Authentication {
    parts
        .extensions
        .get::<Authentication>()
        .cloned()
        .unwrap_or(Authentication::Anonymous)
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match authentication(parts) {
            Authentication::Authenticated(identity) => Ok(identity),
            Authentication::Anonymous => Err(ApiError::UnAuthorized(
                "No token, authorization denied".to_string(),
            )),
            Authentication::Rejected(reason) => Err(ApiError::UnAuthorized(reason)),
        }
    }
}

impl<S> OptionalFromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        match authentication(parts) {
            Authentication::Authenticated(identity) => Ok(Some(identity)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_role(role: Role) -> Identity {
        Identity {
            id: 7,
            role,
            email: "x@example.com".to_string(),
            name: "x".to_string(),
        }
    }

    #[test]
    fn role_gates() {
        assert!(with_role(Role::Admin).require_admin().is_ok());
        assert!(with_role(Role::Vendor).require_admin().is_err());
        assert!(with_role(Role::Vendor).require_vendor_or_admin().is_ok());
        assert!(with_role(Role::Admin).require_vendor_or_admin().is_ok());
        assert!(with_role(Role::Customer).require_vendor_or_admin().is_err());
    }

    #[test]
    fn ownership_gate() {
        assert!(with_role(Role::Customer).require_owner_or_admin(7).is_ok());
        assert!(with_role(Role::Customer).require_owner_or_admin(8).is_err());
        assert!(with_role(Role::Admin).require_owner_or_admin(8).is_ok());
    }

    #[test]
    fn role_parsing_is_lenient_on_case_only() {
        assert_eq!(Role::parse("Vendor"), Some(Role::Vendor));
        assert_eq!(Role::parse(" admin "), Some(Role::Admin));
        assert_eq!(Role::parse("superuser"), None);
    }
}
