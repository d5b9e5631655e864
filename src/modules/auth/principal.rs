use serde::{Deserialize, Serialize};

use crate::modules::auth::errors::ServiceError;
use crate::AccountId;

/// Account role. Serialized as `"user"` / `"admin"` everywhere it crosses a
/// boundary (store snapshot, views, requests).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Parse a wire-format role string. Unrecognized values yield None so
    /// callers decide whether to ignore or fall back.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// The identity on whose behalf an operation runs. Always passed explicitly
/// into the service; never read from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub account_id: AccountId,
    pub role: Role,
}

impl Principal {
    pub fn new(account_id: AccountId, role: Role) -> Self {
        Self { account_id, role }
    }
}

/// Gate for administrative operations. Fails with Forbidden before any
/// account data is touched, so a denied caller learns nothing about what
/// exists.
pub fn require_admin(principal: &Principal) -> Result<(), ServiceError> {
    if principal.role.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden)
    }
}
